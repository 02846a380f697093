//! Trust Engine
//!
//! Heuristic-to-verdict scoring for payment requests, per-payee payment
//! groups and uploaded screenshot, invoice or QR images.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accumulator;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod rules;
pub mod types;
pub mod variety;
pub mod verdict;

pub use config::EngineConfig;
pub use engine::{Evaluation, GroupAssessment, TrustEngine};
pub use error::{Error, Result};
pub use evidence::{
    group_by_payee, ImageEvidence, ImageFeatures, ImageFormat, MessageEvidence, TransactionGroup,
    TransactionRecord, UploadSection,
};
pub use extract::Evidence;
pub use types::*;
