//! Intake Service
//!
//! Puts the trust engine in front of real inputs: payment files, image
//! uploads with their feature and QR collaborators, a hash-chained audit
//! trail of every assessment and the operator CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod metrics;
pub mod records;
pub mod service;
pub mod telemetry;

pub use audit::{export_csv, tally, AuditRecord, AuditTrail, ResultOrder, ResultsQuery};
pub use collaborators::{
    AssessmentEntry, AssessmentSink, FeatureExtractor, ImageUpload, QrDecoder, Upload,
};
pub use config::IntakeConfig;
pub use error::{IntakeError, Result};
pub use records::{parse_records, read_records};
pub use service::{AnalysisService, Analyzed, MessageRequest};
