//! Domain signal extractors
//!
//! Each evidence type extracts its own ordered signals and applies its own
//! override caps and floors to the variety target. The scoring pipeline in
//! [`crate::engine`] is shared.

pub mod image;
pub mod message;
pub mod transactions;

use crate::accumulator::RiskTally;
use crate::rules::SignalSet;
use crate::types::Domain;
use crate::variety::TargetTrust;
use lazy_static::lazy_static;
use regex::Regex;

/// Evidence the engine can score
pub trait Evidence {
    /// Pipeline this evidence belongs to
    const DOMAIN: Domain;

    /// Pipe-delimited encoding in the domain's fixed field order
    fn canonical_bytes(&self) -> Vec<u8>;

    /// Run every heuristic rule, in order
    fn extract(&self) -> SignalSet;

    /// Apply strong-signal caps and floors, in order.
    ///
    /// Overrides may append zero-point reasons to `signals`.
    fn apply_overrides(&self, tally: &RiskTally, target: &mut TargetTrust, signals: &mut SignalSet);
}

lazy_static! {
    /// Five or more consecutive digits
    pub(crate) static ref LONG_DIGITS: Regex =
        Regex::new(r"\d{5,}").expect("valid long-digit pattern");

    /// Whole-string payee handle shape: `local@provider`
    pub(crate) static ref HANDLE_FORMAT: Regex =
        Regex::new(r"^[a-z0-9._-]{2,}@[a-z]{2,}$").expect("valid handle pattern");
}

/// Any of `tokens` occurs in `haystack`
pub(crate) fn contains_any(haystack: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| haystack.contains(t))
}
