//! Core types for the trust engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trust score (0-100), higher means lower assessed risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustScore(u8);

impl TrustScore {
    /// Create new trust score (0-100)
    pub fn new(score: u8) -> Self {
        Self(score.min(100))
    }

    /// Clamp an arbitrary integer into 0-100
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    /// Get raw score
    pub fn score(&self) -> u8 {
        self.0
    }

    /// Check if the score classifies as safe (>= 75)
    pub fn is_safe(&self) -> bool {
        self.0 >= 75
    }

    /// Check if the score classifies as suspicious (50-74)
    pub fn is_suspicious(&self) -> bool {
        (50..75).contains(&self.0)
    }

    /// Check if the score classifies as fraud (< 50)
    pub fn is_fraud(&self) -> bool {
        self.0 < 50
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three-way verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Proceed
    Safe,
    /// Verify before paying
    Suspicious,
    /// Do not pay
    Fraud,
}

impl Verdict {
    /// Upper-case label used in audit records and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Safe => "SAFE",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::Fraud => "FRAUD",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring pipeline an assessment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Payment-request message
    Message,
    /// Payments aggregated per payee
    TransactionGroup,
    /// Uploaded screenshot, invoice or QR image
    Image,
}

impl Domain {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Message => "message",
            Domain::TransactionGroup => "transaction_group",
            Domain::Image => "image",
        }
    }
}

/// A single weighted, reasoned contribution to risk
///
/// Points are positive except for trusted-relationship relief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Risk points contributed
    pub points: i32,
    /// Human-readable reason
    pub reason: String,
}

impl Signal {
    /// Create a new signal
    pub fn new(points: i32, reason: impl Into<String>) -> Self {
        Self {
            points,
            reason: reason.into(),
        }
    }
}

/// Risk assessment result
///
/// Built only through [`RiskAssessment::new`], which derives the verdict and
/// action from the trust score so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Final trust score
    pub trust: TrustScore,

    /// Verdict derived from trust
    pub verdict: Verdict,

    /// Reasons in the order the rules fired
    pub reasons: Vec<String>,

    /// Recommended next action
    pub action: String,

    /// Hex digest of the canonical evidence encoding
    pub reference_hash: String,
}

impl RiskAssessment {
    /// Assemble an assessment for a domain
    pub fn new(
        domain: Domain,
        trust: TrustScore,
        reasons: Vec<String>,
        reference_hash: String,
    ) -> Self {
        let verdict = Verdict::from(trust);
        Self {
            trust,
            verdict,
            reasons,
            action: crate::verdict::recommended_action(domain, verdict).to_string(),
            reference_hash,
        }
    }

    /// Short reference shown to end users (first 8 hex chars)
    pub fn short_reference(&self) -> &str {
        let end = self.reference_hash.len().min(8);
        &self.reference_hash[..end]
    }
}

/// Per-verdict tally for a batch of assessments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictSummary {
    /// SAFE count
    pub safe: usize,
    /// SUSPICIOUS count
    pub suspicious: usize,
    /// FRAUD count
    pub fraud: usize,
}

impl VerdictSummary {
    /// Count one verdict
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Safe => self.safe += 1,
            Verdict::Suspicious => self.suspicious += 1,
            Verdict::Fraud => self.fraud += 1,
        }
    }

    /// Total number of verdicts counted
    pub fn total(&self) -> usize {
        self.safe + self.suspicious + self.fraud
    }
}

impl<'a> FromIterator<&'a RiskAssessment> for VerdictSummary {
    fn from_iter<I: IntoIterator<Item = &'a RiskAssessment>>(iter: I) -> Self {
        let mut summary = Self::default();
        for assessment in iter {
            summary.record(assessment.verdict);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_score_clamps() {
        assert_eq!(TrustScore::new(140).score(), 100);
        assert_eq!(TrustScore::clamped(-12).score(), 0);
        assert_eq!(TrustScore::clamped(250).score(), 100);
        assert_eq!(TrustScore::clamped(64).score(), 64);
    }

    #[test]
    fn test_short_reference() {
        let assessment = RiskAssessment::new(
            Domain::Message,
            TrustScore::new(80),
            vec![],
            "0123456789abcdef".to_string(),
        );
        assert_eq!(assessment.short_reference(), "01234567");
        assert_eq!(assessment.verdict, Verdict::Safe);
    }

    #[test]
    fn test_verdict_summary() {
        let assessments = [
            RiskAssessment::new(Domain::Image, TrustScore::new(90), vec![], String::new()),
            RiskAssessment::new(Domain::Image, TrustScore::new(60), vec![], String::new()),
            RiskAssessment::new(Domain::Image, TrustScore::new(10), vec![], String::new()),
            RiskAssessment::new(Domain::Image, TrustScore::new(20), vec![], String::new()),
        ];

        let summary: VerdictSummary = assessments.iter().collect();
        assert_eq!(summary.safe, 1);
        assert_eq!(summary.suspicious, 1);
        assert_eq!(summary.fraud, 2);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_verdict_serializes_upper_case() {
        let json = serde_json::to_string(&Verdict::Suspicious).unwrap();
        assert_eq!(json, "\"SUSPICIOUS\"");
    }
}
