//! Verdict classification and recommended actions

use crate::types::{Domain, TrustScore, Verdict};

/// Lowest trust classified as SAFE
pub const SAFE_THRESHOLD: u8 = 75;

/// Lowest trust classified as SUSPICIOUS
pub const SUSPICIOUS_THRESHOLD: u8 = 50;

impl From<TrustScore> for Verdict {
    fn from(trust: TrustScore) -> Self {
        if trust.score() >= SAFE_THRESHOLD {
            Verdict::Safe
        } else if trust.score() >= SUSPICIOUS_THRESHOLD {
            Verdict::Suspicious
        } else {
            Verdict::Fraud
        }
    }
}

/// Fixed next-step advice per domain and verdict
pub fn recommended_action(domain: Domain, verdict: Verdict) -> &'static str {
    match (domain, verdict) {
        (Domain::Message, Verdict::Fraud) => {
            "Do NOT pay • Call the person via saved contact • Report/Block"
        }
        (Domain::Message, Verdict::Suspicious) => {
            "Verify UPI name in your UPI app • Call back • Ask for invoice/GST"
        }
        (Domain::Message, Verdict::Safe) => "Proceed if UPI name matches • Keep proof",

        (Domain::TransactionGroup, Verdict::Fraud) => {
            "HOLD & VERIFY KYC • Block payee • Call customer"
        }
        (Domain::TransactionGroup, Verdict::Suspicious) => {
            "Manual review • OTP confirm • Call-back verification"
        }
        (Domain::TransactionGroup, Verdict::Safe) => "Allow • Monitor",

        (Domain::Image, Verdict::Fraud) => {
            "Do NOT pay • Verify with the issuer via a known channel • Report"
        }
        (Domain::Image, Verdict::Suspicious) => {
            "Check payee name and amount in your UPI app • Ask for the original document"
        }
        (Domain::Image, Verdict::Safe) => "Proceed if details match • Keep proof",
    }
}
