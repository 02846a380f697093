//! Trust scoring engine
//!
//! Every domain runs the same pipeline: extract signals, accumulate risk with
//! jitter, inject the hash-derived target, apply overrides, blend, classify.

use crate::accumulator::{accumulate, blend, RiskTally};
use crate::config::{DomainConfig, EngineConfig};
use crate::evidence::{
    group_by_payee, ImageEvidence, ImageFeatures, MessageEvidence, TransactionRecord,
    UploadSection,
};
use crate::extract::Evidence;
use crate::rules::SignalSet;
use crate::types::{Domain, RiskAssessment, TrustScore};
use crate::variety::{ReferenceHash, TargetTrust, VarietyBucket};
use crate::Result;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Trust assigned when an upload cannot be read
pub const UNREADABLE_TRUST: u8 = 10;

/// Trust assigned when an upload has an unsupported type
pub const UNSUPPORTED_TRUST: u8 = 15;

/// Assessment of one payee's aggregated payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAssessment {
    /// Payee as first written
    pub payee: String,
    /// Number of payments
    pub count: usize,
    /// Sum of amounts
    pub total: Decimal,
    /// Scored result
    pub assessment: RiskAssessment,
}

/// Every intermediate of one pipeline run
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Signals in firing order, override reasons included
    pub signals: SignalSet,
    /// Jittered, clamped risk
    pub tally: RiskTally,
    /// Variety bucket of the evidence
    pub bucket: VarietyBucket,
    /// Target trust after overrides
    pub target: TrustScore,
    /// Final result
    pub assessment: RiskAssessment,
}

/// Scores messages, payee groups and images
#[derive(Debug, Clone, Default)]
pub struct TrustEngine {
    config: EngineConfig,
}

impl TrustEngine {
    /// Create an engine from validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Hash-derived target trust before any override
    pub fn target_trust<E: Evidence>(&self, evidence: &E) -> TrustScore {
        let hash = ReferenceHash::of(&evidence.canonical_bytes());
        TargetTrust::inject(&hash, &self.config.bands).value()
    }

    /// Score any evidence, drawing jitter from `rng`
    pub fn assess<E: Evidence, R: Rng>(&self, evidence: &E, rng: &mut R) -> RiskAssessment {
        self.evaluate(evidence, rng).assessment
    }

    /// Run the full pipeline and keep every intermediate
    pub fn evaluate<E: Evidence, R: Rng>(&self, evidence: &E, rng: &mut R) -> Evaluation {
        let domain = self.domain_config(E::DOMAIN);

        let mut signals = evidence.extract();
        let jitter = rng.gen_range(domain.jitter.min..=domain.jitter.max);
        let tally = accumulate(signals.raw_risk(), jitter);

        let hash = ReferenceHash::of(&evidence.canonical_bytes());
        let mut target = TargetTrust::inject(&hash, &self.config.bands);
        evidence.apply_overrides(&tally, &mut target, &mut signals);

        let trust = blend(domain.alpha, tally.heuristic_trust, target.value());
        debug!(
            domain = E::DOMAIN.as_str(),
            risk = tally.risk,
            jitter,
            bucket = ?target.bucket(),
            target = target.value().score(),
            "pipeline intermediates"
        );

        let bucket = target.bucket();
        let target = target.value();
        let reasons = signals.signals().iter().map(|s| s.reason.clone()).collect();
        let assessment = RiskAssessment::new(E::DOMAIN, trust, reasons, hash.to_hex());

        info!(
            domain = E::DOMAIN.as_str(),
            trust = trust.score(),
            verdict = %assessment.verdict,
            reference = assessment.short_reference(),
            "assessment complete"
        );

        Evaluation {
            signals,
            tally,
            bucket,
            target,
            assessment,
        }
    }

    /// Score a payment-request message
    pub fn score_message(
        &self,
        text: &str,
        payee: &str,
        amount: Option<Decimal>,
        relationship: &str,
        recent_requests: u32,
    ) -> RiskAssessment {
        self.score_message_with_rng(
            text,
            payee,
            amount,
            relationship,
            recent_requests,
            &mut rand::thread_rng(),
        )
    }

    /// Score a message with caller-supplied jitter source
    pub fn score_message_with_rng<R: Rng>(
        &self,
        text: &str,
        payee: &str,
        amount: Option<Decimal>,
        relationship: &str,
        recent_requests: u32,
        rng: &mut R,
    ) -> RiskAssessment {
        let evidence = MessageEvidence {
            text: text.to_string(),
            payee: payee.to_string(),
            amount,
            relationship: relationship.to_string(),
            recent_requests,
        };
        self.assess(&evidence, rng)
    }

    /// Group payments by payee and score each group
    pub fn score_transaction_group(&self, records: &[TransactionRecord]) -> Vec<GroupAssessment> {
        self.score_transaction_group_with_rng(records, &mut rand::thread_rng())
    }

    /// Score payee groups with caller-supplied jitter source
    pub fn score_transaction_group_with_rng<R: Rng>(
        &self,
        records: &[TransactionRecord],
        rng: &mut R,
    ) -> Vec<GroupAssessment> {
        group_by_payee(records)
            .into_iter()
            .map(|group| {
                let assessment = self.assess(&group, rng);
                GroupAssessment {
                    count: group.count(),
                    total: group.total(),
                    payee: group.payee,
                    assessment,
                }
            })
            .collect()
    }

    /// Score an uploaded image from its forensic features
    pub fn score_image(
        &self,
        features: ImageFeatures,
        section: UploadSection,
        qr_text: Option<String>,
    ) -> RiskAssessment {
        self.score_image_with_rng(features, section, qr_text, &mut rand::thread_rng())
    }

    /// Score an image with caller-supplied jitter source
    pub fn score_image_with_rng<R: Rng>(
        &self,
        features: ImageFeatures,
        section: UploadSection,
        qr_text: Option<String>,
        rng: &mut R,
    ) -> RiskAssessment {
        let evidence = ImageEvidence {
            features,
            section,
            qr_text,
        };
        self.assess(&evidence, rng)
    }

    /// FRAUD-biased result for an upload that could not be read
    pub fn unreadable_image(&self, label: &str, detail: &str) -> RiskAssessment {
        self.fallback(
            label,
            UNREADABLE_TRUST,
            format!("File unreadable: {}", detail),
        )
    }

    /// Result for an upload whose type is not JPEG or PNG
    pub fn unsupported_image(&self, label: &str) -> RiskAssessment {
        self.fallback(
            label,
            UNSUPPORTED_TRUST,
            "Unsupported file type (use JPG/PNG)".to_string(),
        )
    }

    fn fallback(&self, label: &str, trust: u8, reason: String) -> RiskAssessment {
        let hash = ReferenceHash::of(format!("{}|{}", label, reason).as_bytes());
        info!(label, trust, reason = %reason, "image fallback assessment");
        RiskAssessment::new(Domain::Image, TrustScore::new(trust), vec![reason], hash.to_hex())
    }

    fn domain_config(&self, domain: Domain) -> &DomainConfig {
        match domain {
            Domain::Message => &self.config.message,
            Domain::TransactionGroup => &self.config.transactions,
            Domain::Image => &self.config.image,
        }
    }
}
