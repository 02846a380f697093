//! Analysis service
//!
//! Wraps the trust engine with intake concerns: record parsing, image
//! collaborators, fallback assessments, audit persistence and metrics.
//! Persistence and QR decoding failures are logged and reported on the
//! outcome but never change or withhold an assessment.

use crate::collaborators::{AssessmentEntry, AssessmentSink, FeatureExtractor, ImageUpload, QrDecoder};
use crate::config::IntakeConfig;
use crate::error::{IntakeError, Result};
use crate::metrics;
use crate::records::parse_records;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use trust_engine::{
    Domain, GroupAssessment, RiskAssessment, TransactionRecord, TrustEngine, VerdictSummary,
};

/// Audit feature name for messages
pub const MESSAGE_FEATURE: &str = "message";

/// Audit feature name for payee groups
pub const TRANSACTIONS_FEATURE: &str = "transactions";

/// Payment-request message to analyze
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageRequest {
    /// Message body
    pub text: String,
    /// Payee handle, may be empty
    pub payee: String,
    /// Requested amount, if one was given
    pub amount: Option<Decimal>,
    /// Reported relationship to the payee
    pub relationship: String,
    /// Requests from this payee in the recent window
    pub recent_requests: u32,
}

/// A result together with how it was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzed<T> {
    /// Scoring result
    pub result: T,
    /// Summary stored with the audit record
    pub input_value: String,
    /// Why the audit sink rejected the record, if it did
    pub audit_error: Option<String>,
    /// Why the QR decoder failed, if it was consulted and did
    pub qr_error: Option<String>,
}

/// `msg: <first chars>... | upi: <payee> | amt: <amount>`
pub fn message_summary(request: &MessageRequest, max_chars: usize) -> String {
    let head: String = request.text.chars().take(max_chars).collect();
    let amount = request
        .amount
        .map(|a| a.normalize().to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("msg: {}... | upi: {} | amt: {}", head, request.payee, amount)
}

/// `<payee> (<count> txns, ₹<total>)`
pub fn group_summary(group: &GroupAssessment) -> String {
    format!(
        "{} ({} txns, ₹{})",
        group.payee,
        group.count,
        group.total.normalize()
    )
}

/// `<file name>` plus ` | QR: <text>` when a QR payload was used
pub fn image_summary(file_name: &str, qr_text: Option<&str>) -> String {
    match qr_text {
        Some(qr) if !qr.is_empty() => format!("{} | QR: {}", file_name, qr),
        _ => file_name.to_string(),
    }
}

/// Verdict counts over analyzed results
pub fn summarize<'a, I>(assessments: I) -> VerdictSummary
where
    I: IntoIterator<Item = &'a RiskAssessment>,
{
    assessments.into_iter().collect()
}

/// Scores inputs and records every assessment
pub struct AnalysisService {
    engine: TrustEngine,
    sink: Arc<dyn AssessmentSink>,
    extractor: Option<Arc<dyn FeatureExtractor>>,
    qr_decoder: Option<Arc<dyn QrDecoder>>,
    permits: Arc<Semaphore>,
    summary_chars: usize,
}

impl AnalysisService {
    /// Create a service without an image pipeline
    pub fn new(config: &IntakeConfig, sink: Arc<dyn AssessmentSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: TrustEngine::new(config.engine.clone())?,
            sink,
            extractor: None,
            qr_decoder: None,
            permits: Arc::new(Semaphore::new(config.max_concurrent_images)),
            summary_chars: config.summary_message_chars,
        })
    }

    /// Attach the image feature and QR collaborators
    pub fn with_image_pipeline(
        mut self,
        extractor: Arc<dyn FeatureExtractor>,
        qr_decoder: Arc<dyn QrDecoder>,
    ) -> Self {
        self.extractor = Some(extractor);
        self.qr_decoder = Some(qr_decoder);
        self
    }

    /// Underlying scoring engine
    pub fn engine(&self) -> &TrustEngine {
        &self.engine
    }

    /// Score and record a payment-request message
    pub async fn analyze_message(&self, request: &MessageRequest) -> Analyzed<RiskAssessment> {
        let assessment = self.engine.score_message(
            &request.text,
            &request.payee,
            request.amount,
            &request.relationship,
            request.recent_requests,
        );
        let input_value = message_summary(request, self.summary_chars);

        self.persist(Domain::Message, MESSAGE_FEATURE, input_value, assessment.clone(), assessment)
            .await
    }

    /// Parse raw CSV or pasted text, then score every payee group
    pub async fn analyze_transactions(&self, raw: &str) -> Vec<Analyzed<GroupAssessment>> {
        let records = parse_records(raw);
        self.analyze_records(&records).await
    }

    /// Score and record every payee group in `records`
    pub async fn analyze_records(&self, records: &[TransactionRecord]) -> Vec<Analyzed<GroupAssessment>> {
        let groups = self.engine.score_transaction_group(records);
        info!(records = records.len(), groups = groups.len(), "scoring payee groups");

        let mut results = Vec::with_capacity(groups.len());
        for group in groups {
            let input_value = group_summary(&group);
            let assessment = group.assessment.clone();
            results.push(
                self.persist(Domain::TransactionGroup, TRANSACTIONS_FEATURE, input_value, assessment, group)
                    .await,
            );
        }
        results
    }

    /// Score and record one image upload
    pub async fn analyze_image(&self, request: ImageUpload) -> Result<Analyzed<RiskAssessment>> {
        let (extractor, qr_decoder) = self.image_pipeline()?;
        Ok(self
            .score_upload(extractor.as_ref(), qr_decoder.as_ref(), request)
            .await)
    }

    /// Score a batch of uploads concurrently; output order matches input order
    pub async fn analyze_images(
        self: &Arc<Self>,
        requests: Vec<ImageUpload>,
    ) -> Result<Vec<Analyzed<RiskAssessment>>> {
        let (extractor, qr_decoder) = self.image_pipeline()?;
        info!(files = requests.len(), "scoring image batch");

        let mut handles = Vec::with_capacity(requests.len());
        for request in requests {
            let file_name = request.upload.file_name.clone();
            let section = request.section;
            let service = Arc::clone(self);
            let extractor = Arc::clone(&extractor);
            let qr_decoder = Arc::clone(&qr_decoder);
            let permits = Arc::clone(&self.permits);

            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                service
                    .score_upload(extractor.as_ref(), qr_decoder.as_ref(), request)
                    .await
            });
            handles.push((file_name, section, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (file_name, section, handle) in handles {
            match handle.await {
                Ok(analyzed) => results.push(analyzed),
                Err(e) => {
                    warn!(file = %file_name, error = %e, "image analysis task failed");
                    metrics::record_image_fallback("unreadable");
                    let assessment = self.engine.unreadable_image(&file_name, "analysis task failed");
                    let input_value = image_summary(&file_name, None);
                    results.push(
                        self.persist(Domain::Image, section.as_str(), input_value, assessment.clone(), assessment)
                            .await,
                    );
                }
            }
        }

        Ok(results)
    }

    fn image_pipeline(&self) -> Result<(Arc<dyn FeatureExtractor>, Arc<dyn QrDecoder>)> {
        match (&self.extractor, &self.qr_decoder) {
            (Some(extractor), Some(qr_decoder)) => Ok((Arc::clone(extractor), Arc::clone(qr_decoder))),
            _ => Err(IntakeError::NotConfigured(
                "no feature extractor or QR decoder attached".to_string(),
            )),
        }
    }

    async fn score_upload(
        &self,
        extractor: &dyn FeatureExtractor,
        qr_decoder: &dyn QrDecoder,
        request: ImageUpload,
    ) -> Analyzed<RiskAssessment> {
        let ImageUpload {
            upload,
            section,
            qr_text,
        } = request;
        let mut qr_used = qr_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let mut qr_error = None;

        let assessment = if !upload.format().is_supported() {
            metrics::record_image_fallback("unsupported");
            self.engine.unsupported_image(&upload.file_name)
        } else if upload.bytes.is_empty() {
            metrics::record_image_fallback("unreadable");
            self.engine.unreadable_image(&upload.file_name, "empty file")
        } else {
            match extractor.extract(&upload).await {
                Ok(features) => {
                    if qr_used.is_none() {
                        qr_used = match qr_decoder.decode(&upload).await {
                            Ok(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
                            Err(e) => {
                                let e = match e {
                                    IntakeError::QrDecode(_) => e,
                                    other => IntakeError::QrDecode(other.to_string()),
                                };
                                warn!(file = %upload.file_name, error = %e, "QR decoding failed");
                                metrics::record_qr_decode_failure();
                                qr_error = Some(e.to_string());
                                None
                            }
                        };
                    }
                    self.engine.score_image(features, section, qr_used.clone())
                }
                Err(e) => {
                    warn!(file = %upload.file_name, error = %e, "feature extraction failed");
                    metrics::record_image_fallback("unreadable");
                    self.engine.unreadable_image(&upload.file_name, &e.to_string())
                }
            }
        };

        let input_value = image_summary(&upload.file_name, qr_used.as_deref());
        let mut analyzed = self
            .persist(Domain::Image, section.as_str(), input_value, assessment.clone(), assessment)
            .await;
        analyzed.qr_error = qr_error;
        analyzed
    }

    async fn persist<T>(
        &self,
        domain: Domain,
        feature: &str,
        input_value: String,
        assessment: RiskAssessment,
        result: T,
    ) -> Analyzed<T> {
        metrics::record_assessment(domain, assessment.verdict);

        let entry = AssessmentEntry {
            feature: feature.to_string(),
            input_value,
            assessment,
        };

        let audit_error = match self.sink.record(&entry).await {
            Ok(()) => None,
            Err(e) => {
                warn!(feature, error = %e, "failed to persist assessment");
                metrics::record_sink_failure();
                Some(e.to_string())
            }
        };

        Analyzed {
            result,
            input_value: entry.input_value,
            audit_error,
            qr_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_summary_truncates_by_chars() {
        let request = MessageRequest {
            text: "₹".repeat(130),
            payee: "x@upi".to_string(),
            amount: Some(Decimal::new(50000, 2)),
            ..Default::default()
        };
        let summary = message_summary(&request, 120);

        assert!(summary.starts_with(&format!("msg: {}...", "₹".repeat(120))));
        assert!(summary.ends_with(" | upi: x@upi | amt: 500"));
    }

    #[test]
    fn test_image_summary() {
        assert_eq!(image_summary("a.png", None), "a.png");
        assert_eq!(image_summary("a.png", Some("")), "a.png");
        assert_eq!(image_summary("a.png", Some("upi://pay")), "a.png | QR: upi://pay");
    }
}
