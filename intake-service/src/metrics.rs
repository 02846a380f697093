//! Prometheus metrics for the intake service

use crate::error::{IntakeError, Result};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use trust_engine::{Domain, Verdict};

lazy_static! {
    /// Assessments by domain and verdict
    pub static ref ASSESSMENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("trust_assessments_total", "Total assessments produced"),
        &["domain", "verdict"]
    ).expect("metric can be created");

    /// Audit sink write failures
    pub static ref SINK_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "trust_sink_failures_total",
        "Assessments the audit sink failed to persist"
    ).expect("metric can be created");

    /// Images given a fallback assessment, by kind
    pub static ref IMAGE_FALLBACKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("trust_image_fallbacks_total", "Images scored by a fallback assessment"),
        &["kind"]
    ).expect("metric can be created");

    /// QR decoder failures
    pub static ref QR_DECODE_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "trust_qr_decode_failures_total",
        "Uploads whose QR payload could not be decoded"
    ).expect("metric can be created");

    static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_metrics(&registry).expect("metrics register into a fresh registry");
        registry
    };
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(ASSESSMENTS_TOTAL.clone()))?;
    registry.register(Box::new(SINK_FAILURES_TOTAL.clone()))?;
    registry.register(Box::new(IMAGE_FALLBACKS_TOTAL.clone()))?;
    registry.register(Box::new(QR_DECODE_FAILURES_TOTAL.clone()))?;
    Ok(())
}

/// Count one assessment
pub fn record_assessment(domain: Domain, verdict: Verdict) {
    ASSESSMENTS_TOTAL
        .with_label_values(&[domain.as_str(), verdict.as_str()])
        .inc();
}

/// Count one audit sink failure
pub fn record_sink_failure() {
    SINK_FAILURES_TOTAL.inc();
}

/// Count one QR decoder failure
pub fn record_qr_decode_failure() {
    QR_DECODE_FAILURES_TOTAL.inc();
}

/// `kind` is `unreadable` or `unsupported`
pub fn record_image_fallback(kind: &str) {
    IMAGE_FALLBACKS_TOTAL.with_label_values(&[kind]).inc();
}

/// Render every metric in Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| IntakeError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| IntakeError::Metrics(e.to_string()))
}
