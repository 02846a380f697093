//! Error types for the intake service

use thiserror::Error;

/// Intake service error
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Image features could not be computed
    #[error("Feature extraction failed: {0}")]
    FeatureExtraction(String),

    /// QR decoder failed on the upload
    #[error("QR decoding failed: {0}")]
    QrDecode(String),

    /// Image collaborators missing
    #[error("Image pipeline not configured: {0}")]
    NotConfigured(String),

    /// Assessment could not be persisted
    #[error("Audit sink failed: {0}")]
    Sink(String),

    /// Audit hash chain is broken
    #[error("Audit trail integrity check failed: {0}")]
    Integrity(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics could not be gathered
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Engine rejected its configuration
    #[error("Engine error: {0}")]
    Engine(#[from] trust_engine::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result alias for the intake service
pub type Result<T> = std::result::Result<T, IntakeError>;
