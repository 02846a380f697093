//! External collaborators of the analysis service
//!
//! Image decoding, QR decoding and persistence live outside the scoring
//! engine; the service talks to them through these traits.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use trust_engine::{ImageFeatures, ImageFormat, RiskAssessment, UploadSection};

/// Uploaded file as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original file name
    pub file_name: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Upload with the given name and bytes
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Format implied by the file extension
    pub fn format(&self) -> ImageFormat {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(ImageFormat::from_extension)
            .unwrap_or(ImageFormat::Other)
    }
}

/// Image upload with the section it came through and any user-supplied QR text
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File as received
    pub upload: Upload,
    /// Screenshot, invoice or QR section
    pub section: UploadSection,
    /// QR text typed by the user; takes precedence over decoding
    pub qr_text: Option<String>,
}

/// Computes forensic features from image bytes
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    /// Features of a supported, non-empty upload
    async fn extract(&self, upload: &Upload) -> Result<ImageFeatures>;
}

/// Decodes a QR payload from image bytes; empty text means no QR found
#[async_trait]
pub trait QrDecoder: Send + Sync {
    /// QR payload text, empty when the image has none
    async fn decode(&self, upload: &Upload) -> Result<String>;
}

/// One assessment to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentEntry {
    /// message, transactions, screenshot, invoice or qr
    pub feature: String,
    /// Human-readable summary of the scored input
    pub input_value: String,
    /// Assessment as returned to the caller
    pub assessment: RiskAssessment,
}

/// Persists assessments
#[async_trait]
pub trait AssessmentSink: Send + Sync {
    /// Store one entry
    async fn record(&self, entry: &AssessmentEntry) -> Result<()>;
}
