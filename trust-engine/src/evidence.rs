//! Evidence submitted for scoring
//!
//! Every evidence type knows its canonical pipe-delimited encoding, which is
//! what the variety injector hashes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment-request message with its context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvidence {
    /// Message text as received
    pub text: String,

    /// Payee handle (UPI id), may be empty
    pub payee: String,

    /// Requested amount; `None` when missing or unparsable
    pub amount: Option<Decimal>,

    /// Relationship tag (family, close friend, vendor, unknown, ...)
    pub relationship: String,

    /// Number of times the requester asked recently
    pub recent_requests: u32,
}

impl MessageEvidence {
    /// `text|payee|amount|relationship|recent_requests`
    pub fn canonical_bytes(&self) -> Vec<u8> {
        format!(
            "{}|{}|{}|{}|{}",
            self.text,
            self.payee,
            canonical_amount(self.amount),
            self.relationship,
            self.recent_requests
        )
        .into_bytes()
    }
}

/// One parsed payment row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Date column, kept verbatim
    pub date: String,
    /// Payee handle as written
    pub payee: String,
    /// Amount paid
    pub amount: Decimal,
}

impl TransactionRecord {
    /// Create a record
    pub fn new(date: impl Into<String>, payee: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date: date.into(),
            payee: payee.into(),
            amount,
        }
    }
}

/// A dated amount inside a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Date column, kept verbatim
    pub date: String,
    /// Amount paid
    pub amount: Decimal,
}

/// Payments to one payee, keyed by the lower-cased handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    /// Lower-cased payee handle
    pub key: String,
    /// First spelling of the payee seen in the input
    pub payee: String,
    /// Entries in input order
    pub entries: Vec<GroupEntry>,
}

impl TransactionGroup {
    /// Number of payments
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all amounts
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Mean amount (zero for an empty group)
    pub fn average(&self) -> Decimal {
        let count = self.count().max(1);
        self.total() / Decimal::from(count as u64)
    }

    /// `key|total|count`
    pub fn canonical_bytes(&self) -> Vec<u8> {
        format!(
            "{}|{}|{}",
            self.key,
            self.total().normalize(),
            self.count()
        )
        .into_bytes()
    }
}

/// Group records by lower-cased payee in one pass, keeping first-seen order.
///
/// Records with a blank payee are skipped.
pub fn group_by_payee(records: &[TransactionRecord]) -> Vec<TransactionGroup> {
    let mut index = std::collections::HashMap::new();
    let mut groups: Vec<TransactionGroup> = Vec::new();

    for record in records {
        let key = record.payee.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(TransactionGroup {
                key,
                payee: record.payee.trim().to_string(),
                entries: Vec::new(),
            });
            groups.len() - 1
        });

        groups[slot].entries.push(GroupEntry {
            date: record.date.clone(),
            amount: record.amount,
        });
    }

    groups
}

/// Image container format reported by the feature service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG / JPG
    Jpeg,
    /// PNG
    Png,
    /// Anything else
    Other,
}

impl ImageFormat {
    /// Map a file extension (case-insensitive, without dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            _ => ImageFormat::Other,
        }
    }

    /// Lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Other => "other",
        }
    }

    /// Formats the analyzer accepts
    pub fn is_supported(&self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Png)
    }
}

/// Forensic features computed by the image feature service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatures {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// File size in bytes
    pub file_size: u64,

    /// Re-encode-and-diff anomaly metric, 0..100
    pub anomaly_score: f64,

    /// Container format
    pub format: ImageFormat,

    /// Editing software recorded in metadata, if any
    pub editor_software: Option<String>,

    /// Digest of the raw file bytes, if the service computed one
    pub fingerprint: Option<String>,
}

impl ImageFeatures {
    /// File size in KB, rounded
    pub fn size_kb(&self) -> u64 {
        (self.file_size + 512) / 1024
    }

    /// Total pixel count
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Width over height, `None` for a degenerate image
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(f64::from(self.width) / f64::from(self.height))
        }
    }
}

/// Upload section an image was submitted through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadSection {
    /// Payment receipt or screenshot
    Screenshot,
    /// Invoice photo
    Invoice,
    /// QR code image
    Qr,
}

impl UploadSection {
    /// Label also used as the audit feature name
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadSection::Screenshot => "screenshot",
            UploadSection::Invoice => "invoice",
            UploadSection::Qr => "qr",
        }
    }
}

/// Image evidence: features plus optional decoded QR text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEvidence {
    /// Forensic features
    pub features: ImageFeatures,
    /// Section the file came through
    pub section: UploadSection,
    /// Decoded QR payload, if any
    pub qr_text: Option<String>,
}

impl ImageEvidence {
    /// Decoded QR text, empty when absent
    pub fn qr_text(&self) -> &str {
        self.qr_text.as_deref().unwrap_or("")
    }

    /// `fingerprint|width|height|file_size|anomaly|format|editor|section|qr_text`
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let f = &self.features;
        format!(
            "{}|{}|{}|{}|{:.3}|{}|{}|{}|{}",
            f.fingerprint.as_deref().unwrap_or(""),
            f.width,
            f.height,
            f.file_size,
            f.anomaly_score,
            f.format.as_str(),
            f.editor_software.as_deref().unwrap_or(""),
            self.section.as_str(),
            self.qr_text()
        )
        .into_bytes()
    }
}

fn canonical_amount(amount: Option<Decimal>) -> String {
    amount.map(|a| a.normalize().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payee: &str, amount: i64) -> TransactionRecord {
        TransactionRecord::new("2025-08-25 12:00", payee, Decimal::from(amount))
    }

    #[test]
    fn test_grouping_is_case_insensitive_and_ordered() {
        let records = vec![
            record("X@upi", 50),
            record("y@upi", 800),
            record("x@UPI", 50),
            record("  ", 10),
        ];

        let groups = group_by_payee(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "x@upi");
        assert_eq!(groups[0].payee, "X@upi");
        assert_eq!(groups[0].count(), 2);
        assert_eq!(groups[0].total(), Decimal::from(100));
        assert_eq!(groups[1].key, "y@upi");
    }

    #[test]
    fn test_canonical_amount_is_normalized() {
        let a = MessageEvidence {
            amount: Some(Decimal::new(99900, 2)),
            ..Default::default()
        };
        let b = MessageEvidence {
            amount: Some(Decimal::from(999)),
            ..Default::default()
        };
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
        assert_eq!(b.canonical_bytes(), b"||999||0".to_vec());
    }

    #[test]
    fn test_image_geometry() {
        let features = ImageFeatures {
            width: 1080,
            height: 2400,
            file_size: 100 * 1024,
            anomaly_score: 3.0,
            format: ImageFormat::Png,
            editor_software: None,
            fingerprint: None,
        };
        assert_eq!(features.size_kb(), 100);
        assert_eq!(features.pixels(), 2_592_000);
        assert_eq!(features.aspect_ratio(), Some(0.45));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("png"), ImageFormat::Png);
        assert!(!ImageFormat::from_extension("gif").is_supported());
    }
}
