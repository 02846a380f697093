//! Image tamper and QR payload signals

use super::{Evidence, LONG_DIGITS};
use crate::accumulator::RiskTally;
use crate::config::Band;
use crate::evidence::{ImageEvidence, ImageFormat, UploadSection};
use crate::rules::SignalSet;
use crate::types::Domain;
use crate::variety::TargetTrust;
use lazy_static::lazy_static;
use regex::Regex;

/// Anomaly above which the strong heuristic fires
pub const HIGH_ANOMALY: f64 = 28.0;
/// Anomaly above which the moderate heuristic fires
pub const MODERATE_ANOMALY: f64 = 18.0;
/// Anomaly at or above which the target is capped
pub const STRONG_ANOMALY: f64 = 40.0;
/// Anomaly at or below which an image counts as clean
pub const CLEAN_ANOMALY: f64 = 8.0;

const EDITOR_TOKENS: &[&str] = &[
    "photoshop",
    "gimp",
    "canva",
    "pixlr",
    "illustrator",
    "snapseed",
    "editor",
];

const MIN_ASPECT: f64 = 0.45;
const MAX_ASPECT: f64 = 2.4;

const CLEAN_MIN_HEURISTIC: u8 = 80;

lazy_static! {
    static ref HANDLE_IN_TEXT: Regex =
        Regex::new(r"\b[a-z0-9._-]{2,}@[a-z]{2,}\b").expect("valid embedded handle pattern");
    static ref URL: Regex = Regex::new(r"https?://[^\s]+").expect("valid url pattern");
    static ref RISKY_TOKEN: Regex = Regex::new(
        r"(lottery|winner|refund|urgent|help|bonus|gift|offer|crypto|claim|reward|airdrop|loan|scam|fraud)"
    )
    .expect("valid risky token pattern");
    static ref SHORTENER: Regex =
        Regex::new(r"(bit\.ly|tinyurl|t\.co|is\.gd|cutt\.ly)").expect("valid shortener pattern");
    static ref PHISHING_KEYWORD: Regex =
        Regex::new(r"(login|verify|reset|cancel|penalty|fine)").expect("valid phishing pattern");
}

/// QR payload hints, one per hint category
pub fn qr_risk_hints(qr_text: &str) -> Vec<&'static str> {
    let text = qr_text.to_lowercase();
    let mut hints = Vec::new();
    if text.is_empty() {
        return hints;
    }

    if HANDLE_IN_TEXT.is_match(&text) {
        if RISKY_TOKEN.is_match(&text) {
            hints.push("UPI handle contains risky token");
        }
        if LONG_DIGITS.is_match(&text) {
            hints.push("UPI handle has long random digits");
        }
    }

    if URL.is_match(&text) {
        if SHORTENER.is_match(&text) {
            hints.push("Shortened URL in QR content");
        }
        if PHISHING_KEYWORD.is_match(&text) {
            hints.push("Phishy URL keyword in QR");
        }
    }

    hints
}

impl Evidence for ImageEvidence {
    const DOMAIN: Domain = Domain::Image;

    fn canonical_bytes(&self) -> Vec<u8> {
        ImageEvidence::canonical_bytes(self)
    }

    fn extract(&self) -> SignalSet {
        let mut signals = SignalSet::new();
        let f = &self.features;
        let kb = f.size_kb();

        if f.anomaly_score > HIGH_ANOMALY {
            signals.add(30, "High compression anomaly (ELA)");
        } else if f.anomaly_score > MODERATE_ANOMALY {
            signals.add(16, "Moderate compression anomaly (ELA)");
        }

        match f.editor_software.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(software) => {
                let lowered = software.to_lowercase();
                if EDITOR_TOKENS.iter().any(|t| lowered.contains(t)) {
                    signals.add(22, format!("Edited using {}", software));
                }
            }
            None => {
                if f.format == ImageFormat::Jpeg {
                    signals.add(4, "Missing device metadata (JPEG)");
                }
            }
        }

        let aspect_ok = f
            .aspect_ratio()
            .map(|r| (MIN_ASPECT..=MAX_ASPECT).contains(&r))
            .unwrap_or(false);
        if !aspect_ok {
            signals.add(8, "Unusual aspect ratio");
        }

        if f.width >= 1080 && kb < 120 {
            signals.add(8, "Very small file size for large resolution");
        }
        if f.pixels() >= 4_000_000 && kb < 200 {
            signals.add(6, "Low bytes per megapixel");
        }

        if self.section == UploadSection::Invoice && kb < 80 {
            signals.add(6, "Low-quality invoice image");
        }

        for hint in qr_risk_hints(self.qr_text()) {
            signals.add(6, hint);
        }

        signals
    }

    fn apply_overrides(&self, tally: &RiskTally, target: &mut TargetTrust, signals: &mut SignalSet) {
        let anomaly = self.features.anomaly_score;

        // Anomaly cap runs before the clean-image floor.
        if anomaly >= STRONG_ANOMALY {
            target.cap(0, Band::new(15, 35));
            signals.add(0, "Strong compression anomaly detected");
        }

        if anomaly <= CLEAN_ANOMALY && tally.heuristic_trust.score() >= CLEAN_MIN_HEURISTIC {
            target.floor(1, Band::new(80, 95));
            signals.add(0, "Clean image: low compression anomaly");
        }

        let qr = self.qr_text().to_lowercase();
        if !qr.is_empty() && (RISKY_TOKEN.is_match(&qr) || SHORTENER.is_match(&qr)) {
            target.cap(2, Band::new(12, 28));
            signals.add(0, "QR content indicates high-risk tokens/shorteners");
        }
    }
}
