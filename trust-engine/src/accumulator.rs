//! Risk accumulation and blending

use crate::types::TrustScore;

/// Clamped risk plus its inverse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskTally {
    /// Risk 0-100
    pub risk: u8,
    /// `100 - risk`
    pub heuristic_trust: TrustScore,
}

/// Apply jitter to the raw sum and clamp into 0-100
pub fn accumulate(raw_risk: i32, jitter: i32) -> RiskTally {
    let risk = (i64::from(raw_risk) + i64::from(jitter)).clamp(0, 100) as u8;
    RiskTally {
        risk,
        heuristic_trust: heuristic_trust(risk),
    }
}

/// `clamp(100 - risk, 0, 100)`
pub fn heuristic_trust(risk: u8) -> TrustScore {
    TrustScore::clamped(100 - i64::from(risk))
}

/// `round(alpha * heuristic + (1 - alpha) * target)`, clamped
pub fn blend(alpha: f64, heuristic: TrustScore, target: TrustScore) -> TrustScore {
    let mixed = alpha * f64::from(heuristic.score()) + (1.0 - alpha) * f64::from(target.score());
    TrustScore::clamped(mixed.round() as i64)
}
