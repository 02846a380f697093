//! Deterministic variety injection
//!
//! The evidence's canonical bytes are hashed with SHA-256. The first digest
//! byte (the first two hex characters) modulo 3 picks a bucket, and the first
//! eight bytes seed the RNG that draws the in-band target and every override
//! bound. Identical evidence therefore always yields the identical target.

use crate::config::{Band, VarietyBands};
use crate::types::TrustScore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 digest of an evidence encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceHash([u8; 32]);

impl ReferenceHash {
    /// Hash canonical evidence bytes
    pub fn of(canonical: &[u8]) -> Self {
        let digest = Sha256::digest(canonical);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Lower-case hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Bucket from the first two hex characters
    pub fn bucket(&self) -> VarietyBucket {
        match self.0[0] % 3 {
            0 => VarietyBucket::Safe,
            1 => VarietyBucket::Suspicious,
            _ => VarietyBucket::Fraud,
        }
    }

    fn seed(&self) -> u64 {
        let mut head = [0u8; 8];
        head.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(head)
    }
}

/// Target-trust band picked from the evidence hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarietyBucket {
    /// 85-95 by default
    Safe,
    /// 55-65 by default
    Suspicious,
    /// 15-30 by default
    Fraud,
}

impl VarietyBucket {
    /// Configured band for this bucket
    pub fn band(&self, bands: &VarietyBands) -> Band {
        match self {
            VarietyBucket::Safe => bands.safe,
            VarietyBucket::Suspicious => bands.suspicious,
            VarietyBucket::Fraud => bands.fraud,
        }
    }
}

/// Target trust under construction: base draw plus override caps and floors
#[derive(Debug, Clone)]
pub struct TargetTrust {
    bucket: VarietyBucket,
    seed: u64,
    value: i32,
}

impl TargetTrust {
    /// Pick the bucket and draw the in-band value
    pub fn inject(hash: &ReferenceHash, bands: &VarietyBands) -> Self {
        let bucket = hash.bucket();
        let seed = hash.seed();
        let band = bucket.band(bands);
        let value = StdRng::seed_from_u64(seed).gen_range(band.min..=band.max);

        Self {
            bucket,
            seed,
            value,
        }
    }

    /// Lower the target to at most a value drawn from `band`
    ///
    /// `rule` must be distinct per override: it selects the draw stream, so
    /// whether an earlier rule fired never shifts a later rule's bound.
    pub fn cap(&mut self, rule: u64, band: Band) {
        let bound = self.draw(rule, band);
        if bound < self.value {
            debug!(rule, bound, from = self.value, "target trust capped");
        }
        self.value = self.value.min(bound);
    }

    /// Raise the target to at least a value drawn from `band`
    pub fn floor(&mut self, rule: u64, band: Band) {
        let bound = self.draw(rule, band);
        if bound > self.value {
            debug!(rule, bound, from = self.value, "target trust floored");
        }
        self.value = self.value.max(bound);
    }

    /// Bucket the base value came from
    pub fn bucket(&self) -> VarietyBucket {
        self.bucket
    }

    /// Current target, clamped to 0-100
    pub fn value(&self) -> TrustScore {
        TrustScore::clamped(i64::from(self.value))
    }

    fn draw(&self, rule: u64, band: Band) -> i32 {
        let stream = self.seed ^ rule.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(stream).gen_range(band.min..=band.max)
    }
}
