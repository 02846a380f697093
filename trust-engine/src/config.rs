//! Configuration for the trust engine

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trust engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Message pipeline
    pub message: DomainConfig,

    /// Transaction-group pipeline
    pub transactions: DomainConfig,

    /// Image / QR pipeline
    pub image: DomainConfig,

    /// Target-trust bands picked by the variety bucket
    pub bands: VarietyBands,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            message: DomainConfig {
                alpha: 0.6,
                jitter: Band::new(-2, 3),
            },
            transactions: DomainConfig {
                alpha: 0.6,
                jitter: Band::new(-2, 2),
            },
            image: DomainConfig {
                alpha: 0.55,
                jitter: Band::new(-3, 3),
            },
            bands: VarietyBands::default(),
        }
    }
}

/// Per-domain blending configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Blend weight of heuristic trust (0.0 - 1.0); the rest goes to target trust
    pub alpha: f64,

    /// Inclusive range of random points added to raw risk
    pub jitter: Band,
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    /// Lower bound
    pub min: i32,
    /// Upper bound
    pub max: i32,
}

impl Band {
    /// Create a band
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Check whether a value falls inside the band
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Target-trust range for each variety bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarietyBands {
    /// SAFE bucket
    pub safe: Band,
    /// SUSPICIOUS bucket
    pub suspicious: Band,
    /// FRAUD bucket
    pub fraud: Band,
}

impl Default for VarietyBands {
    fn default() -> Self {
        Self {
            safe: Band::new(85, 95),
            suspicious: Band::new(55, 65),
            fraud: Band::new(15, 30),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then apply environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = EngineConfig::default();

        if let Some(alpha) = env_alpha("TRUST_ENGINE_MESSAGE_ALPHA")? {
            config.message.alpha = alpha;
        }

        if let Some(alpha) = env_alpha("TRUST_ENGINE_TRANSACTIONS_ALPHA")? {
            config.transactions.alpha = alpha;
        }

        if let Some(alpha) = env_alpha("TRUST_ENGINE_IMAGE_ALPHA")? {
            config.image.alpha = alpha;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the trust invariants
    pub fn validate(&self) -> Result<()> {
        for (name, domain) in [
            ("message", &self.message),
            ("transactions", &self.transactions),
            ("image", &self.image),
        ] {
            if !(0.0..=1.0).contains(&domain.alpha) {
                return Err(Error::InvalidConfig(format!(
                    "{} alpha {} outside 0.0..=1.0",
                    name, domain.alpha
                )));
            }
            if domain.jitter.min > domain.jitter.max {
                return Err(Error::InvalidConfig(format!(
                    "{} jitter range {}..={} is inverted",
                    name, domain.jitter.min, domain.jitter.max
                )));
            }
        }

        for (name, band) in [
            ("safe", self.bands.safe),
            ("suspicious", self.bands.suspicious),
            ("fraud", self.bands.fraud),
        ] {
            if band.min > band.max || band.min < 0 || band.max > 100 {
                return Err(Error::InvalidConfig(format!(
                    "{} band {}..={} must be an ordered range within 0..=100",
                    name, band.min, band.max
                )));
            }
        }

        Ok(())
    }
}

fn env_alpha(var: &str) -> Result<Option<f64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("{}={:?}: {}", var, raw, e))),
        Err(_) => Ok(None),
    }
}
