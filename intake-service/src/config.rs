//! Configuration for the intake service

use crate::error::{IntakeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trust_engine::EngineConfig;

/// Intake service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Service name
    pub service_name: String,

    /// Audit trail file (JSON lines)
    pub audit_path: PathBuf,

    /// Upper bound on images analyzed at once
    pub max_concurrent_images: usize,

    /// Message characters kept in the audit input summary
    pub summary_message_chars: usize,

    /// Scoring engine configuration
    pub engine: EngineConfig,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            service_name: "intake-service".to_string(),
            audit_path: PathBuf::from("./data/assessments.jsonl"),
            max_concurrent_images: 8,
            summary_message_chars: 120,
            engine: EngineConfig::default(),
        }
    }
}

impl IntakeConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: IntakeConfig =
            toml::from_str(&content).map_err(|e| IntakeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then apply `INTAKE_*` and `TRUST_ENGINE_*` overrides
    pub fn from_env() -> Result<Self> {
        let mut config = IntakeConfig {
            engine: EngineConfig::from_env()?,
            ..Default::default()
        };

        if let Ok(path) = std::env::var("INTAKE_AUDIT_PATH") {
            config.audit_path = PathBuf::from(path);
        }

        if let Ok(raw) = std::env::var("INTAKE_MAX_CONCURRENT_IMAGES") {
            config.max_concurrent_images = raw.trim().parse().map_err(|e| {
                IntakeError::Config(format!("INTAKE_MAX_CONCURRENT_IMAGES={:?}: {}", raw, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_images == 0 {
            return Err(IntakeError::Config(
                "max_concurrent_images must be at least 1".to_string(),
            ));
        }
        self.engine.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IntakeConfig::default();
        assert_eq!(config.summary_message_chars, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(
            &path,
            "audit_path = \"/tmp/audit.jsonl\"\nmax_concurrent_images = 2\n\n[engine.image]\nalpha = 0.7\njitter = { min = -1, max = 1 }\n",
        )
        .unwrap();

        let config = IntakeConfig::from_file(&path).unwrap();
        assert_eq!(config.max_concurrent_images, 2);
        assert_eq!(config.engine.image.alpha, 0.7);
        assert_eq!(config.engine.message.alpha, 0.6);
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config = IntakeConfig {
            max_concurrent_images: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(IntakeError::Config(_))));
    }
}
