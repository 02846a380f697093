//! Error types for the trust engine

use thiserror::Error;

/// Trust engine error
///
/// Scoring itself never fails; only configuration can be rejected.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
