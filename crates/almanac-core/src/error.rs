//! Error types for almanac.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in almanac operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller passed a value outside its valid domain (month 13, a
    /// malformed date string, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration:\n  {}", .0.join("\n  "))]
    ConfigValidation(Vec<String>),

    #[error("Failed to parse state file {}: {source}", .path.display())]
    StateParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize state: {0}")]
    StateSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_month(month: u32) -> Self {
        Error::InvalidArgument(format!("month must be in 1..=12, got {}", month))
    }
}

/// Result type alias for almanac operations.
pub type Result<T> = std::result::Result<T, Error>;
