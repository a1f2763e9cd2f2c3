//! Error types for Synheart Focus

use thiserror::Error;

/// Errors that can occur while configuring or driving a focus session
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("Failed to parse landmark frame: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Frame source failed: {0}")]
    SourceFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
