//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analysis error
    #[error(transparent)]
    Engine(#[from] rivalscope_engine::EngineError),

    /// Provider error raised before any analysis ran
    #[error(transparent)]
    Provider(#[from] rivalscope_provider::ProviderError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No provider credentials in the config file or environment
    #[error("Missing credentials. Set RIVALSCOPE_LOGIN and RIVALSCOPE_PASSWORD or add them to the [provider] table.")]
    MissingCredentials,

    /// Every target fetch of an analysis failed
    #[error("Every target fetch failed; no results to show")]
    AllTargetsFailed,

    /// File already exists and would be overwritten
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(String),
}
