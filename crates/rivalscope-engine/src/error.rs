//! Error types for the analysis engine

use rivalscope_domain::DomainError;
use rivalscope_provider::ProviderError;
use thiserror::Error;

/// Errors that can occur during an analysis run
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid targets
    #[error("Invalid input: {0}")]
    Domain(#[from] DomainError),

    /// A fetch the analysis cannot do without failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Analysis needs at least one target
    #[error("No targets given")]
    NoTargets,

    /// Seed keyword is empty
    #[error("Seed keyword must not be empty")]
    EmptySeed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
