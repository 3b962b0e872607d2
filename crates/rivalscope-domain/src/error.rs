//! Domain error types

use thiserror::Error;

/// Errors raised while constructing domain values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The input could not be turned into a domain name
    #[error("Invalid target domain: '{0}'")]
    InvalidTarget(String),

    /// More targets than a single analysis run accepts
    #[error("Too many targets: {given} given (max: {max})")]
    TooManyTargets {
        /// Number of targets supplied
        given: usize,
        /// Maximum allowed
        max: usize,
    },

    /// The same domain appeared twice after normalization
    #[error("Duplicate target: {0}")]
    DuplicateTarget(String),
}
