//! Error types for the provider layer

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why the transport could not deliver a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCause {
    /// Connection, DNS, TLS or body read failure
    Network(String),

    /// The attempt exceeded its time budget and was cancelled
    Timeout(Duration),
}

impl fmt::Display for TransportCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportCause::Network(message) => write!(f, "network failure: {}", message),
            TransportCause::Timeout(after) => write!(f, "timed out after {:?}", after),
        }
    }
}

/// Envelope level at which the provider reported a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Top-level status code
    Envelope,
    /// Missing task list
    Tasks,
    /// Task status code
    Task,
    /// Missing result bucket
    Result,
}

impl fmt::Display for EnvelopeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            EnvelopeStage::Envelope => "envelope",
            EnvelopeStage::Tasks => "tasks",
            EnvelopeStage::Task => "task",
            EnvelopeStage::Result => "result",
        };
        f.write_str(stage)
    }
}

/// A well-formed but unsuccessful provider envelope
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Provider rejected request at {stage} level (status {status_code}): {message}")]
pub struct UpstreamError {
    /// Where the envelope check failed
    pub stage: EnvelopeStage,

    /// Provider status code (0 when absent)
    pub status_code: i64,

    /// Provider's own status message
    pub message: String,
}

/// Errors that can occur while talking to the data provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Network failure or timeout after every retry was used
    #[error("Transport error: {cause}")]
    Transport {
        /// Last failure observed
        cause: TransportCause,
    },

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Provider envelope reported a failure
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Non-success HTTP status (client error, or server error after retries)
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Invalid provider configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Whether the provider could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ProviderError::Transport { .. })
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Decode(format!("JSON parse error: {}", e))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            ProviderError::Config(e.to_string())
        } else if e.is_timeout() {
            ProviderError::Transport {
                cause: TransportCause::Timeout(Duration::ZERO),
            }
        } else {
            ProviderError::Transport {
                cause: TransportCause::Network(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_carries_provider_message() {
        let error = ProviderError::from(UpstreamError {
            stage: EnvelopeStage::Task,
            status_code: 40501,
            message: "Invalid Field: 'target'.".to_string(),
        });
        let text = error.to_string();
        assert!(text.contains("task"));
        assert!(text.contains("40501"));
        assert!(text.contains("Invalid Field"));
        assert!(!error.is_transport());
    }

    #[test]
    fn test_transport_display() {
        let error = ProviderError::Transport {
            cause: TransportCause::Timeout(Duration::from_secs(30)),
        };
        assert!(error.is_transport());
        assert_eq!(error.to_string(), "Transport error: timed out after 30s");
    }

    #[test]
    fn test_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(ProviderError::from(json_error), ProviderError::Decode(_)));
    }
}
