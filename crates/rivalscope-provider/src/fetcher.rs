//! Resilient HTTP fetching
//!
//! Wraps a [`Transport`] with per-attempt timeouts, retries on server errors and
//! exponential backoff.
//!
//! # Behavior
//!
//! - 2xx and 4xx responses are returned immediately
//! - 5xx responses are retried; if the last attempt is still a 5xx it is returned
//! - Network failures and timeouts are retried, then surfaced as
//!   [`ProviderError::Transport`]
//! - Backoff before retry `n` (0-based) is `base_delay * 2^n`
//! - Cancelling the caller's token ends the loop with [`ProviderError::Cancelled`]

use crate::error::{ProviderError, TransportCause};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Largest response body kept in error messages
const ERROR_BODY_LIMIT: usize = 512;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST with a JSON body
    Post,
}

/// A single outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// JSON body
    pub body: Option<Value>,
    /// Basic auth credentials (login, password)
    pub basic_auth: Option<(String, String)>,
}

impl FetchRequest {
    /// POST request with a JSON body
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            basic_auth: None,
        }
    }

    /// GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            basic_auth: None,
        }
    }

    /// Attach basic auth credentials
    pub fn with_basic_auth(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((login.into(), password.into()));
        self
    }
}

/// Response status and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body text
    pub body: String,
}

impl FetchResponse {
    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 5xx
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json(&self) -> Result<Value, ProviderError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Convert a non-2xx response into an error
    pub fn error_for_status(self) -> Result<Self, ProviderError> {
        if self.is_success() {
            return Ok(self);
        }

        let mut body = self.body;
        if body.len() > ERROR_BODY_LIMIT {
            let mut cut = ERROR_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(ProviderError::HttpStatus {
            status: self.status,
            body,
        })
    }
}

/// Failure of a single transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// Network-level failure
    Network(String),
    /// The attempt's token was cancelled before a response arrived
    Cancelled,
}

/// Sends one HTTP request
///
/// Implementations must return [`TransportFailure::Cancelled`] promptly once `cancel`
/// fires.
pub trait Transport: Send + Sync {
    /// Perform a single request
    fn send(
        &self,
        request: &FetchRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<FetchResponse, TransportFailure>> + Send;
}

/// Production transport backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh client
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rivalscope/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &FetchRequest,
        cancel: CancellationToken,
    ) -> Result<FetchResponse, TransportFailure> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if let Some((login, password)) = &request.basic_auth {
            builder = builder.basic_auth(login, Some(password));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let call = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(FetchResponse { status, body })
        };

        tokio::select! {
            result = call => result.map_err(|e| TransportFailure::Network(e.to_string())),
            _ = cancel.cancelled() => Err(TransportFailure::Cancelled),
        }
    }
}

/// Retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff base
    pub base_delay: Duration,
    /// Time budget for each attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Total attempts made before giving up
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Outcome of one attempt, before the retry decision
enum Attempt {
    Response(FetchResponse),
    Failed(TransportCause),
}

/// HTTP fetcher with timeouts, retries and backoff
#[derive(Debug, Clone)]
pub struct ResilientFetcher<T = ReqwestTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> ResilientFetcher<T> {
    /// Create a fetcher over a transport
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Retry settings in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch with retries
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, ProviderError> {
        self.fetch_with_cancel(request, &CancellationToken::new()).await
    }

    /// Fetch with retries, stopping early if `parent` is cancelled
    ///
    /// Each attempt runs under a child token of `parent`. A timed-out attempt cancels
    /// only its own child token.
    pub async fn fetch_with_cancel(
        &self,
        request: &FetchRequest,
        parent: &CancellationToken,
    ) -> Result<FetchResponse, ProviderError> {
        let attempts = self.policy.total_attempts();
        let mut last_cause = None;

        for attempt in 0..attempts {
            if parent.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }

            debug!(url = %request.url, attempt = attempt, "Sending request");

            match self.attempt(request, parent).await {
                Attempt::Response(response) if response.is_server_error() => {
                    if attempt + 1 == attempts {
                        info!(
                            url = %request.url,
                            attempt = attempt,
                            status = response.status,
                            "Giving up after server errors"
                        );
                        return Ok(response);
                    }
                    warn!(
                        url = %request.url,
                        attempt = attempt,
                        status = response.status,
                        delay_ms = self.policy.delay_for(attempt).as_millis() as u64,
                        "Server error, retrying"
                    );
                }
                Attempt::Response(response) => {
                    debug!(url = %request.url, attempt = attempt, status = response.status, "Received response");
                    return Ok(response);
                }
                Attempt::Failed(cause) => {
                    if parent.is_cancelled() {
                        return Err(ProviderError::Cancelled);
                    }
                    if attempt + 1 < attempts {
                        warn!(
                            url = %request.url,
                            attempt = attempt,
                            error = %cause,
                            delay_ms = self.policy.delay_for(attempt).as_millis() as u64,
                            "Request failed, retrying"
                        );
                    }
                    last_cause = Some(cause);
                }
            }

            if attempt + 1 < attempts {
                tokio::select! {
                    _ = tokio::time::sleep(self.policy.delay_for(attempt)) => {}
                    _ = parent.cancelled() => return Err(ProviderError::Cancelled),
                }
            }
        }

        let cause = last_cause.unwrap_or_else(|| TransportCause::Network("no attempts made".to_string()));
        info!(url = %request.url, attempts = attempts, error = %cause, "Giving up after transport failures");
        Err(ProviderError::Transport { cause })
    }

    /// Run a single attempt bounded by the attempt timeout
    async fn attempt(&self, request: &FetchRequest, parent: &CancellationToken) -> Attempt {
        let token = parent.child_token();
        let send = self.transport.send(request, token.clone());
        tokio::pin!(send);

        let result = tokio::select! {
            result = &mut send => result,
            _ = tokio::time::sleep(self.policy.attempt_timeout) => {
                token.cancel();
                send.await
            }
        };

        match result {
            Ok(response) => Attempt::Response(response),
            Err(TransportFailure::Network(message)) => Attempt::Failed(TransportCause::Network(message)),
            Err(TransportFailure::Cancelled) => {
                Attempt::Failed(TransportCause::Timeout(self.policy.attempt_timeout))
            }
        }
    }
}
