//! Rivalscope Provider Layer
//!
//! HTTP infrastructure for the DataForSEO API, implementing the `SeoDataSource` trait
//! from `rivalscope-domain`.
//!
//! # Components
//!
//! - `ResilientFetcher`: per-attempt timeouts, retries on 5xx, exponential backoff
//! - `request`: task bodies, filter wire form, limit clamping, pagination
//! - `envelope`: provider status checks before any item is trusted
//! - `normalizer`: flat and nested item shapes mapped onto canonical records
//! - `DataForSeoClient`: the production data source
//! - `MockDataSource`: deterministic data source for testing
//!
//! # Examples
//!
//! ```
//! use rivalscope_domain::{KeywordQuery, KeywordRecord, SeoDataSource, Target};
//! use rivalscope_provider::MockDataSource;
//!
//! # tokio_test_block(async {
//! let mut source = MockDataSource::new();
//! let target = Target::parse("example.com").unwrap();
//! source.add_keywords(&target, vec![KeywordRecord::new("running shoes")]);
//!
//! let keywords = source.ranked_keywords(&target, &KeywordQuery::default()).await.unwrap();
//! assert_eq!(keywords.len(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod mock;
pub mod normalizer;
pub mod request;

pub use client::DataForSeoClient;
pub use config::ProviderConfig;
pub use envelope::{parse_envelope, ResultPage};
pub use error::{EnvelopeStage, ProviderError, TransportCause, UpstreamError};
pub use fetcher::{FetchRequest, FetchResponse, ReqwestTransport, ResilientFetcher, RetryPolicy, Transport};
pub use mock::MockDataSource;
pub use normalizer::{normalize_keyword, normalize_referrer, to_flat_json, SourceShape};
