//! Rivalscope Engine
//!
//! Orchestrates competitive analyses: fetches every target concurrently through a
//! `SeoDataSource`, merges the successes and runs the pure comparisons from
//! `rivalscope-domain` over them.
//!
//! # Architecture
//!
//! ```text
//! targets → CompetitiveAnalyzer → join_all(per-target fetch) → MultiFetch → intersect / gap → report
//! ```
//!
//! # Key Features
//!
//! - **Backlink intersection**: referring domains shared by up to five targets
//! - **Link opportunities**: referrers of competitors that skip your own site
//! - **Keyword gap / common**: two-domain keyword comparison
//! - **Multi-competitor gap**: keywords several competitors rank for that you don't
//! - **Partial failure**: failed targets are reported, never fatal unless required
//!
//! # Example Usage
//!
//! ```no_run
//! use rivalscope_engine::{CompetitiveAnalyzer, EngineConfig};
//! use rivalscope_provider::{DataForSeoClient, ProviderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DataForSeoClient::new(ProviderConfig::new("login", "password"))?;
//! let analyzer = CompetitiveAnalyzer::new(client, EngineConfig::default())?;
//!
//! let report = analyzer
//!     .backlink_intersection(&["nike.com", "adidas.com", "puma.com"])
//!     .await?;
//!
//! for row in &report.results {
//!     println!("{} links to {} targets", row.referring_domain, row.coverage_count);
//! }
//! for (target, error) in &report.failed_targets {
//!     eprintln!("{} failed: {}", target, error);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod error;
mod fetch;
mod types;


pub use analyzer::{failure_messages, CompetitiveAnalyzer};
pub use config::EngineConfig;
pub use error::EngineError;
pub use fetch::fetch_all;
pub use types::{BacklinkReport, GapReport, MultiFetch, MultiGapReport, Outcome};
