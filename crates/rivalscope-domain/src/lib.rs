//! Rivalscope Domain Layer
//!
//! Core domain model and pure comparison algorithms for competitive SEO analysis.
//! This crate never performs I/O, never logs, and never suspends. Its only
//! dependency is `thiserror` for the error enums.
//!
//! ## Key Concepts
//!
//! - **Target**: one of up to five domains compared in a single analysis run
//! - **KeywordRecord**: canonical keyword ranking data, whatever endpoint produced it
//! - **BacklinkReferrerRecord**: one referring domain linking to one target
//! - **Filter expressions**: typed boolean trees sent to the data provider
//! - **Intersection**: which referring domains link to many targets
//! - **Gap / Common**: which keywords a competitor ranks for that you don't, or both do
//!
//! ## Architecture
//!
//! Infrastructure (HTTP, envelope parsing, normalization) lives in
//! `rivalscope-provider`, which implements [`traits::SeoDataSource`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backlink;
pub mod error;
pub mod filter;
pub mod gap;
pub mod intersection;
pub mod keyword;
pub mod target;
pub mod traits;

// Re-exports for convenience
pub use backlink::BacklinkReferrerRecord;
pub use error::DomainError;
pub use filter::{
    Condition, Connective, FieldType, FilterExpression, FilterExpressionBuilder, FilterField,
    FilterLeaf, FilterOperator, FilterValidationError, FilterValue,
};
pub use gap::{
    analyze_gap, multi_competitor_gap, partition, Combine, GapMode, GapResult, KeywordPartition,
    MultiGapResult,
};
pub use intersection::{
    coverage_counts, intersect, opportunities, IntersectionQuery, IntersectionResult, TargetLinks,
};
pub use keyword::{normalize_keyword, CompetitionLevel, KeywordRecord};
pub use target::{Target, MAX_TARGETS};
pub use traits::{BacklinkQuery, KeywordQuery, SeoDataSource};
