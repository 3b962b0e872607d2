//! Trait definitions for external interactions
//!
//! These traits define the boundary between the pure domain and the data provider.
//! Infrastructure implementations live in `rivalscope-provider`.

use crate::{BacklinkReferrerRecord, Condition, KeywordRecord, Target};
use std::future::Future;

/// Query options for keyword endpoints
#[derive(Debug, Clone, Default)]
pub struct KeywordQuery {
    /// Provider location code (falls back to the provider's configured default)
    pub location_code: Option<u32>,

    /// Provider language code (falls back to the provider's configured default)
    pub language_code: Option<String>,

    /// Filter conditions, combined with AND
    pub conditions: Vec<Condition>,

    /// Ordering rules such as `keyword_data.keyword_info.search_volume,desc`
    pub order_by: Vec<String>,

    /// Maximum records to return, or every record when `None`
    pub limit: Option<usize>,
}

/// Query options for backlink endpoints
#[derive(Debug, Clone, Default)]
pub struct BacklinkQuery {
    /// Filter conditions, combined with AND
    pub conditions: Vec<Condition>,

    /// Ordering rules such as `backlinks,desc`
    pub order_by: Vec<String>,

    /// Maximum records to return, or every record when `None`
    pub limit: Option<usize>,
}

/// Source of keyword and backlink data for a domain
///
/// Implemented by the infrastructure layer (rivalscope-provider). Each call concerns
/// exactly one target so callers can fire them concurrently and let each fail on its
/// own.
pub trait SeoDataSource {
    /// Error type for fetch operations
    type Error;

    /// Keywords the target ranks for, in canonical shape
    fn ranked_keywords(
        &self,
        target: &Target,
        query: &KeywordQuery,
    ) -> impl Future<Output = Result<Vec<KeywordRecord>, Self::Error>> + Send;

    /// Referring domains linking to the target
    fn referring_domains(
        &self,
        target: &Target,
        query: &BacklinkQuery,
    ) -> impl Future<Output = Result<Vec<BacklinkReferrerRecord>, Self::Error>> + Send;

    /// Keywords related to a seed keyword, found by graph traversal up to `depth`
    fn related_keywords(
        &self,
        seed: &str,
        depth: u32,
        query: &KeywordQuery,
    ) -> impl Future<Output = Result<Vec<KeywordRecord>, Self::Error>> + Send;
}
