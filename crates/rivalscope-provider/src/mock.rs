//! Deterministic data source for testing
//!
//! Returns scripted records per target, optionally failing or delaying specific
//! targets, and counts calls. Targets with nothing scripted return no records.

use crate::error::ProviderError;
use rivalscope_domain::{
    normalize_keyword, BacklinkQuery, BacklinkReferrerRecord, KeywordQuery, KeywordRecord, SeoDataSource, Target,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Mock data source for deterministic testing
///
/// # Examples
///
/// ```
/// use rivalscope_domain::{KeywordRecord, Target};
/// use rivalscope_provider::MockDataSource;
///
/// let mut source = MockDataSource::new();
/// let target = Target::parse("example.com").unwrap();
/// source.add_keywords(&target, vec![KeywordRecord::new("running shoes")]);
/// assert_eq!(source.call_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    keywords: HashMap<Target, Vec<KeywordRecord>>,
    referrers: HashMap<Target, Vec<BacklinkReferrerRecord>>,
    related: HashMap<String, Vec<KeywordRecord>>,
    failures: HashMap<Target, ProviderError>,
    delays: HashMap<Target, Duration>,
    call_count: Arc<Mutex<usize>>,
}

impl MockDataSource {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the keywords a target ranks for
    pub fn add_keywords(&mut self, target: &Target, records: Vec<KeywordRecord>) {
        self.keywords.insert(target.clone(), records);
    }

    /// Script the referring domains of a target
    pub fn add_referrers(&mut self, target: &Target, records: Vec<BacklinkReferrerRecord>) {
        self.referrers.insert(target.clone(), records);
    }

    /// Script the related keywords for a seed
    pub fn add_related(&mut self, seed: &str, records: Vec<KeywordRecord>) {
        self.related.insert(normalize_keyword(seed), records);
    }

    /// Make every call concerning `target` fail with `error`
    pub fn add_failure(&mut self, target: &Target, error: ProviderError) {
        self.failures.insert(target.clone(), error);
    }

    /// Delay every call concerning `target`
    pub fn add_delay(&mut self, target: &Target, delay: Duration) {
        self.delays.insert(target.clone(), delay);
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }

    async fn enter(&self, target: &Target) -> Result<(), ProviderError> {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        if let Some(delay) = self.delays.get(target) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(target) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn truncated<T: Clone>(records: Option<&Vec<T>>, limit: Option<usize>) -> Vec<T> {
    let records = records.map(Vec::as_slice).unwrap_or_default();
    let take = limit.unwrap_or(records.len()).min(records.len());
    records[..take].to_vec()
}

impl SeoDataSource for MockDataSource {
    type Error = ProviderError;

    async fn ranked_keywords(&self, target: &Target, query: &KeywordQuery) -> Result<Vec<KeywordRecord>, ProviderError> {
        self.enter(target).await?;
        Ok(truncated(self.keywords.get(target), query.limit))
    }

    async fn referring_domains(
        &self,
        target: &Target,
        query: &BacklinkQuery,
    ) -> Result<Vec<BacklinkReferrerRecord>, ProviderError> {
        self.enter(target).await?;
        Ok(truncated(self.referrers.get(target), query.limit))
    }

    async fn related_keywords(
        &self,
        seed: &str,
        _depth: u32,
        query: &KeywordQuery,
    ) -> Result<Vec<KeywordRecord>, ProviderError> {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(truncated(self.related.get(&normalize_keyword(seed)), query.limit))
    }
}
