//! Core CompetitiveAnalyzer implementation

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fetch::fetch_all;
use crate::types::{BacklinkReport, GapReport, MultiFetch, MultiGapReport, Outcome};
use rivalscope_domain::{
    analyze_gap, intersect, multi_competitor_gap, opportunities, BacklinkQuery, Combine, Condition, GapMode,
    IntersectionQuery, KeywordQuery, KeywordRecord, SeoDataSource, Target,
};
use rivalscope_provider::ProviderError;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Runs competitive analyses over a data source
///
/// Every per-target fetch of one analysis runs concurrently. Targets that fail are
/// reported alongside the results computed from the targets that succeeded.
pub struct CompetitiveAnalyzer<S>
where
    S: SeoDataSource<Error = ProviderError>,
{
    source: S,
    config: EngineConfig,
}

impl<S> CompetitiveAnalyzer<S>
where
    S: SeoDataSource<Error = ProviderError>,
{
    /// Create a new analyzer
    pub fn new(source: S, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        Ok(Self { source, config })
    }

    /// Configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying data source
    pub fn source(&self) -> &S {
        &self.source
    }

    fn parse_targets<D: AsRef<str>>(targets: &[D]) -> Result<Vec<Target>, EngineError> {
        if targets.is_empty() {
            return Err(EngineError::NoTargets);
        }
        Ok(Target::parse_all(targets)?)
    }

    fn backlink_query(&self) -> BacklinkQuery {
        BacklinkQuery {
            limit: Some(self.config.fetch_limit),
            order_by: vec!["backlinks,desc".to_string()],
            ..Default::default()
        }
    }

    fn keyword_query(&self, conditions: &[Condition]) -> KeywordQuery {
        KeywordQuery {
            conditions: conditions.to_vec(),
            order_by: vec!["keyword_data.keyword_info.search_volume,desc".to_string()],
            limit: Some(self.config.fetch_limit),
            ..Default::default()
        }
    }

    /// The reference's whole ranking, so a competitor keyword is only a gap when the
    /// reference has no position for it anywhere
    fn reference_query(&self) -> KeywordQuery {
        KeywordQuery {
            limit: None,
            ..self.keyword_query(&[])
        }
    }

    /// Referring domains shared by up to five targets
    ///
    /// Referrers linking to fewer than `min_coverage` targets, and referrers that are
    /// themselves one of the targets, are left out.
    pub async fn backlink_intersection<D: AsRef<str>>(&self, targets: &[D]) -> Result<BacklinkReport, EngineError> {
        let targets = Self::parse_targets(targets)?;
        info!(targets = targets.len(), "Starting backlink intersection");

        let query = self.backlink_query();
        let fetched = fetch_all(&targets, |target| {
            let query = &query;
            async move { self.source.referring_domains(&target, query).await }
        })
        .await;

        let outcome = fetched.outcome();
        let filter = IntersectionQuery {
            min_coverage: self.config.min_coverage,
            exclude: targets.iter().map(|t| t.as_str().to_string()).collect(),
            limit: Some(self.config.result_limit),
        };
        let results = filter.apply(intersect(&fetched.succeeded));

        info!(
            results = results.len(),
            failed = fetched.failed.len(),
            outcome = outcome.as_str(),
            "Backlink intersection complete"
        );

        Ok(BacklinkReport {
            targets,
            own_site: None,
            results,
            failed_targets: fetched.failed,
            outcome,
        })
    }

    /// Referring domains linking to competitors but not to `own_site`
    ///
    /// The own site's links are required: if that fetch fails the whole analysis fails.
    pub async fn link_opportunities<D: AsRef<str>>(
        &self,
        own_site: &str,
        competitors: &[D],
    ) -> Result<BacklinkReport, EngineError> {
        if competitors.is_empty() {
            return Err(EngineError::NoTargets);
        }
        let mut all = vec![own_site.to_string()];
        all.extend(competitors.iter().map(|c| c.as_ref().to_string()));
        let all = Self::parse_targets(&all)?;
        let own_site = all[0].clone();
        let competitors = all[1..].to_vec();

        info!(own_site = %own_site, competitors = competitors.len(), "Starting link opportunity search");

        let query = self.backlink_query();
        let mut fetched = fetch_all(&all, |target| {
            let query = &query;
            async move { self.source.referring_domains(&target, query).await }
        })
        .await;

        let own_links = match fetched.take(&own_site) {
            Some(Ok(records)) => records,
            Some(Err(e)) => return Err(EngineError::Provider(e)),
            None => Vec::new(),
        };
        let outcome = fetched.outcome();

        let mut per_target = fetched.succeeded;
        per_target.insert(own_site.clone(), own_links);

        let filter = IntersectionQuery {
            min_coverage: self.config.min_coverage,
            exclude: all.iter().map(|t| t.as_str().to_string()).collect(),
            limit: Some(self.config.result_limit),
        };
        let results = filter.apply(opportunities(&per_target, &own_site));

        info!(
            results = results.len(),
            failed = fetched.failed.len(),
            outcome = outcome.as_str(),
            "Link opportunity search complete"
        );

        Ok(BacklinkReport {
            targets: competitors,
            own_site: Some(own_site),
            results,
            failed_targets: fetched.failed,
            outcome,
        })
    }

    /// Keywords `competitor` ranks for that `reference` does not (GAP), or both rank
    /// for (COMMON)
    ///
    /// `conditions` filter the competitor's keywords; the reference side is fetched
    /// unfiltered so that a keyword the reference already ranks for is never reported
    /// as a gap. The reference fetch is required.
    pub async fn keyword_gap(
        &self,
        reference: &str,
        competitor: &str,
        mode: GapMode,
        conditions: &[Condition],
    ) -> Result<GapReport, EngineError> {
        let targets = Self::parse_targets(&[reference, competitor])?;
        let (reference, competitor) = (targets[0].clone(), targets[1].clone());
        info!(reference = %reference, competitor = %competitor, mode = mode.as_str(), "Starting keyword comparison");

        let mut fetched = self.fetch_keywords(&reference, &targets[1..], conditions).await;
        let reference_keywords = match fetched.take(&reference) {
            Some(Ok(records)) => records,
            Some(Err(e)) => return Err(EngineError::Provider(e)),
            None => Vec::new(),
        };

        let outcome = fetched.outcome();
        let mut results = match fetched.succeeded.get(&competitor) {
            Some(competitor_keywords) => analyze_gap(&reference_keywords, competitor_keywords, mode),
            None => Vec::new(),
        };
        results.truncate(self.config.result_limit);

        info!(results = results.len(), outcome = outcome.as_str(), "Keyword comparison complete");

        Ok(GapReport {
            reference,
            competitor,
            mode,
            results,
            failed_targets: fetched.failed,
            outcome,
        })
    }

    /// Keywords several competitors rank for that `reference` does not
    ///
    /// `combine` defaults to the configured rule when `None`. Competitors that fail are
    /// left out of the merge and listed in the report.
    pub async fn multi_competitor_gap<D: AsRef<str>>(
        &self,
        reference: &str,
        competitors: &[D],
        combine: Option<Combine>,
        conditions: &[Condition],
    ) -> Result<MultiGapReport, EngineError> {
        if competitors.is_empty() {
            return Err(EngineError::NoTargets);
        }
        let mut all = vec![reference.to_string()];
        all.extend(competitors.iter().map(|c| c.as_ref().to_string()));
        let targets = Self::parse_targets(&all)?;
        let reference = targets[0].clone();
        let competitors = targets[1..].to_vec();
        let combine = combine.unwrap_or_else(|| self.config.combine());

        info!(reference = %reference, competitors = competitors.len(), "Starting multi-competitor gap");

        let mut fetched = self.fetch_keywords(&reference, &competitors, conditions).await;
        let reference_keywords = match fetched.take(&reference) {
            Some(Ok(records)) => records,
            Some(Err(e)) => return Err(EngineError::Provider(e)),
            None => Vec::new(),
        };

        let outcome = fetched.outcome();
        if outcome == Outcome::AllFailed {
            warn!(reference = %reference, "Every competitor fetch failed");
        }

        let mut results = multi_competitor_gap(&reference_keywords, &fetched.succeeded, combine);
        results.truncate(self.config.result_limit);

        Ok(MultiGapReport {
            reference,
            competitors,
            combine,
            results,
            failed_targets: fetched.failed,
            outcome,
        })
    }

    /// Keywords related to a seed, up to `depth` hops away
    pub async fn related_keywords(
        &self,
        seed: &str,
        depth: u32,
        conditions: &[Condition],
    ) -> Result<Vec<KeywordRecord>, EngineError> {
        if seed.trim().is_empty() {
            return Err(EngineError::EmptySeed);
        }

        let query = self.keyword_query(conditions);
        let mut records = self.source.related_keywords(seed, depth, &query).await?;
        records.sort_by(|a, b| {
            b.search_volume
                .cmp(&a.search_volume)
                .then_with(|| a.key().cmp(&b.key()))
        });
        records.truncate(self.config.result_limit);

        info!(seed = seed, depth = depth, results = records.len(), "Related keywords complete");
        Ok(records)
    }

    /// Fetch the reference unfiltered and the competitors filtered, all at once
    async fn fetch_keywords(
        &self,
        reference: &Target,
        competitors: &[Target],
        conditions: &[Condition],
    ) -> MultiFetch<Vec<KeywordRecord>> {
        let unfiltered = self.reference_query();
        let filtered = self.keyword_query(conditions);

        let mut targets = Vec::with_capacity(competitors.len() + 1);
        targets.push(reference.clone());
        targets.extend(competitors.iter().cloned());

        fetch_all(&targets, |target| {
            let query = if &target == reference { &unfiltered } else { &filtered };
            async move { self.source.ranked_keywords(&target, query).await }
        })
        .await
    }
}

/// Failure reasons as display strings, keyed by target
pub fn failure_messages(failed: &BTreeMap<Target, ProviderError>) -> BTreeMap<String, String> {
    failed
        .iter()
        .map(|(target, error)| (target.as_str().to_string(), error.to_string()))
        .collect()
}
