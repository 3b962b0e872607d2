//! Backlink intersection across targets
//!
//! Answers "which sites are hot link-building targets": a referring domain that links
//! to several of the analysed domains is a stronger opportunity than one that links to
//! a single domain.
//!
//! # Ordering
//!
//! Results are sorted by coverage (descending), then total backlinks (descending),
//! then referring domain (ascending). The final key is unique per result, so the order
//! is total and never depends on map iteration order.

use crate::{BacklinkReferrerRecord, Target};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Link counts from one referring domain to one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetLinks {
    /// Backlinks to the target
    pub backlinks: u64,
    /// Distinct referring pages pointing at the target
    pub referring_pages: u64,
}

/// Coverage summary for one referring domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionResult {
    /// Normalized referring domain
    pub referring_domain: String,

    /// Targets this domain links to
    pub targets_hit: BTreeSet<Target>,

    /// Number of targets linked (always `targets_hit.len()`)
    pub coverage_count: usize,

    /// Backlinks summed over every target
    pub total_backlinks: u64,

    /// Referring pages summed over every target
    pub total_referring_pages: u64,

    /// Highest authority rank reported for the domain
    pub rank: u64,

    /// Per-target counts; only targets with at least one backlink appear
    pub per_target: BTreeMap<Target, TargetLinks>,
}

impl IntersectionResult {
    /// Whether the referring domain links to the given target
    pub fn links_to(&self, target: &Target) -> bool {
        self.targets_hit.contains(target)
    }
}

/// Post-processing applied to intersection results
#[derive(Debug, Clone)]
pub struct IntersectionQuery {
    /// Minimum number of targets a referrer must link to
    pub min_coverage: usize,

    /// Referring domains to leave out (e.g. the analysed domains themselves)
    pub exclude: BTreeSet<String>,

    /// Maximum number of results to keep
    pub limit: Option<usize>,
}

impl Default for IntersectionQuery {
    fn default() -> Self {
        Self {
            min_coverage: 1,
            exclude: BTreeSet::new(),
            limit: None,
        }
    }
}

impl IntersectionQuery {
    /// Filter and truncate already-sorted results
    pub fn apply(&self, results: Vec<IntersectionResult>) -> Vec<IntersectionResult> {
        let kept = results
            .into_iter()
            .filter(|r| r.coverage_count >= self.min_coverage)
            .filter(|r| !self.exclude.contains(&r.referring_domain));

        match self.limit {
            Some(limit) => kept.take(limit).collect(),
            None => kept.collect(),
        }
    }
}

/// Invert labelled sets: for every member, the labels of the sets containing it
///
/// This is the shared N-way intersection primitive: a member's coverage is the size of
/// its label set, and the members present in all `n` sets are exactly those with `n`
/// labels.
///
/// # Examples
///
/// ```
/// use rivalscope_domain::coverage_counts;
/// use std::collections::{BTreeMap, BTreeSet};
///
/// let mut sets = BTreeMap::new();
/// sets.insert("a", BTreeSet::from(["x", "y"]));
/// sets.insert("b", BTreeSet::from(["y"]));
///
/// let coverage = coverage_counts(&sets);
/// assert_eq!(coverage["y"].len(), 2);
/// assert_eq!(coverage["x"].len(), 1);
/// ```
pub fn coverage_counts<L, K>(sets: &BTreeMap<L, BTreeSet<K>>) -> BTreeMap<K, BTreeSet<L>>
where
    L: Ord + Clone,
    K: Ord + Clone,
{
    let mut coverage: BTreeMap<K, BTreeSet<L>> = BTreeMap::new();
    for (label, members) in sets {
        for member in members {
            coverage.entry(member.clone()).or_default().insert(label.clone());
        }
    }
    coverage
}

/// Compute per-referrer coverage over the given targets
///
/// Each target's list is folded by referring domain (duplicate rows add up), the
/// shared coverage primitive finds which targets each referrer links to, and referrers
/// without a single backlink anywhere are never materialized. An empty map (every
/// fetch failed) yields an empty list.
pub fn intersect(per_target: &BTreeMap<Target, Vec<BacklinkReferrerRecord>>) -> Vec<IntersectionResult> {
    let mut folded: BTreeMap<Target, BTreeMap<String, TargetLinks>> = BTreeMap::new();
    let mut ranks: BTreeMap<String, u64> = BTreeMap::new();

    for (target, records) in per_target {
        let links = folded.entry(target.clone()).or_default();
        for record in records {
            let key = record.referrer_key();
            if key.is_empty() {
                continue;
            }
            let entry = links.entry(key.clone()).or_default();
            entry.backlinks = entry.backlinks.saturating_add(record.backlinks_to_target);
            entry.referring_pages = entry
                .referring_pages
                .saturating_add(record.referring_pages_to_target);

            let rank = ranks.entry(key).or_default();
            *rank = (*rank).max(record.rank);
        }
    }

    let linked: BTreeMap<Target, BTreeSet<String>> = folded
        .iter()
        .map(|(target, links)| {
            let referrers = links
                .iter()
                .filter(|(_, counts)| counts.backlinks > 0)
                .map(|(referrer, _)| referrer.clone())
                .collect();
            (target.clone(), referrers)
        })
        .collect();

    let mut results: Vec<IntersectionResult> = coverage_counts(&linked)
        .into_iter()
        .map(|(referrer, targets_hit)| {
            let per_target: BTreeMap<Target, TargetLinks> = targets_hit
                .iter()
                .map(|target| {
                    let counts = folded
                        .get(target)
                        .and_then(|links| links.get(&referrer))
                        .copied()
                        .unwrap_or_default();
                    (target.clone(), counts)
                })
                .collect();

            IntersectionResult {
                total_backlinks: per_target.values().map(|c| c.backlinks).sum(),
                total_referring_pages: per_target.values().map(|c| c.referring_pages).sum(),
                rank: ranks.get(&referrer).copied().unwrap_or_default(),
                coverage_count: targets_hit.len(),
                targets_hit,
                per_target,
                referring_domain: referrer,
            }
        })
        .collect();

    results.sort_by(compare_results);
    results
}

/// Referrers that link to at least one competitor but not to `own_site`
///
/// Coverage is counted over the competitors only. If `own_site` is not among the
/// targets, every referrer is an opportunity.
pub fn opportunities(
    per_target: &BTreeMap<Target, Vec<BacklinkReferrerRecord>>,
    own_site: &Target,
) -> Vec<IntersectionResult> {
    let already_linking: BTreeSet<String> = per_target
        .get(own_site)
        .map(|records| {
            records
                .iter()
                .filter(|r| r.backlinks_to_target > 0)
                .map(BacklinkReferrerRecord::referrer_key)
                .collect()
        })
        .unwrap_or_default();

    let competitors: BTreeMap<Target, Vec<BacklinkReferrerRecord>> = per_target
        .iter()
        .filter(|(target, _)| *target != own_site)
        .map(|(target, records)| (target.clone(), records.clone()))
        .collect();

    intersect(&competitors)
        .into_iter()
        .filter(|r| !already_linking.contains(&r.referring_domain))
        .collect()
}

fn compare_results(a: &IntersectionResult, b: &IntersectionResult) -> Ordering {
    b.coverage_count
        .cmp(&a.coverage_count)
        .then_with(|| b.total_backlinks.cmp(&a.total_backlinks))
        .then_with(|| a.referring_domain.cmp(&b.referring_domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(domain: &str) -> Target {
        Target::parse(domain).unwrap()
    }

    fn link(referrer: &str, target: &str, backlinks: u64) -> BacklinkReferrerRecord {
        BacklinkReferrerRecord::new(referrer, t(target)).with_links(backlinks, backlinks.min(3))
    }

    fn sportswear() -> BTreeMap<Target, Vec<BacklinkReferrerRecord>> {
        let mut map = BTreeMap::new();
        map.insert(
            t("nike.com"),
            vec![
                link("runningmagazine.com", "nike.com", 5),
                link("sportblog.fr", "nike.com", 40),
                link("sneakernews.com", "nike.com", 100),
            ],
        );
        map.insert(
            t("adidas.com"),
            vec![
                link("runningmagazine.com", "adidas.com", 2),
                link("sportblog.fr", "adidas.com", 30),
            ],
        );
        map.insert(
            t("asics.com"),
            vec![link("runningmagazine.com", "asics.com", 1)],
        );
        map
    }

    #[test]
    fn test_full_coverage_ranked_first() {
        let results = intersect(&sportswear());

        assert_eq!(results[0].referring_domain, "runningmagazine.com");
        assert_eq!(results[0].coverage_count, 3);
        assert_eq!(results[0].total_backlinks, 8);
        assert!(results[1..].iter().all(|r| r.coverage_count < 3));
    }

    #[test]
    fn test_referring_pages_summed_over_targets_hit() {
        let results = intersect(&sportswear());
        let magazine = &results[0];

        assert_eq!(magazine.total_referring_pages, 6);
        assert_eq!(
            magazine.total_referring_pages,
            magazine.per_target.values().map(|links| links.referring_pages).sum::<u64>()
        );
    }

    #[test]
    fn test_partial_coverage_has_no_entry_for_missing_target() {
        let results = intersect(&sportswear());
        let sportblog = results.iter().find(|r| r.referring_domain == "sportblog.fr").unwrap();

        assert_eq!(sportblog.coverage_count, 2);
        assert!(sportblog.links_to(&t("nike.com")));
        assert!(sportblog.links_to(&t("adidas.com")));
        assert!(!sportblog.per_target.contains_key(&t("asics.com")));
        assert_eq!(sportblog.per_target[&t("nike.com")].backlinks, 40);
    }

    #[test]
    fn test_single_coverage_sorted_after_higher_coverage_despite_volume() {
        let results = intersect(&sportswear());
        let order: Vec<_> = results.iter().map(|r| r.referring_domain.as_str()).collect();
        assert_eq!(order, vec!["runningmagazine.com", "sportblog.fr", "sneakernews.com"]);
    }

    #[test]
    fn test_ties_broken_by_backlinks_then_domain() {
        let mut map = BTreeMap::new();
        map.insert(
            t("nike.com"),
            vec![
                link("b-site.com", "nike.com", 10),
                link("a-site.com", "nike.com", 10),
                link("c-site.com", "nike.com", 20),
            ],
        );
        let order: Vec<_> = intersect(&map).into_iter().map(|r| r.referring_domain).collect();
        assert_eq!(order, vec!["c-site.com", "a-site.com", "b-site.com"]);
    }

    #[test]
    fn test_zero_backlink_rows_are_discarded() {
        let mut map = BTreeMap::new();
        map.insert(t("nike.com"), vec![link("irrelevant.com", "nike.com", 0)]);
        map.insert(t("adidas.com"), vec![link("irrelevant.com", "adidas.com", 0)]);
        assert!(intersect(&map).is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(intersect(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_duplicate_rows_fold_and_domains_normalize() {
        let mut map = BTreeMap::new();
        map.insert(
            t("nike.com"),
            vec![
                link("SportBlog.fr", "nike.com", 4),
                link("sportblog.fr ", "nike.com", 6),
            ],
        );
        let results = intersect(&map);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].referring_domain, "sportblog.fr");
        assert_eq!(results[0].total_backlinks, 10);
    }

    #[test]
    fn test_rank_is_maximum_seen() {
        let mut map = BTreeMap::new();
        map.insert(t("nike.com"), vec![link("blog.com", "nike.com", 1).with_rank(120)]);
        map.insert(t("adidas.com"), vec![link("blog.com", "adidas.com", 1).with_rank(300)]);
        assert_eq!(intersect(&map)[0].rank, 300);
    }

    #[test]
    fn test_query_filters_and_limits() {
        let query = IntersectionQuery {
            min_coverage: 2,
            exclude: BTreeSet::from(["runningmagazine.com".to_string()]),
            limit: Some(5),
        };
        let results = query.apply(intersect(&sportswear()));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].referring_domain, "sportblog.fr");

        let limited = IntersectionQuery {
            limit: Some(1),
            ..IntersectionQuery::default()
        };
        assert_eq!(limited.apply(intersect(&sportswear())).len(), 1);
    }

    #[test]
    fn test_opportunities_exclude_referrers_of_own_site() {
        let mut map = sportswear();
        map.insert(t("mysite.com"), vec![link("runningmagazine.com", "mysite.com", 3)]);

        let results = opportunities(&map, &t("mysite.com"));
        let domains: Vec<_> = results.iter().map(|r| r.referring_domain.as_str()).collect();
        assert_eq!(domains, vec!["sportblog.fr", "sneakernews.com"]);
        assert!(results.iter().all(|r| !r.links_to(&t("mysite.com"))));
    }
}
