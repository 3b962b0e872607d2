//! Keyword gap and overlap analysis
//!
//! The reference domain is "you"; the comparison domain is a competitor.
//!
//! - **Gap**: keywords the competitor ranks for and you don't (missed opportunities)
//! - **Common**: keywords you both rank for, with both positions so the caller can read
//!   the rank delta
//!
//! Keywords are joined on their trimmed, lowercased text. Only records with a known
//! position count as ranking: a gap row always carries the comparison position and a
//! common row always carries both. Both modes sort by search volume (descending), then
//! CPC (descending), then keyword (ascending).

use crate::intersection::coverage_counts;
use crate::keyword::{normalize_keyword, CompetitionLevel, KeywordRecord};
use crate::Target;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Which comparison to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GapMode {
    /// Comparison ranks, reference does not
    Gap,
    /// Both rank
    Common,
}

impl GapMode {
    /// Mode name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            GapMode::Gap => "gap",
            GapMode::Common => "common",
        }
    }
}

/// One keyword in a gap or common result set
#[derive(Debug, Clone, PartialEq)]
pub struct GapResult {
    /// Keyword text (comparison side spelling)
    pub keyword: String,

    /// Reference position; always `None` in gap mode
    pub reference_position: Option<f64>,

    /// Comparison position
    pub comparison_position: Option<f64>,

    /// Monthly search volume
    pub volume: u64,

    /// Cost per click
    pub cpc: f64,

    /// Ranking difficulty, if known
    pub difficulty: Option<u8>,

    /// Advertiser competition level
    pub competition_level: CompetitionLevel,

    /// Mode that produced the result
    pub mode: GapMode,
}

impl GapResult {
    /// Positions the reference trails by (`reference - comparison`)
    ///
    /// Positive means the comparison domain ranks higher. `None` unless both
    /// positions are known.
    pub fn rank_delta(&self) -> Option<f64> {
        match (self.reference_position, self.comparison_position) {
            (Some(reference), Some(comparison)) => Some(reference - comparison),
            _ => None,
        }
    }

    fn key(&self) -> String {
        normalize_keyword(&self.keyword)
    }
}

/// How per-competitor gap sets are merged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Combine {
    /// Every competitor ranks for the keyword
    #[default]
    All,
    /// At least `n` competitors rank for the keyword (`AtLeast(1)` is the union)
    AtLeast(usize),
}

/// One keyword missing from the reference across several competitors
#[derive(Debug, Clone, PartialEq)]
pub struct MultiGapResult {
    /// Keyword text
    pub keyword: String,

    /// Number of competitors ranking for the keyword
    pub competitor_count: usize,

    /// Position per ranking competitor
    pub competitors: BTreeMap<Target, Option<f64>>,

    /// Highest search volume reported by any competitor
    pub volume: u64,

    /// Highest CPC reported by any competitor
    pub cpc: f64,
}

/// Disjoint keyword sets for one (reference, comparison) pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordPartition {
    /// Comparison only
    pub gap: BTreeSet<String>,
    /// Both
    pub common: BTreeSet<String>,
    /// Reference only
    pub reference_only: BTreeSet<String>,
}

impl KeywordPartition {
    /// Total number of distinct keywords
    pub fn len(&self) -> usize {
        self.gap.len() + self.common.len() + self.reference_only.len()
    }

    /// Whether no keyword was seen at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Index ranked records by join key, keeping the best-ranked record per keyword
///
/// Records without a position (missing, or `-1` upstream) are not rankings and are
/// left out.
fn index(records: &[KeywordRecord]) -> BTreeMap<String, &KeywordRecord> {
    let mut index: BTreeMap<String, &KeywordRecord> = BTreeMap::new();
    for record in records.iter().filter(|r| r.position.is_some()) {
        let key = record.key();
        if key.is_empty() {
            continue;
        }
        match index.get(&key) {
            Some(existing) if !ranks_better(record, existing) => {}
            _ => {
                index.insert(key, record);
            }
        }
    }
    index
}

/// Total preference order between duplicates so the kept record never depends on
/// input order: lower position, higher volume, higher CPC, then keyword spelling.
fn ranks_better(candidate: &KeywordRecord, existing: &KeywordRecord) -> bool {
    let by_position = match (candidate.position, existing.position) {
        (Some(c), Some(e)) => c.total_cmp(&e),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_position
        .then_with(|| existing.search_volume.cmp(&candidate.search_volume))
        .then_with(|| existing.cpc.total_cmp(&candidate.cpc))
        .then_with(|| candidate.keyword.cmp(&existing.keyword))
        == Ordering::Less
}

/// Compare a reference keyword set against one competitor
///
/// # Examples
///
/// ```
/// use rivalscope_domain::{analyze_gap, GapMode, KeywordRecord};
///
/// let mine = vec![KeywordRecord::new("chaussures running").with_position(15.0)];
/// let theirs = vec![
///     KeywordRecord::new("chaussures running").with_position(3.0),
///     KeywordRecord::new("chaussures trail femme").with_volume(1200).with_position(4.0),
/// ];
///
/// let gap = analyze_gap(&mine, &theirs, GapMode::Gap);
/// assert_eq!(gap[0].keyword, "chaussures trail femme");
///
/// let common = analyze_gap(&mine, &theirs, GapMode::Common);
/// assert_eq!(common[0].rank_delta(), Some(12.0));
/// ```
pub fn analyze_gap(reference: &[KeywordRecord], comparison: &[KeywordRecord], mode: GapMode) -> Vec<GapResult> {
    let reference_index = index(reference);
    let comparison_index = index(comparison);

    let mut results: Vec<GapResult> = comparison_index
        .iter()
        .filter_map(|(key, theirs)| {
            let mine = reference_index.get(key);
            match (mode, mine) {
                (GapMode::Gap, None) => Some(to_result(theirs, None, mode)),
                (GapMode::Common, Some(mine)) => Some(to_result(theirs, Some(mine), mode)),
                _ => None,
            }
        })
        .collect();

    results.sort_by(compare_gap);
    results
}

fn to_result(theirs: &KeywordRecord, mine: Option<&KeywordRecord>, mode: GapMode) -> GapResult {
    GapResult {
        keyword: theirs.keyword.trim().to_string(),
        reference_position: mine.and_then(|m| m.position),
        comparison_position: theirs.position,
        volume: theirs.search_volume,
        cpc: theirs.cpc,
        difficulty: theirs.difficulty,
        competition_level: theirs.competition_level,
        mode,
    }
}

fn compare_gap(a: &GapResult, b: &GapResult) -> Ordering {
    b.volume
        .cmp(&a.volume)
        .then_with(|| b.cpc.total_cmp(&a.cpc))
        .then_with(|| a.key().cmp(&b.key()))
}

/// Split the union of both ranked keyword sets into gap, common and reference-only
pub fn partition(reference: &[KeywordRecord], comparison: &[KeywordRecord]) -> KeywordPartition {
    let mine: BTreeSet<String> = index(reference).into_keys().collect();
    let theirs: BTreeSet<String> = index(comparison).into_keys().collect();

    KeywordPartition {
        gap: theirs.difference(&mine).cloned().collect(),
        common: theirs.intersection(&mine).cloned().collect(),
        reference_only: mine.difference(&theirs).cloned().collect(),
    }
}

/// Gap keywords shared across several competitors
///
/// Runs [`analyze_gap`] against each competitor independently, then merges the gap
/// sets with the same coverage primitive the backlink intersection uses. With
/// [`Combine::All`] only keywords every competitor ranks for survive ("they all rank
/// here, I don't"). Results sort by competitor count, volume, CPC (all descending) and
/// keyword (ascending).
pub fn multi_competitor_gap(
    reference: &[KeywordRecord],
    competitors: &BTreeMap<Target, Vec<KeywordRecord>>,
    combine: Combine,
) -> Vec<MultiGapResult> {
    if competitors.is_empty() {
        return Vec::new();
    }

    let threshold = match combine {
        Combine::All => competitors.len(),
        Combine::AtLeast(n) => n.clamp(1, competitors.len()),
    };

    let per_competitor: BTreeMap<Target, BTreeMap<String, GapResult>> = competitors
        .iter()
        .map(|(target, records)| {
            let gaps = analyze_gap(reference, records, GapMode::Gap)
                .into_iter()
                .map(|gap| (gap.key(), gap))
                .collect();
            (target.clone(), gaps)
        })
        .collect();

    let sets: BTreeMap<Target, BTreeSet<String>> = per_competitor
        .iter()
        .map(|(target, gaps)| (target.clone(), gaps.keys().cloned().collect()))
        .collect();

    let mut results: Vec<MultiGapResult> = coverage_counts(&sets)
        .into_iter()
        .filter(|(_, ranking)| ranking.len() >= threshold)
        .filter_map(|(key, ranking)| {
            let hits: Vec<(&Target, &GapResult)> = ranking
                .iter()
                .filter_map(|target| per_competitor.get(target)?.get(&key).map(|gap| (target, gap)))
                .collect();
            let (_, first) = hits.first()?;

            Some(MultiGapResult {
                keyword: first.keyword.clone(),
                competitor_count: hits.len(),
                competitors: hits
                    .iter()
                    .map(|(target, gap)| ((*target).clone(), gap.comparison_position))
                    .collect(),
                volume: hits.iter().map(|(_, gap)| gap.volume).max().unwrap_or_default(),
                cpc: hits.iter().map(|(_, gap)| gap.cpc).fold(0.0, f64::max),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.competitor_count
            .cmp(&a.competitor_count)
            .then_with(|| b.volume.cmp(&a.volume))
            .then_with(|| b.cpc.total_cmp(&a.cpc))
            .then_with(|| normalize_keyword(&a.keyword).cmp(&normalize_keyword(&b.keyword)))
    });
    results
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_records() -> impl Strategy<Value = Vec<KeywordRecord>> {
        let row = ("[a-f]{1,3}", 0u64..1000, 0u32..500, prop::option::weighted(0.8, 1u32..100));
        prop::collection::vec(row, 0..40).prop_map(|rows| {
            rows.into_iter()
                .map(|(keyword, volume, cents, position)| {
                    let record = KeywordRecord::new(keyword)
                        .with_volume(volume)
                        .with_cpc(cents as f64 / 100.0);
                    match position {
                        Some(position) => record.with_position(position as f64),
                        None => record,
                    }
                })
                .collect()
        })
    }

    fn shuffled(records: &[KeywordRecord], seed: u64) -> Vec<KeywordRecord> {
        let mut shuffled = records.to_vec();
        // Deterministic Fisher-Yates driven by the seed
        let mut state = seed | 1;
        for i in (1..shuffled.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            shuffled.swap(i, j);
        }
        shuffled
    }

    proptest! {
        /// Property: gap, common and reference-only partition the union of keywords
        #[test]
        fn test_gap_common_partition(reference in arb_records(), comparison in arb_records()) {
            let gap: BTreeSet<String> = analyze_gap(&reference, &comparison, GapMode::Gap)
                .iter().map(GapResult::key).collect();
            let common: BTreeSet<String> = analyze_gap(&reference, &comparison, GapMode::Common)
                .iter().map(GapResult::key).collect();
            let parts = partition(&reference, &comparison);

            prop_assert_eq!(&gap, &parts.gap);
            prop_assert_eq!(&common, &parts.common);
            prop_assert!(gap.is_disjoint(&common));
            prop_assert!(gap.is_disjoint(&parts.reference_only));
            prop_assert!(common.is_disjoint(&parts.reference_only));

            let union: BTreeSet<String> = reference.iter().chain(comparison.iter())
                .filter(|r| r.position.is_some())
                .map(KeywordRecord::key).collect();
            prop_assert_eq!(parts.len(), union.len());
        }

        /// Property: identical input gives identical output, whatever the row order
        #[test]
        fn test_gap_deterministic(
            reference in arb_records(),
            comparison in arb_records(),
            seed in any::<u64>(),
        ) {
            for mode in [GapMode::Gap, GapMode::Common] {
                let expected = analyze_gap(&reference, &comparison, mode);
                let permuted = analyze_gap(&shuffled(&reference, seed), &shuffled(&comparison, seed.rotate_left(17)), mode);
                prop_assert_eq!(expected, permuted);
            }
        }

        /// Property: gap rows carry exactly the comparison position, common rows both
        #[test]
        fn test_gap_reference_absent(reference in arb_records(), comparison in arb_records()) {
            for result in analyze_gap(&reference, &comparison, GapMode::Gap) {
                prop_assert!(result.reference_position.is_none());
                prop_assert!(result.comparison_position.is_some());
            }
            for result in analyze_gap(&reference, &comparison, GapMode::Common) {
                prop_assert!(result.reference_position.is_some());
                prop_assert!(result.comparison_position.is_some());
            }
        }
    }
}
