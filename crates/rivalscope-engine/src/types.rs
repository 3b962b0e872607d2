//! Report types returned by the analyzer

use rivalscope_domain::{Combine, GapMode, GapResult, IntersectionResult, MultiGapResult, Target};
use rivalscope_provider::ProviderError;
use std::collections::BTreeMap;

/// How much of a multi-target fetch succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every target returned data
    Complete,
    /// Some targets failed; results cover the rest
    Partial,
    /// Every target failed; results are empty
    AllFailed,
}

impl Outcome {
    /// Outcome name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Complete => "complete",
            Outcome::Partial => "partial",
            Outcome::AllFailed => "all_failed",
        }
    }
}

/// Per-target results of a concurrent fetch
#[derive(Debug)]
pub struct MultiFetch<T> {
    /// Targets that returned data
    pub succeeded: BTreeMap<Target, T>,

    /// Targets that failed, with the reason
    pub failed: BTreeMap<Target, ProviderError>,
}

impl<T> Default for MultiFetch<T> {
    fn default() -> Self {
        Self {
            succeeded: BTreeMap::new(),
            failed: BTreeMap::new(),
        }
    }
}

impl<T> MultiFetch<T> {
    /// Classify the fetch
    pub fn outcome(&self) -> Outcome {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (_, true) => Outcome::Complete,
            (false, false) => Outcome::Partial,
            (true, false) => Outcome::AllFailed,
        }
    }

    /// Remove one target's result, keeping the rest
    pub fn take(&mut self, target: &Target) -> Option<Result<T, ProviderError>> {
        if let Some(value) = self.succeeded.remove(target) {
            return Some(Ok(value));
        }
        self.failed.remove(target).map(Err)
    }
}

/// Shared referring domains across targets
#[derive(Debug)]
pub struct BacklinkReport {
    /// Targets analysed (own site excluded in opportunity mode)
    pub targets: Vec<Target>,

    /// Own site, in opportunity mode
    pub own_site: Option<Target>,

    /// Referring domains, sorted by coverage, then backlinks, then name
    pub results: Vec<IntersectionResult>,

    /// Targets whose fetch failed
    pub failed_targets: BTreeMap<Target, ProviderError>,

    /// Fetch classification
    pub outcome: Outcome,
}

/// Keyword gap or overlap between two domains
#[derive(Debug)]
pub struct GapReport {
    /// Domain being improved
    pub reference: Target,

    /// Domain compared against
    pub competitor: Target,

    /// Gap or common
    pub mode: GapMode,

    /// Keywords, sorted by volume, then CPC, then keyword
    pub results: Vec<GapResult>,

    /// Targets whose fetch failed
    pub failed_targets: BTreeMap<Target, ProviderError>,

    /// Fetch classification over the competitor side
    pub outcome: Outcome,
}

/// Keywords missing from the reference across several competitors
#[derive(Debug)]
pub struct MultiGapReport {
    /// Domain being improved
    pub reference: Target,

    /// Competitors requested
    pub competitors: Vec<Target>,

    /// Rule used to merge per-competitor gaps
    pub combine: Combine,

    /// Keywords, sorted by competitor count, then volume, then CPC, then keyword
    pub results: Vec<MultiGapResult>,

    /// Competitors whose fetch failed
    pub failed_targets: BTreeMap<Target, ProviderError>,

    /// Fetch classification over the competitors
    pub outcome: Outcome,
}
