//! Backlink referrer records

use crate::Target;

/// One referring domain's links to one target
///
/// Identity is the `(referring_domain, target_domain)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkReferrerRecord {
    /// Domain the links come from
    pub referring_domain: String,

    /// Provider authority rank of the referring domain
    pub rank: u64,

    /// Number of backlinks pointing at the target
    pub backlinks_to_target: u64,

    /// Number of distinct referring pages pointing at the target
    pub referring_pages_to_target: u64,

    /// Target the links point to
    pub target_domain: Target,
}

impl BacklinkReferrerRecord {
    /// Create a record with zero counts
    pub fn new(referring_domain: impl Into<String>, target_domain: Target) -> Self {
        Self {
            referring_domain: referring_domain.into(),
            rank: 0,
            backlinks_to_target: 0,
            referring_pages_to_target: 0,
            target_domain,
        }
    }

    /// Set backlink and referring page counts
    pub fn with_links(mut self, backlinks: u64, referring_pages: u64) -> Self {
        self.backlinks_to_target = backlinks;
        self.referring_pages_to_target = referring_pages;
        self
    }

    /// Set the authority rank
    pub fn with_rank(mut self, rank: u64) -> Self {
        self.rank = rank;
        self
    }

    /// Referring domain normalized for grouping
    pub fn referrer_key(&self) -> String {
        self.referring_domain.trim().trim_end_matches('.').to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let target = Target::parse("nike.com").unwrap();
        let record = BacklinkReferrerRecord::new("runningmagazine.com", target.clone())
            .with_links(12, 4)
            .with_rank(310);

        assert_eq!(record.backlinks_to_target, 12);
        assert_eq!(record.referring_pages_to_target, 4);
        assert_eq!(record.rank, 310);
        assert_eq!(record.target_domain, target);
    }

    #[test]
    fn test_referrer_key() {
        let target = Target::parse("nike.com").unwrap();
        let record = BacklinkReferrerRecord::new(" SportBlog.FR. ", target);
        assert_eq!(record.referrer_key(), "sportblog.fr");
    }
}
