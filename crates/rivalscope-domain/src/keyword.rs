//! Keyword records - canonical keyword ranking data

use std::collections::BTreeSet;
use std::fmt;

/// Advertiser competition level reported for a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CompetitionLevel {
    /// Few advertisers bid on the keyword
    #[default]
    Low,

    /// Moderate advertiser competition
    Medium,

    /// Heavy advertiser competition
    High,
}

impl CompetitionLevel {
    /// Get the level as the provider spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionLevel::Low => "LOW",
            CompetitionLevel::Medium => "MEDIUM",
            CompetitionLevel::High => "HIGH",
        }
    }

    /// Parse a level from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(CompetitionLevel::Low),
            "MEDIUM" => Some(CompetitionLevel::Medium),
            "HIGH" => Some(CompetitionLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for CompetitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword ranking data in canonical shape
///
/// Produced by the response normalizer from either provider shape. Records are
/// immutable once created and live only as long as one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRecord {
    /// Keyword text as returned by the provider
    pub keyword: String,

    /// Monthly search volume
    pub search_volume: u64,

    /// Cost per click (never negative)
    pub cpc: f64,

    /// Advertiser competition level
    pub competition_level: CompetitionLevel,

    /// Ranking difficulty in [0, 100], if known
    pub difficulty: Option<u8>,

    /// Organic position of the analysed domain, if it ranks
    pub position: Option<f64>,

    /// SERP feature types shown for the keyword
    pub serp_features: BTreeSet<String>,

    /// Traversal depth (related-keyword endpoint only)
    pub depth: Option<u32>,

    /// Related keywords discovered during traversal (related-keyword endpoint only)
    pub related_keywords: Vec<String>,
}

impl KeywordRecord {
    /// Create a record with only the keyword set and every other field at its default
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            search_volume: 0,
            cpc: 0.0,
            competition_level: CompetitionLevel::default(),
            difficulty: None,
            position: None,
            serp_features: BTreeSet::new(),
            depth: None,
            related_keywords: Vec::new(),
        }
    }

    /// Set the search volume
    pub fn with_volume(mut self, search_volume: u64) -> Self {
        self.search_volume = search_volume;
        self
    }

    /// Set the cost per click, clamping negatives to zero
    pub fn with_cpc(mut self, cpc: f64) -> Self {
        self.cpc = if cpc.is_finite() { cpc.max(0.0) } else { 0.0 };
        self
    }

    /// Set the ranking position
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the difficulty, clamped to [0, 100]
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty.min(100));
        self
    }

    /// Join key: the keyword trimmed and lowercased
    ///
    /// Two records describe the same keyword (within one location and language
    /// context) exactly when their keys are equal.
    ///
    /// # Examples
    ///
    /// ```
    /// use rivalscope_domain::KeywordRecord;
    ///
    /// let a = KeywordRecord::new("  Chaussures Running ");
    /// let b = KeywordRecord::new("chaussures running");
    /// assert_eq!(a.key(), b.key());
    /// ```
    pub fn key(&self) -> String {
        normalize_keyword(&self.keyword)
    }
}

/// Normalize keyword text into its join key
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competition_level_parse() {
        assert_eq!(CompetitionLevel::parse("high"), Some(CompetitionLevel::High));
        assert_eq!(CompetitionLevel::parse(" Medium "), Some(CompetitionLevel::Medium));
        assert_eq!(CompetitionLevel::parse("LOW"), Some(CompetitionLevel::Low));
        assert_eq!(CompetitionLevel::parse("extreme"), None);
    }

    #[test]
    fn test_new_record_defaults() {
        let record = KeywordRecord::new("trail");
        assert_eq!(record.search_volume, 0);
        assert_eq!(record.cpc, 0.0);
        assert_eq!(record.competition_level, CompetitionLevel::Low);
        assert!(record.position.is_none());
        assert!(record.serp_features.is_empty());
    }

    #[test]
    fn test_cpc_never_negative() {
        assert_eq!(KeywordRecord::new("a").with_cpc(-1.5).cpc, 0.0);
        assert_eq!(KeywordRecord::new("a").with_cpc(f64::NAN).cpc, 0.0);
        assert_eq!(KeywordRecord::new("a").with_cpc(0.42).cpc, 0.42);
    }

    #[test]
    fn test_difficulty_clamped() {
        assert_eq!(KeywordRecord::new("a").with_difficulty(250).difficulty, Some(100));
    }

    #[test]
    fn test_key_is_case_and_whitespace_insensitive() {
        assert_eq!(KeywordRecord::new("\tNike Air ").key(), "nike air");
    }
}
