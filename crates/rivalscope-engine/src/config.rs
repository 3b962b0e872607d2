//! Configuration for the analysis engine

use rivalscope_domain::{Combine, MAX_TARGETS};
use serde::{Deserialize, Serialize};

/// Configuration for the CompetitiveAnalyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum number of targets a referrer must link to
    pub min_coverage: usize,

    /// Maximum rows in a report
    pub result_limit: usize,

    /// Multi-competitor gap keeps only keywords every competitor ranks for
    pub combine_all: bool,

    /// Competitor threshold used when `combine_all` is false
    pub at_least: usize,

    /// Records requested per target; a keyword comparison always reads the reference in full
    pub fetch_limit: usize,
}

impl EngineConfig {
    /// Combination rule for multi-competitor gaps
    pub fn combine(&self) -> Combine {
        if self.combine_all {
            Combine::All
        } else {
            Combine::AtLeast(self.at_least)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_coverage == 0 || self.min_coverage > MAX_TARGETS {
            return Err(format!(
                "min_coverage must be between 1 and {}",
                MAX_TARGETS
            ));
        }
        if self.result_limit == 0 {
            return Err("result_limit must be greater than 0".to_string());
        }
        if self.at_least == 0 {
            return Err("at_least must be greater than 0".to_string());
        }
        if self.fetch_limit == 0 {
            return Err("fetch_limit must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            min_coverage: 1,
            result_limit: 100,
            combine_all: true,
            at_least: 2,
            fetch_limit: 1000,
        }
    }
}

impl EngineConfig {
    /// Aggressive preset: only overlap shared by several targets, short reports
    pub fn aggressive() -> Self {
        Self {
            min_coverage: 2,
            result_limit: 25,
            combine_all: true,
            at_least: 2,
            fetch_limit: 500,
        }
    }

    /// Lenient preset: every overlap, long reports, union of competitor gaps
    pub fn lenient() -> Self {
        Self {
            min_coverage: 1,
            result_limit: 1000,
            combine_all: false,
            at_least: 1,
            fetch_limit: 5000,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
