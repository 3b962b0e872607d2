//! Command implementations.

pub mod backlinks;
pub mod config;
pub mod keywords;

pub use self::backlinks::{execute_backlinks, execute_opportunities};
pub use self::config::execute_config;
pub use self::keywords::{execute_competitors_gap, execute_gap, execute_related};

use crate::error::{CliError, Result};
use rivalscope_domain::Condition;
use rivalscope_engine::EngineConfig;

/// Parse `--filter` expressions into conditions.
///
/// Only the syntax is checked here; unknown fields and mistyped values are dropped
/// later, with a warning, while the remaining conditions still apply.
pub fn parse_filters(raw: &[String]) -> Result<Vec<Condition>> {
    raw.iter()
        .map(|expr| {
            Condition::parse(expr)
                .ok_or_else(|| CliError::InvalidInput(format!("Cannot parse filter '{}'", expr)))
        })
        .collect()
}

/// Engine configuration with per-command overrides applied.
pub fn with_overrides(
    base: &EngineConfig,
    min_coverage: Option<usize>,
    limit: Option<usize>,
    at_least: Option<usize>,
) -> Result<EngineConfig> {
    let mut config = base.clone();
    if let Some(min_coverage) = min_coverage {
        config.min_coverage = min_coverage;
    }
    if let Some(limit) = limit {
        config.result_limit = limit;
    }
    if let Some(at_least) = at_least {
        config.combine_all = false;
        config.at_least = at_least;
    }
    config.validate().map_err(CliError::InvalidInput)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivalscope_domain::FilterOperator;

    #[test]
    fn test_parse_filters() {
        let filters = parse_filters(&["search_volume>=1000".to_string(), "keyword like %trail%".to_string()]).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].operator, FilterOperator::Gte);
        assert_eq!(filters[1].operator, FilterOperator::Like);
    }

    #[test]
    fn test_unparseable_filter() {
        let result = parse_filters(&["search_volume".to_string()]);
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_overrides() {
        let base = EngineConfig::default();
        let config = with_overrides(&base, Some(2), Some(10), Some(1)).unwrap();
        assert_eq!(config.min_coverage, 2);
        assert_eq!(config.result_limit, 10);
        assert!(!config.combine_all);

        let unchanged = with_overrides(&base, None, None, None).unwrap();
        assert_eq!(unchanged, base);

        assert!(with_overrides(&base, Some(0), None, None).is_err());
    }
}
