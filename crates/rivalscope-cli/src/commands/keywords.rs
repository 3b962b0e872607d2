//! Keyword gap, multi-competitor gap and related keyword commands.

use super::parse_filters;
use crate::cli::{CompareArgs, CompetitorsGapArgs, RelatedArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rivalscope_domain::{GapMode, SeoDataSource};
use rivalscope_engine::{CompetitiveAnalyzer, Outcome};
use rivalscope_provider::ProviderError;

/// Execute the gap or common command.
pub async fn execute_gap<S>(
    args: CompareArgs,
    mode: GapMode,
    analyzer: &CompetitiveAnalyzer<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: SeoDataSource<Error = ProviderError>,
{
    let conditions = parse_filters(&args.filters)?;
    let report = analyzer
        .keyword_gap(&args.reference, &args.competitor, mode, &conditions)
        .await?;

    println!("{}", formatter.format_gap(&report)?);
    if report.outcome == Outcome::AllFailed {
        return Err(CliError::AllTargetsFailed);
    }
    Ok(())
}

/// Execute the competitors-gap command.
pub async fn execute_competitors_gap<S>(
    args: CompetitorsGapArgs,
    analyzer: &CompetitiveAnalyzer<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: SeoDataSource<Error = ProviderError>,
{
    let conditions = parse_filters(&args.filters)?;
    // The combine rule comes from the analyzer config, which already carries --at-least
    let report = analyzer
        .multi_competitor_gap(&args.reference, &args.competitors, None, &conditions)
        .await?;

    println!("{}", formatter.format_multi_gap(&report)?);
    if report.outcome == Outcome::AllFailed {
        return Err(CliError::AllTargetsFailed);
    }
    Ok(())
}

/// Execute the related command.
pub async fn execute_related<S>(
    args: RelatedArgs,
    analyzer: &CompetitiveAnalyzer<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: SeoDataSource<Error = ProviderError>,
{
    let conditions = parse_filters(&args.filters)?;
    let records = analyzer
        .related_keywords(&args.keyword, args.depth, &conditions)
        .await?;

    println!("{}", formatter.format_keywords(&records)?);
    Ok(())
}
