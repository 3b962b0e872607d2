//! Backlink intersection and link opportunity commands.

use crate::cli::{BacklinksArgs, OpportunitiesArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rivalscope_domain::SeoDataSource;
use rivalscope_engine::{BacklinkReport, CompetitiveAnalyzer, Outcome};
use rivalscope_provider::ProviderError;

/// Execute the backlinks command.
pub async fn execute_backlinks<S>(
    args: BacklinksArgs,
    analyzer: &CompetitiveAnalyzer<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: SeoDataSource<Error = ProviderError>,
{
    let report = analyzer.backlink_intersection(&args.targets).await?;
    print_report(&report, formatter)
}

/// Execute the opportunities command.
pub async fn execute_opportunities<S>(
    args: OpportunitiesArgs,
    analyzer: &CompetitiveAnalyzer<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: SeoDataSource<Error = ProviderError>,
{
    let report = analyzer.link_opportunities(&args.own_site, &args.competitors).await?;
    print_report(&report, formatter)
}

fn print_report(report: &BacklinkReport, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_backlinks(report)?);
    if report.outcome == Outcome::AllFailed {
        return Err(CliError::AllTargetsFailed);
    }
    Ok(())
}
