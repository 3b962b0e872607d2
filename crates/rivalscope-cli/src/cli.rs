//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};

/// Rivalscope CLI - Competitive keyword and backlink analysis.
#[derive(Debug, Parser)]
#[command(name = "rivalscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Provider login
    #[arg(long, env = "RIVALSCOPE_LOGIN", global = true, hide_env_values = true)]
    pub login: Option<String>,

    /// Provider password
    #[arg(long, env = "RIVALSCOPE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Referring domains shared by up to five sites
    Backlinks(BacklinksArgs),

    /// Referring domains that link to competitors but not to your site
    Opportunities(OpportunitiesArgs),

    /// Keywords a competitor ranks for that your site does not
    Gap(CompareArgs),

    /// Keywords both sites rank for, with position deltas
    Common(CompareArgs),

    /// Keywords several competitors rank for that your site does not
    CompetitorsGap(CompetitorsGapArgs),

    /// Keywords related to a seed keyword
    Related(RelatedArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Result size and coverage overrides shared by the backlink commands.
#[derive(Debug, Args)]
pub struct CoverageArgs {
    /// Minimum number of sites a referrer must link to
    #[arg(short = 'm', long)]
    pub min_coverage: Option<usize>,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the backlinks command.
#[derive(Debug, Parser)]
pub struct BacklinksArgs {
    /// Domains to intersect (at most five)
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,

    #[command(flatten)]
    pub coverage: CoverageArgs,
}

/// Arguments for the opportunities command.
#[derive(Debug, Parser)]
pub struct OpportunitiesArgs {
    /// Your own domain
    pub own_site: String,

    /// Competitor domains (at most four)
    #[arg(required = true, num_args = 1..)]
    pub competitors: Vec<String>,

    #[command(flatten)]
    pub coverage: CoverageArgs,
}

/// Arguments for the gap and common commands.
#[derive(Debug, Parser)]
pub struct CompareArgs {
    /// Your own domain
    pub reference: String,

    /// Competitor domain
    pub competitor: String,

    /// Filter on competitor keywords, e.g. "search_volume>=1000" (repeatable)
    #[arg(long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the competitors-gap command.
#[derive(Debug, Parser)]
pub struct CompetitorsGapArgs {
    /// Your own domain
    pub reference: String,

    /// Competitor domains (at most four)
    #[arg(required = true, num_args = 1..)]
    pub competitors: Vec<String>,

    /// Keep keywords ranked by at least N competitors instead of all of them
    #[arg(short, long)]
    pub at_least: Option<usize>,

    /// Filter on competitor keywords (repeatable)
    #[arg(long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the related command.
#[derive(Debug, Parser)]
pub struct RelatedArgs {
    /// Seed keyword
    pub keyword: String,

    /// Traversal depth (0-4)
    #[arg(short, long, default_value = "1")]
    pub depth: u32,

    /// Filter on related keywords (repeatable)
    #[arg(long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for config management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (password masked)
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlinks_command() {
        let cli = Cli::parse_from(["rivalscope", "backlinks", "nike.com", "adidas.com", "-m", "2"]);
        match cli.command {
            Command::Backlinks(args) => {
                assert_eq!(args.targets, vec!["nike.com", "adidas.com"]);
                assert_eq!(args.coverage.min_coverage, Some(2));
                assert_eq!(args.coverage.limit, None);
            }
            _ => panic!("Expected Backlinks command"),
        }
    }

    #[test]
    fn test_backlinks_requires_targets() {
        assert!(Cli::try_parse_from(["rivalscope", "backlinks"]).is_err());
    }

    #[test]
    fn test_gap_with_filters() {
        let cli = Cli::parse_from([
            "rivalscope",
            "gap",
            "mysite.fr",
            "competitor.fr",
            "--filter",
            "search_volume>=1000",
            "--filter",
            "keyword like %trail%",
        ]);
        match cli.command {
            Command::Gap(args) => {
                assert_eq!(args.reference, "mysite.fr");
                assert_eq!(args.filters.len(), 2);
            }
            _ => panic!("Expected Gap command"),
        }
    }

    #[test]
    fn test_competitors_gap_command() {
        let cli = Cli::parse_from([
            "rivalscope",
            "competitors-gap",
            "mysite.fr",
            "a.fr",
            "b.fr",
            "--at-least",
            "1",
        ]);
        match cli.command {
            Command::CompetitorsGap(args) => {
                assert_eq!(args.competitors, vec!["a.fr", "b.fr"]);
                assert_eq!(args.at_least, Some(1));
            }
            _ => panic!("Expected CompetitorsGap command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["rivalscope", "related", "running shoes", "-vv", "--format", "json", "--no-color"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.no_color);
        match cli.command {
            Command::Related(args) => assert_eq!(args.depth, 1),
            _ => panic!("Expected Related command"),
        }
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["rivalscope", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { force: true }
            })
        ));
    }
}
