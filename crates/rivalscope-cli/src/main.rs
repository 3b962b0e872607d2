//! Rivalscope CLI - Command-line interface for competitive SEO analysis.

use clap::Parser;
use rivalscope_cli::commands;
use rivalscope_cli::{Cli, CliError, Command, Config, Formatter};
use rivalscope_domain::GapMode;
use rivalscope_engine::{CompetitiveAnalyzer, EngineConfig};
use rivalscope_provider::DataForSeoClient;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> rivalscope_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = Config::resolve_path(cli.config.as_deref())?;
    let mut config = Config::load_from(&path)?;
    config.apply_credentials(cli.login, cli.password);
    debug!(path = %path.display(), "Configuration loaded");

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    // Ctrl-C cancels every in-flight request
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling requests");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Config(args) => {
            commands::execute_config(args, &config, &path, &formatter)?;
        }
        Command::Backlinks(args) => {
            let engine = commands::with_overrides(&config.engine, args.coverage.min_coverage, args.coverage.limit, None)?;
            let analyzer = build_analyzer(&config, engine, &cancel)?;
            commands::execute_backlinks(args, &analyzer, &formatter).await?;
        }
        Command::Opportunities(args) => {
            let engine = commands::with_overrides(&config.engine, args.coverage.min_coverage, args.coverage.limit, None)?;
            let analyzer = build_analyzer(&config, engine, &cancel)?;
            commands::execute_opportunities(args, &analyzer, &formatter).await?;
        }
        Command::Gap(args) => {
            let engine = commands::with_overrides(&config.engine, None, args.limit, None)?;
            let analyzer = build_analyzer(&config, engine, &cancel)?;
            commands::execute_gap(args, GapMode::Gap, &analyzer, &formatter).await?;
        }
        Command::Common(args) => {
            let engine = commands::with_overrides(&config.engine, None, args.limit, None)?;
            let analyzer = build_analyzer(&config, engine, &cancel)?;
            commands::execute_gap(args, GapMode::Common, &analyzer, &formatter).await?;
        }
        Command::CompetitorsGap(args) => {
            let engine = commands::with_overrides(&config.engine, None, args.limit, args.at_least)?;
            let analyzer = build_analyzer(&config, engine, &cancel)?;
            commands::execute_competitors_gap(args, &analyzer, &formatter).await?;
        }
        Command::Related(args) => {
            let engine = commands::with_overrides(&config.engine, None, args.limit, None)?;
            let analyzer = build_analyzer(&config, engine, &cancel)?;
            commands::execute_related(args, &analyzer, &formatter).await?;
        }
    }

    Ok(())
}

fn build_analyzer(
    config: &Config,
    engine: EngineConfig,
    cancel: &CancellationToken,
) -> rivalscope_cli::Result<CompetitiveAnalyzer<DataForSeoClient>> {
    if !config.provider.has_credentials() {
        return Err(CliError::MissingCredentials);
    }

    let client = DataForSeoClient::new(config.provider.clone())?.with_cancellation(cancel.clone());
    Ok(CompetitiveAnalyzer::new(client, engine)?)
}

/// Log to stderr; RUST_LOG wins over -v
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
