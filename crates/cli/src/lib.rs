pub mod commands;

use std::process::ExitCode;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use stoktakip_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "stoktakip",
    about = "Stock demand classification and replenishment suggestions",
    long_about = "Classify each product's demand pattern from its movement history and suggest how much to reorder.",
    after_help = "Examples:\n  stoktakip migrate\n  stoktakip seed\n  stoktakip analyze --now 2025-06-30 --json\n  stoktakip config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo inventory (one product per demand category)")]
    Seed,
    #[command(about = "Classify products and suggest replenishment quantities")]
    Analyze {
        #[arg(long, help = "Reference date (YYYY-MM-DD); defaults to today")]
        now: Option<NaiveDate>,
        #[arg(long, help = "Analyse a single product code")]
        product: Option<String>,
        #[arg(long, help = "Override analysis.window_months for this run")]
        window_months: Option<u32>,
        #[arg(long, help = "Emit the full report as JSON")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        if let Err(error) = init_logging(&config.logging) {
            eprintln!("{error:#}");
        }
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Analyze { now, product, window_months, json } => {
            commands::analyze::run(commands::analyze::AnalyzeArgs {
                now,
                product,
                window_months,
                json,
            })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Logs go to stderr so stdout stays
/// parseable. `RUST_LOG` wins over the configured level when set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.trim()))
        .map_err(|error| anyhow!("invalid log level `{}`: {error}", config.level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
