//! chargewatch CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use chargewatch::{
    error::Result,
    models::{Config, LoggingConfig, OutletStatus},
    pipeline,
    storage::{LocalStorage, ReportStorage},
    utils::http::HttpTransport,
};
use clap::{Parser, Subcommand};

/// chargewatch - Charging Outlet Poller
#[derive(Parser, Debug)]
#[command(
    name = "chargewatch",
    version,
    about = "Polls charging-station outlets and reports when they free up"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "chargewatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every outlet and write the report
    Run,

    /// Only check whether the vendor session is alive
    Check,

    /// Validate configuration and station directory
    Validate,

    /// Show the last written report
    Info,
}

/// Initialize logging. `RUST_LOG` wins over `level`; verbose forces debug.
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Parsed before logging starts, since the file supplies the default level.
    let loaded = Config::load_if_present(&cli.config);
    let level = match &loaded {
        Ok(Some(config)) => config.logging.level.clone(),
        _ => LoggingConfig::default().level,
    };
    init_logging(&level, cli.verbose);

    let mut config = match loaded {
        Ok(Some(config)) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Ok(None) => {
            log::warn!(
                "No configuration at {}. Using defaults.",
                cli.config.display()
            );
            Config::default()
        }
        Err(e) => {
            log::error!("Cannot load configuration from {}: {}", cli.config.display(), e);
            return Err(e);
        }
    };
    config.apply_env();

    let storage = LocalStorage::new(&config.paths.output_dir);

    match cli.command {
        Command::Run => {
            config.validate()?;
            let transport = Arc::new(HttpTransport::new(&config.vendor)?);
            let report = pipeline::run_poller(&config, transport, &storage).await?;

            log::info!("Updated at {}", report.updated_at);
            for group in &report.groups {
                let free = group
                    .outlets
                    .iter()
                    .filter(|o| o.status == OutletStatus::Available.label())
                    .count();
                log::info!(
                    "  {}: {} outlets, {} free",
                    group.area,
                    group.outlets.len(),
                    free
                );
            }
        }

        Command::Check => {
            config.validate()?;
            let transport = Arc::new(HttpTransport::new(&config.vendor)?);
            if let Err(e) = pipeline::run_check(&config, transport).await {
                log::error!("{}", e);
                return Err(e);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = pipeline::run_validate(&config) {
                log::error!("Validation failed: {}", e);
                return Err(e);
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Output directory: {}", storage.root().display());

            match storage.load_report().await? {
                Some(report) => {
                    if let Some(updated) = report.get("updatedAt") {
                        log::info!("Last updated: {}", updated);
                    }
                    if let Some(status) = report.get("status") {
                        log::info!("Status: {}", status);
                    }
                }
                None => log::info!("No report found yet."),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
