// src/pipeline/poll.rs

//! Outlet polling pipeline.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, OutletCache, Report, Station};
use crate::services::{OutletFetcher, VendorApi, assemble};
use crate::storage::ReportStorage;
use crate::utils::http::Transport;

/// Run one poll: fetch every outlet, assemble the report and persist it.
///
/// Only a bad station directory or a failed write is an error; fetch
/// failures end up in the report's status and counters.
pub async fn run_poller(
    config: &Config,
    transport: Arc<dyn Transport>,
    storage: &dyn ReportStorage,
) -> Result<Report> {
    let start_time = Utc::now();
    log::info!("Outlet poller starting...");

    let stations = Station::load_all(&config.paths.stations_file)?;
    log::info!(
        "Loaded {} stations in {} areas",
        stations.len(),
        Station::areas(&stations).len()
    );

    let cache = match &config.paths.outlet_cache {
        Some(path) => storage.load_outlet_cache(Path::new(path)).await,
        None => OutletCache::default(),
    };

    let fetcher = OutletFetcher::new(VendorApi::new(transport, &config.vendor));
    let outcome = fetcher.fetch_all(&stations, &cache).await;

    let report = assemble(&stations, outcome.reports.clone(), outcome.stats.clone(), start_time);
    let meta = storage.write_run(&report, &outcome.reports, start_time).await?;
    log::debug!(
        "Wrote {} outlets for run at {} (snapshot: {})",
        meta.outlet_count,
        meta.timestamp,
        meta.snapshot.as_deref().unwrap_or("none")
    );

    if let Some(path) = &config.paths.outlet_cache {
        if outcome.stats.alive && !outcome.outlet_index.is_empty() {
            refresh_cache(storage, Path::new(path), cache, outcome.outlet_index).await?;
        }
    }

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Poll finished in {}ms: status {:?}, {} outlets, {} failures",
        elapsed.num_milliseconds(),
        report.status,
        report.outlet_count(),
        report.stats.failures()
    );

    Ok(report)
}

async fn refresh_cache(
    storage: &dyn ReportStorage,
    path: &Path,
    mut cache: OutletCache,
    fresh: OutletCache,
) -> Result<()> {
    cache.merge(fresh);
    storage.save_outlet_cache(path, &cache).await
}

/// Probe the session without fetching anything else.
pub async fn run_check(config: &Config, transport: Arc<dyn Transport>) -> Result<()> {
    let fetcher = OutletFetcher::new(VendorApi::new(transport, &config.vendor));
    if fetcher.check_alive().await {
        log::info!("Session is alive");
        Ok(())
    } else {
        Err(AppError::LivenessCheckFailed)
    }
}

/// Validate the configuration and the station directory.
pub fn run_validate(config: &Config) -> Result<Vec<Station>> {
    config.validate()?;
    log::info!("✓ Config OK");

    let stations = Station::load_all(&config.paths.stations_file)?;
    log::info!(
        "✓ Stations OK ({} stations: {})",
        stations.len(),
        Station::areas(&stations).join(", ")
    );
    Ok(stations)
}
