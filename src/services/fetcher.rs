// src/services/fetcher.rs

//! Outlet fetch orchestrator.
//!
//! Fans out in two levels: one task per station for the outlet list, then
//! one spawned task per outlet for its detail, joined with `join_all`.
//! Detail tasks of a station start as soon as its list arrives, independent
//! of the other stations. Every failure is contained in its own task and
//! only shows up in the counters.

use futures::future::join_all;
use tokio::task::JoinSet;

use crate::models::{CachedOutlet, FetchStats, OutletCache, OutletRef, OutletReport, Station};
use crate::services::normalize::normalize;
use crate::services::sink::ResultSink;
use crate::services::vendor::VendorApi;

/// Everything a fetch run produced.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Normalized reports, in completion order
    pub reports: Vec<OutletReport>,
    pub stats: FetchStats,
    /// Outlets observed in live list fetches, for refreshing the cache
    pub outlet_index: OutletCache,
}

/// Where a station's outlets came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListSource {
    Live,
    Cache,
    Failed,
}

/// Result of one station task.
#[derive(Debug)]
struct StationOutcome {
    station_id: i64,
    source: ListSource,
    live_outlets: Vec<CachedOutlet>,
    detail_total: usize,
    detail_failures: usize,
}

impl StationOutcome {
    fn failed(station_id: i64) -> Self {
        Self {
            station_id,
            source: ListSource::Failed,
            live_outlets: Vec::new(),
            detail_total: 0,
            detail_failures: 0,
        }
    }
}

/// Service for fetching the status of every outlet of a set of stations.
#[derive(Clone)]
pub struct OutletFetcher {
    api: VendorApi,
}

impl OutletFetcher {
    pub fn new(api: VendorApi) -> Self {
        Self { api }
    }

    /// Probe the session. A probe that errors counts as dead.
    pub async fn check_alive(&self) -> bool {
        match self.api.check_alive().await {
            Ok(alive) => alive,
            Err(error) => {
                log::warn!("Liveness probe failed: {}", error);
                false
            }
        }
    }

    /// Fetch and normalize every outlet of `stations`.
    ///
    /// Nothing is fetched unless the liveness probe passes first. `cache`
    /// supplies outlets for stations whose list fetch fails.
    pub async fn fetch_all(&self, stations: &[Station], cache: &OutletCache) -> FetchOutcome {
        let mut outcome = FetchOutcome {
            stats: FetchStats {
                station_total: stations.len(),
                ..FetchStats::default()
            },
            ..FetchOutcome::default()
        };

        outcome.stats.alive = self.check_alive().await;
        if !outcome.stats.alive {
            log::warn!("Session is not alive, skipping all outlet fetches");
            return outcome;
        }

        let sink = ResultSink::new();
        let mut station_tasks = JoinSet::new();
        for station in stations {
            let api = self.api.clone();
            let sink = sink.clone();
            let cached = cache.get(station.id).map(<[CachedOutlet]>::to_vec);
            station_tasks.spawn(fetch_station(api, station.clone(), cached, sink));
        }

        while let Some(joined) = station_tasks.join_next().await {
            let station = match joined {
                Ok(station) => station,
                Err(error) => {
                    outcome.stats.station_failures += 1;
                    log::warn!("Station task aborted: {}", error);
                    continue;
                }
            };

            match station.source {
                ListSource::Live => outcome
                    .outlet_index
                    .insert(station.station_id, station.live_outlets),
                ListSource::Cache => outcome.stats.station_cache_hits += 1,
                ListSource::Failed => outcome.stats.station_failures += 1,
            }
            outcome.stats.detail_total += station.detail_total;
            outcome.stats.detail_failures += station.detail_failures;
        }

        outcome.reports = sink.drain();
        log::info!(
            "Fetched {} outlets from {} stations ({} station failures, {} detail failures)",
            outcome.reports.len(),
            outcome.stats.station_total,
            outcome.stats.station_failures,
            outcome.stats.detail_failures
        );
        outcome
    }
}

/// Fetch one station's outlet list, then fan out over its outlets.
async fn fetch_station(
    api: VendorApi,
    station: Station,
    cached: Option<Vec<CachedOutlet>>,
    sink: ResultSink<OutletReport>,
) -> StationOutcome {
    let (outlets, source) = match api.fetch_outlet_list(&station).await {
        Ok(outlets) => (outlets, ListSource::Live),
        Err(error) => match cached {
            Some(cached) => {
                log::warn!(
                    "Failed to fetch outlet list of {} ({}): {}. Using {} cached outlets.",
                    station.name,
                    station.id,
                    error,
                    cached.len()
                );
                let outlets = cached
                    .into_iter()
                    .map(|c| OutletRef {
                        outlet_no: c.no,
                        name: c.name,
                        station: station.clone(),
                        hint: None,
                    })
                    .collect();
                (outlets, ListSource::Cache)
            }
            None => {
                log::warn!(
                    "Failed to fetch outlet list of {} ({}): {}",
                    station.name,
                    station.id,
                    error
                );
                return StationOutcome::failed(station.id);
            }
        },
    };

    let live_outlets = if source == ListSource::Live {
        outlets
            .iter()
            .map(|o| CachedOutlet {
                no: o.outlet_no.clone(),
                name: o.name.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let handles: Vec<_> = outlets
        .into_iter()
        .map(|outlet| {
            let api = api.clone();
            let sink = sink.clone();
            tokio::spawn(async move {
                match api.fetch_outlet_detail(&outlet).await {
                    Ok(detail) => {
                        sink.push(normalize(&outlet, &detail));
                        true
                    }
                    Err(error) => {
                        log::warn!(
                            "Failed to fetch outlet {} of {}: {}",
                            outlet.outlet_no,
                            outlet.station.name,
                            error
                        );
                        false
                    }
                }
            })
        })
        .collect();

    let detail_total = handles.len();
    let mut detail_failures = 0;
    for joined in join_all(handles).await {
        match joined {
            Ok(true) => {}
            Ok(false) => detail_failures += 1,
            Err(error) => {
                detail_failures += 1;
                log::warn!("Outlet task aborted at {}: {}", station.name, error);
            }
        }
    }

    log::debug!(
        "Station {} done: {}/{} outlets",
        station.name,
        detail_total - detail_failures,
        detail_total
    );

    StationOutcome {
        station_id: station.id,
        source,
        live_outlets,
        detail_total,
        detail_failures,
    }
}
