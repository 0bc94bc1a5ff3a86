// src/models/report.rs

//! Run-level output: the grouped report, fetch statistics and outlet cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OutletReport;

/// Overall health of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every station and outlet resolved
    Up,
    /// Some fetches failed; the report is incomplete
    Partial,
    /// Dead session or nothing resolved
    Down,
}

/// Counters collected by the fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStats {
    pub alive: bool,
    pub station_total: usize,
    pub station_failures: usize,
    /// Stations whose outlets came from the cache after a failed list fetch
    pub station_cache_hits: usize,
    pub detail_total: usize,
    pub detail_failures: usize,
}

impl FetchStats {
    pub fn failures(&self) -> usize {
        self.station_failures + self.detail_failures
    }

    /// Run status given how many reports were produced.
    pub fn run_status(&self, report_count: usize) -> RunStatus {
        if !self.alive || report_count == 0 {
            RunStatus::Down
        } else if self.failures() > 0 || self.station_cache_hits > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Up
        }
    }
}

/// One outlet as handed to the renderer, derived fields included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletRow {
    pub station_name: String,
    pub outlet_name: String,
    pub status: String,
    pub power_rating_watts: u32,
    pub used_minutes: u32,
    pub total_minutes: u32,
    pub remaining_minutes: u32,
    pub used_and_total_desc: String,
    pub remaining_time_desc: String,
    pub end_time_desc: String,
    pub note: String,
}

impl OutletRow {
    /// Render the derived fields of a report as of `now`.
    pub fn from_report(report: &OutletReport, now: DateTime<Utc>) -> Self {
        Self {
            station_name: report.station_name.clone(),
            outlet_name: report.outlet_name.clone(),
            status: report.status.label().to_string(),
            power_rating_watts: report.power_rating_watts,
            used_minutes: report.used_minutes,
            total_minutes: report.total_minutes,
            remaining_minutes: report.remaining_minutes(),
            used_and_total_desc: report.used_and_total_desc(),
            remaining_time_desc: report.remaining_time_desc(),
            end_time_desc: report.end_time_desc_at(now),
            note: report.note().to_string(),
        }
    }
}

/// Outlets of one area, sorted by remaining time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaGroup {
    pub area: String,
    pub outlets: Vec<OutletRow>,
}

/// The assembled report consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// UTC+8 timestamp of the run
    pub updated_at: String,
    pub alive: bool,
    pub status: RunStatus,
    pub stats: FetchStats,
    pub groups: Vec<AreaGroup>,
}

impl Report {
    /// Total number of outlets across all groups.
    pub fn outlet_count(&self) -> usize {
        self.groups.iter().map(|g| g.outlets.len()).sum()
    }
}

/// A cached outlet identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedOutlet {
    pub no: String,
    pub name: String,
}

/// Outlet identifiers per station id, persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutletCache(BTreeMap<String, Vec<CachedOutlet>>);

impl OutletCache {
    pub fn get(&self, station_id: i64) -> Option<&[CachedOutlet]> {
        self.0
            .get(&station_id.to_string())
            .map(Vec::as_slice)
            .filter(|outlets| !outlets.is_empty())
    }

    pub fn insert(&mut self, station_id: i64, outlets: Vec<CachedOutlet>) {
        self.0.insert(station_id.to_string(), outlets);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrite entries with those of `fresh`, keeping stations it lacks.
    pub fn merge(&mut self, fresh: OutletCache) {
        self.0.extend(fresh.0);
    }

    pub fn station_count(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(alive: bool, station_failures: usize, detail_failures: usize) -> FetchStats {
        FetchStats {
            alive,
            station_failures,
            detail_failures,
            ..FetchStats::default()
        }
    }

    #[test]
    fn test_run_status() {
        assert_eq!(stats(false, 0, 0).run_status(0), RunStatus::Down);
        assert_eq!(stats(true, 0, 0).run_status(0), RunStatus::Down);
        assert_eq!(stats(true, 0, 1).run_status(4), RunStatus::Partial);
        assert_eq!(stats(true, 1, 0).run_status(4), RunStatus::Partial);
        assert_eq!(stats(true, 0, 0).run_status(4), RunStatus::Up);
    }

    #[test]
    fn test_outlet_cache_json_shape() {
        let mut cache = OutletCache::default();
        cache.insert(
            117379,
            vec![CachedOutlet {
                no: "0101".into(),
                name: "插座1".into(),
            }],
        );
        cache.insert(117381, Vec::new());

        let json = serde_json::to_string(&cache).unwrap();
        assert_eq!(
            json,
            r#"{"117379":[{"no":"0101","name":"插座1"}],"117381":[]}"#
        );

        let parsed: OutletCache = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get(117379).map(|o| o.len()), Some(1));
        assert!(parsed.get(117381).is_none());
        assert!(parsed.get(1).is_none());
        assert_eq!(parsed.station_count(), 2);
    }

    #[test]
    fn test_outlet_cache_merge_keeps_stale_stations() {
        let outlet = |no: &str| CachedOutlet {
            no: no.into(),
            name: format!("插座{no}"),
        };
        let mut cache = OutletCache::default();
        cache.insert(1, vec![outlet("1")]);
        cache.insert(2, vec![outlet("2")]);

        let mut fresh = OutletCache::default();
        fresh.insert(2, vec![outlet("3"), outlet("4")]);
        cache.merge(fresh);

        assert_eq!(cache.get(1).map(|o| o.len()), Some(1));
        assert_eq!(cache.get(2).map(|o| o.len()), Some(2));
    }
}
