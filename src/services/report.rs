// src/services/report.rs

//! Report assembly: sort outlets by remaining time and group them by area.

use chrono::{DateTime, Utc};

use crate::models::{AreaGroup, FetchStats, OutletReport, OutletRow, Report, Station};
use crate::utils::time::{DATETIME_FORMAT, format_local};

/// Build the report for one run.
///
/// Groups follow the first-seen area order of `stations`; areas without
/// outlets still get an empty group. Within a group outlets are ordered by
/// ascending remaining minutes, ties keeping their input order.
pub fn assemble(
    stations: &[Station],
    mut reports: Vec<OutletReport>,
    stats: FetchStats,
    now: DateTime<Utc>,
) -> Report {
    reports.sort_by_key(OutletReport::remaining_minutes);

    let mut groups: Vec<AreaGroup> = Station::areas(stations)
        .into_iter()
        .map(|area| AreaGroup {
            area: area.to_string(),
            outlets: Vec::new(),
        })
        .collect();

    for report in &reports {
        let row = OutletRow::from_report(report, now);
        match groups.iter_mut().find(|g| g.area == report.area) {
            Some(group) => group.outlets.push(row),
            None => {
                log::debug!("Outlet {} has unlisted area {}", report.outlet_name, report.area);
                groups.push(AreaGroup {
                    area: report.area.clone(),
                    outlets: vec![row],
                });
            }
        }
    }

    Report {
        updated_at: format_local(now, 0, DATETIME_FORMAT),
        alive: stats.alive,
        status: stats.run_status(reports.len()),
        stats,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    use crate::models::{OutletStatus, RunStatus, UNAVAILABLE_REMAINING_MINUTES};

    fn station(id: i64, area: &str) -> Station {
        Station {
            id,
            name: format!("S{id}"),
            area: area.to_string(),
        }
    }

    fn report(name: &str, area: &str, status: OutletStatus, used: u32, total: u32) -> OutletReport {
        OutletReport {
            station_name: "S".to_string(),
            outlet_name: name.to_string(),
            area: area.to_string(),
            status,
            power_rating_watts: 0,
            used_minutes: used,
            total_minutes: total,
        }
    }

    fn live_stats() -> FetchStats {
        FetchStats {
            alive: true,
            station_total: 2,
            ..FetchStats::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap()
    }

    fn names(group: &AreaGroup) -> Vec<&str> {
        group.outlets.iter().map(|o| o.outlet_name.as_str()).collect()
    }

    #[test]
    fn test_groups_sorted_by_remaining_minutes() {
        let stations = [station(1, "North"), station(2, "South")];
        let reports = vec![
            report("broken", "North", OutletStatus::Unavailable("故障".into()), 0, 1000),
            report("busy", "North", OutletStatus::Using, 10, 100),
            report("free", "North", OutletStatus::Available, 0, 0),
            report("almost", "North", OutletStatus::Using, 90, 100),
        ];

        let report = assemble(&stations, reports, live_stats(), now());

        assert_eq!(report.updated_at, "2024-03-01 12:00:00");
        assert_eq!(report.status, RunStatus::Up);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].area, "North");
        assert_eq!(names(&report.groups[0]), ["free", "almost", "busy", "broken"]);
        assert_eq!(
            report.groups[0].outlets[3].remaining_minutes,
            UNAVAILABLE_REMAINING_MINUTES
        );
        assert_eq!(report.outlet_count(), 4);
    }

    #[test]
    fn test_empty_area_keeps_its_group() {
        let stations = [station(1, "North"), station(2, "South")];
        let reports = vec![report("a", "North", OutletStatus::Available, 0, 0)];

        let report = assemble(&stations, reports, live_stats(), now());

        assert_eq!(report.groups[1].area, "South");
        assert!(report.groups[1].outlets.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let stations = [station(1, "North")];
        let reports = vec![
            report("first", "North", OutletStatus::Available, 0, 0),
            report("second", "North", OutletStatus::Available, 0, 0),
            report("third", "North", OutletStatus::Available, 0, 0),
        ];

        let report = assemble(&stations, reports, live_stats(), now());
        assert_eq!(names(&report.groups[0]), ["first", "second", "third"]);
    }

    #[test]
    fn test_dead_run_is_down() {
        let stations = [station(1, "North")];
        let report = assemble(&stations, Vec::new(), FetchStats::default(), now());

        assert!(!report.alive);
        assert_eq!(report.status, RunStatus::Down);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.outlet_count(), 0);
    }

    fn status_strategy() -> impl Strategy<Value = OutletStatus> {
        prop_oneof![
            Just(OutletStatus::Available),
            Just(OutletStatus::Using),
            Just(OutletStatus::Unavailable("维护中".to_string())),
        ]
    }

    proptest! {
        #[test]
        fn prop_groups_are_sorted_and_complete(
            entries in prop::collection::vec((status_strategy(), 0u32..200, 0u32..200, 0usize..3), 0..40)
        ) {
            let areas = ["A", "B", "C"];
            let stations: Vec<Station> = areas
                .iter()
                .enumerate()
                .map(|(i, area)| station(i as i64, area))
                .collect();
            let reports: Vec<OutletReport> = entries
                .iter()
                .enumerate()
                .map(|(i, (status, used, total, area))| {
                    report(&i.to_string(), areas[*area], status.clone(), *used, *total)
                })
                .collect();

            let report = assemble(&stations, reports, live_stats(), now());

            prop_assert_eq!(report.groups.len(), areas.len());
            prop_assert_eq!(report.outlet_count(), entries.len());
            for group in &report.groups {
                let remaining: Vec<u32> = group.outlets.iter().map(|o| o.remaining_minutes).collect();
                prop_assert!(remaining.windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }
}
