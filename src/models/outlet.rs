// src/models/outlet.rs

//! Outlet references, canonical status and the per-outlet report record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Station;
use crate::utils::time::{MINUTE_FORMAT, format_local};

/// Total minutes stored for a charging outlet whose remaining time is unknown.
pub const UNKNOWN_TOTAL_MINUTES: u32 = 999;

/// Total minutes stored for an unavailable outlet.
pub const UNAVAILABLE_TOTAL_MINUTES: u32 = 1000;

/// Remaining minutes shown (and sorted on) for an unavailable outlet.
pub const UNAVAILABLE_REMAINING_MINUTES: u32 = 999;

/// Reason shown when the device itself is down.
pub const MAINTENANCE_REASON: &str = "维护中";

/// Reason shown when the outlet reports errors.
pub const FAULT_REASON: &str = "故障";

/// Status hint carried by the outlet list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusHint {
    Charging,
    Idle,
}

impl StatusHint {
    /// Hint from the list's current charging record id (0 means none).
    pub fn from_record_id(record_id: i64) -> Self {
        if record_id > 0 {
            StatusHint::Charging
        } else {
            StatusHint::Idle
        }
    }
}

/// An outlet discovered for a station, used to drive the detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutletRef {
    /// Vendor outlet number, used in the detail URL
    pub outlet_no: String,
    /// Display name (e.g., "插座3")
    pub name: String,
    pub station: Station,
    /// Absent when the outlet came from the cache instead of a live list
    pub hint: Option<StatusHint>,
}

/// Canonical outlet status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutletStatus {
    Available,
    Using,
    Unavailable(String),
}

impl OutletStatus {
    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            OutletStatus::Available => "空闲中",
            OutletStatus::Using => "使用中",
            OutletStatus::Unavailable(reason) => reason,
        }
    }

    pub fn is_using(&self) -> bool {
        matches!(self, OutletStatus::Using)
    }
}

/// Final per-outlet record.
///
/// Only the fetched fields are stored; everything shown to the user is
/// derived from them on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletReport {
    pub station_name: String,
    pub outlet_name: String,
    pub area: String,
    pub status: OutletStatus,
    pub power_rating_watts: u32,
    pub used_minutes: u32,
    pub total_minutes: u32,
}

impl OutletReport {
    /// Minutes until the outlet is expected to be free.
    pub fn remaining_minutes(&self) -> u32 {
        match self.status {
            OutletStatus::Available => 0,
            OutletStatus::Using => self.total_minutes.saturating_sub(self.used_minutes),
            OutletStatus::Unavailable(_) => UNAVAILABLE_REMAINING_MINUTES,
        }
    }

    /// "30/75分钟" while charging.
    pub fn used_and_total_desc(&self) -> String {
        if self.status.is_using() {
            format!("{}/{}分钟", self.used_minutes, self.total_minutes)
        } else {
            String::new()
        }
    }

    /// "1小时15分钟" while charging.
    pub fn remaining_time_desc(&self) -> String {
        if self.status.is_using() {
            let remaining = self.remaining_minutes();
            format!("{}小时{}分钟", remaining / 60, remaining % 60)
        } else {
            String::new()
        }
    }

    /// Estimated end time in UTC+8, relative to `now`.
    pub fn end_time_desc_at(&self, now: DateTime<Utc>) -> String {
        if self.status.is_using() {
            format_local(now, i64::from(self.remaining_minutes()), MINUTE_FORMAT)
        } else {
            String::new()
        }
    }

    /// Estimated end time in UTC+8, relative to the current time.
    pub fn end_time_desc(&self) -> String {
        self.end_time_desc_at(Utc::now())
    }

    /// Unavailability reason, empty otherwise.
    pub fn note(&self) -> &str {
        match &self.status {
            OutletStatus::Unavailable(reason) => reason,
            _ => "",
        }
    }
}
