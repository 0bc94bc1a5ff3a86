// src/services/normalize.rs

//! Outlet status normalization.
//!
//! Turns a raw detail payload plus the outlet-list hint into an
//! [`OutletReport`]. Pure and deterministic: no I/O, no clock.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{
    FAULT_REASON, LEGACY_SLOT_MINUTES, MAINTENANCE_REASON, OutletRef, OutletReport,
    OutletStatus, RawDetail, StatusHint, UNAVAILABLE_TOTAL_MINUTES, UNKNOWN_TOTAL_MINUTES,
};

static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("static regex is valid"));

/// The three classification signals plus timing inputs, in one shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailSignals {
    pub device_operational: bool,
    pub charging_record: bool,
    pub error_count: u32,
    pub used_minutes: u32,
    /// Non-positive when the vendor does not know
    pub vendor_remaining_minutes: i64,
    pub power_rating_watts: u32,
}

impl DetailSignals {
    /// Reduce either payload variant to the canonical signals.
    pub fn extract(detail: &RawDetail, hint: Option<StatusHint>) -> Self {
        match detail {
            RawDetail::Current(d) => {
                let used_minutes = clamp_u32(d.used_minutes);
                let charging_record = match hint {
                    Some(hint) => hint == StatusHint::Charging,
                    None => d.used_minutes > 0 || d.rest_minutes > 0,
                };
                Self {
                    device_operational: d.hardware_state == 1,
                    charging_record,
                    error_count: clamp_u32(d.error_count),
                    used_minutes,
                    vendor_remaining_minutes: d.rest_minutes,
                    power_rating_watts: extract_digits(d.billing_power.as_deref()),
                }
            }
            RawDetail::Legacy(d) => {
                let used = i64::from(extract_digits(d.used_text.as_deref()));
                let booked = i64::from(extract_digits(d.booked_slots_text.as_deref()))
                    * LEGACY_SLOT_MINUTES;
                let vendor_remaining_minutes = if booked > 0 { booked - used } else { 0 };
                Self {
                    device_operational: true,
                    charging_record: d.charging,
                    error_count: 0,
                    used_minutes: clamp_u32(used),
                    vendor_remaining_minutes,
                    power_rating_watts: extract_digits(d.power_text.as_deref()),
                }
            }
        }
    }
}

/// Classify signals into a canonical status. First match wins.
pub fn classify(signals: &DetailSignals) -> OutletStatus {
    if !signals.device_operational {
        OutletStatus::Unavailable(MAINTENANCE_REASON.to_string())
    } else if signals.charging_record {
        OutletStatus::Using
    } else if signals.error_count > 0 {
        OutletStatus::Unavailable(FAULT_REASON.to_string())
    } else {
        OutletStatus::Available
    }
}

/// Stored total minutes for a classified outlet.
pub fn total_minutes(status: &OutletStatus, signals: &DetailSignals) -> u32 {
    match status {
        OutletStatus::Available => 0,
        OutletStatus::Using if signals.vendor_remaining_minutes > 0 => {
            let remaining = clamp_u32(signals.vendor_remaining_minutes);
            signals.used_minutes.saturating_add(remaining)
        }
        OutletStatus::Using => UNKNOWN_TOTAL_MINUTES,
        OutletStatus::Unavailable(_) => UNAVAILABLE_TOTAL_MINUTES,
    }
}

/// Build the report for one outlet from its raw detail.
pub fn normalize(outlet: &OutletRef, detail: &RawDetail) -> OutletReport {
    let signals = DetailSignals::extract(detail, outlet.hint);
    let status = classify(&signals);
    let total_minutes = total_minutes(&status, &signals);

    OutletReport {
        station_name: outlet.station.name.clone(),
        outlet_name: outlet.name.clone(),
        area: outlet.station.area.clone(),
        status,
        power_rating_watts: signals.power_rating_watts,
        used_minutes: signals.used_minutes,
        total_minutes,
    }
}

/// Concatenate every decimal digit in `text` and parse it; 0 when there is
/// nothing usable.
///
/// Full-width digits (`０`-`９`) count as their ASCII forms. Digits of other
/// scripts are dropped.
pub fn extract_digits(text: Option<&str>) -> u32 {
    text.map(|t| t.chars().map(fold_full_width_digit).collect::<String>())
        .and_then(|t| NON_DIGIT.replace_all(&t, "").parse().ok())
        .unwrap_or(0)
}

fn fold_full_width_digit(c: char) -> char {
    match c {
        '０'..='９' => {
            char::from_u32(u32::from(c) - u32::from('０') + u32::from('0')).unwrap_or(c)
        }
        _ => c,
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
