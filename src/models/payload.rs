// src/models/payload.rs

//! Raw outlet detail payloads, one variant per vendor API generation.
//!
//! The vendor adapter converts each HTTP response into one of these shapes;
//! the normalizer only ever sees this union.

/// Outlet detail as returned by the current JSON API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentDetail {
    /// Device-level state flag, `1` means operational
    pub hardware_state: i64,
    /// Minutes charged so far
    pub used_minutes: i64,
    /// Vendor estimate of minutes left; non-positive when unknown
    pub rest_minutes: i64,
    /// Error counter on the outlet, `0` when the field is absent
    pub error_count: i64,
    /// Billing power text, e.g. "1000W"
    pub billing_power: Option<String>,
}

/// Outlet detail scraped from the legacy HTML page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyDetail {
    /// Whether the page shows a charging record block
    pub charging: bool,
    /// Text of the power item
    pub power_text: Option<String>,
    /// Text of the elapsed-time item
    pub used_text: Option<String>,
    /// Text holding the number of booked half-hour slots
    pub booked_slots_text: Option<String>,
}

/// Minutes per booked slot on the legacy API.
pub const LEGACY_SLOT_MINUTES: i64 = 30;

/// Raw detail payload from either API generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDetail {
    Current(CurrentDetail),
    Legacy(LegacyDetail),
}
