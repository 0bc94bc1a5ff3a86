// src/models/mod.rs

//! Domain models for the outlet poller.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod outlet;
mod payload;
mod report;
mod station;

// Re-export all public types
pub use config::{ApiGeneration, Config, LoggingConfig, PathsConfig, VendorConfig};
pub use outlet::{
    FAULT_REASON, MAINTENANCE_REASON, OutletRef, OutletReport, OutletStatus, StatusHint,
    UNAVAILABLE_REMAINING_MINUTES, UNAVAILABLE_TOTAL_MINUTES, UNKNOWN_TOTAL_MINUTES,
};
pub use payload::{CurrentDetail, LEGACY_SLOT_MINUTES, LegacyDetail, RawDetail};
pub use report::{AreaGroup, CachedOutlet, FetchStats, OutletCache, OutletRow, Report, RunStatus};
pub use station::Station;
