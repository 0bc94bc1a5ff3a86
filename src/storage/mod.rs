//! Storage abstractions for run output.
//!
//! ## Directory Structure
//!
//! ```text
//! {output_dir}/
//! ├── report.json           # Latest grouped report, read by the renderer
//! └── data/                 # One raw snapshot per run with results
//!     └── {unix_millis}.data
//! ```
//!
//! The outlet cache lives wherever `paths.outlet_cache` points.

pub mod local;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{OutletCache, OutletReport, Report};

// Re-export for convenience
pub use local::LocalStorage;

/// Key of the grouped report under the output directory.
pub const REPORT_KEY: &str = "report.json";

/// Snapshot key for a run at `at`.
pub fn snapshot_key(at: DateTime<Utc>) -> String {
    format!("data/{}.data", at.timestamp_millis())
}

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Number of outlets in the written report
    pub outlet_count: usize,
    /// Snapshot key, if one was written
    pub snapshot: Option<String>,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for run output backends.
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Write the report and, when `reports` is non-empty, a raw snapshot.
    async fn write_run(
        &self,
        report: &Report,
        reports: &[OutletReport],
        at: DateTime<Utc>,
    ) -> Result<WriteMetadata>;

    /// Load the last written report, if any.
    async fn load_report(&self) -> Result<Option<serde_json::Value>>;

    /// Load the outlet cache. A missing or unreadable file yields an empty cache.
    async fn load_outlet_cache(&self, path: &Path) -> OutletCache;

    /// Replace the outlet cache atomically.
    async fn save_outlet_cache(&self, path: &Path, cache: &OutletCache) -> Result<()>;
}
