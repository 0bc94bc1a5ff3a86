//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── report.json           # Grouped report (overwritten every run)
//! └── data/
//!     └── {unix_millis}.data # Raw outlet reports of one run
//! ```
//!
//! Every write goes to a sibling `.tmp` file first and is renamed into
//! place, so readers never observe a half-written file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{OutletCache, OutletReport, Report};
use crate::storage::{REPORT_KEY, ReportStorage, WriteMetadata, snapshot_key};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically under the root.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.path(key), bytes).await
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        read_optional(&self.path(key)).await
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ReportStorage for LocalStorage {
    async fn write_run(
        &self,
        report: &Report,
        reports: &[OutletReport],
        at: DateTime<Utc>,
    ) -> Result<WriteMetadata> {
        self.write_json(REPORT_KEY, report).await?;
        log::info!(
            "Report: {} outlets written to {}",
            report.outlet_count(),
            self.path(REPORT_KEY).display()
        );

        let snapshot = if reports.is_empty() {
            None
        } else {
            let key = snapshot_key(at);
            self.write_json(&key, reports).await?;
            log::info!("Snapshot: {} outlets written to {}", reports.len(), key);
            Some(key)
        };

        Ok(WriteMetadata {
            outlet_count: report.outlet_count(),
            snapshot,
            timestamp: at,
        })
    }

    async fn load_report(&self) -> Result<Option<serde_json::Value>> {
        self.read_json(REPORT_KEY).await
    }

    async fn load_outlet_cache(&self, path: &Path) -> OutletCache {
        let bytes = match read_optional(path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No outlet cache at {}", path.display());
                return OutletCache::default();
            }
            Err(e) => {
                log::warn!("Cannot read outlet cache {}: {}", path.display(), e);
                return OutletCache::default();
            }
        };

        match serde_json::from_slice::<OutletCache>(&bytes) {
            Ok(cache) => {
                log::info!(
                    "Loaded outlet cache for {} stations from {}",
                    cache.station_count(),
                    path.display()
                );
                cache
            }
            Err(e) => {
                log::warn!("Ignoring malformed outlet cache {}: {}", path.display(), e);
                OutletCache::default()
            }
        }
    }

    async fn save_outlet_cache(&self, path: &Path, cache: &OutletCache) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cache)?;
        write_atomic(path, &bytes).await?;
        log::info!(
            "Outlet cache: {} stations written to {}",
            cache.station_count(),
            path.display()
        );
        Ok(())
    }
}

/// Write bytes atomically (write to temp, then rename).
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}
