// src/models/station.rs

//! Charging stations and the directory they are loaded from.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A physical charging-station location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    /// Vendor station identifier
    pub id: i64,

    /// Display name (e.g., "仙林校区-第十餐厅1号机")
    pub name: String,

    /// Area the station is grouped under in the report
    pub area: String,
}

impl Station {
    /// Load the station directory from a JSON array file.
    ///
    /// Any failure here is fatal for the run, so every error is reported as a
    /// configuration error naming the file.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Cannot read stations from {}: {e}", path.display()))
        })?;
        let stations: Vec<Self> = serde_json::from_str(&content).map_err(|e| {
            AppError::config(format!("Invalid stations file {}: {e}", path.display()))
        })?;
        Self::validate_all(&stations)?;
        Ok(stations)
    }

    /// Check that the directory is non-empty and ids are unique.
    pub fn validate_all(stations: &[Self]) -> Result<()> {
        if stations.is_empty() {
            return Err(AppError::config("No stations defined"));
        }
        let mut seen = HashSet::new();
        for station in stations {
            if !seen.insert(station.id) {
                return Err(AppError::config(format!(
                    "Duplicate station id {} ({})",
                    station.id, station.name
                )));
            }
        }
        Ok(())
    }

    /// Distinct areas in first-seen order.
    pub fn areas(stations: &[Self]) -> Vec<&str> {
        let mut seen = HashSet::new();
        stations
            .iter()
            .map(|s| s.area.as_str())
            .filter(|area| seen.insert(*area))
            .collect()
    }
}
