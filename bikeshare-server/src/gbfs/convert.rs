//! Conversion from raw feed entries to domain types.
//!
//! Each entry is converted independently. A failure here describes one bad
//! record; the reconciler logs it and moves on.

use serde_json::Value;

use crate::domain::{StationInfo, StationStatus};

use super::types::{StationInformationRecord, StationStatusRecord};

/// A feed entry that could not be turned into a domain record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("station {}: {message}", .station_id.as_deref().unwrap_or("<unknown>"))]
pub struct RecordError {
    /// Best-effort id of the offending entry, for logging.
    pub station_id: Option<String>,
    pub message: String,
}

impl RecordError {
    fn new(raw: &Value, message: impl Into<String>) -> Self {
        Self {
            station_id: raw_station_id(raw),
            message: message.into(),
        }
    }
}

/// Pull a printable id out of an entry that may not otherwise be valid.
fn raw_station_id(raw: &Value) -> Option<String> {
    match raw.get("station_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert one `station_information.json` entry.
pub fn convert_station_information(raw: &Value) -> Result<StationInfo, RecordError> {
    let record: StationInformationRecord =
        serde_json::from_value(raw.clone()).map_err(|e| RecordError::new(raw, e.to_string()))?;

    if !(-90.0..=90.0).contains(&record.lat) {
        return Err(RecordError::new(
            raw,
            format!("latitude {} out of range", record.lat),
        ));
    }
    if !(-180.0..=180.0).contains(&record.lon) {
        return Err(RecordError::new(
            raw,
            format!("longitude {} out of range", record.lon),
        ));
    }

    Ok(StationInfo {
        station_id: record.station_id,
        short_name: record.short_name,
        name: record.name,
        latitude: record.lat,
        longitude: record.lon,
        capacity: record.capacity,
    })
}

/// Convert one `station_status.json` entry.
///
/// A missing e-bike count is taken as zero, and a missing classic count is
/// derived from the total.
pub fn convert_station_status(raw: &Value) -> Result<StationStatus, RecordError> {
    let record: StationStatusRecord =
        serde_json::from_value(raw.clone()).map_err(|e| RecordError::new(raw, e.to_string()))?;

    let ebikes = record.num_ebikes_available.unwrap_or(0);
    let classic = record
        .num_classic_bikes_available
        .unwrap_or_else(|| record.num_bikes_available.saturating_sub(ebikes));

    Ok(StationStatus {
        station_id: record.station_id,
        num_bikes_available: record.num_bikes_available,
        num_ebikes_available: ebikes,
        num_classic_bikes_available: classic,
        num_docks_available: record.num_docks_available,
        is_installed: record.is_installed,
        is_renting: record.is_renting,
        is_returning: record.is_returning,
        last_reported: record.last_reported,
    })
}
