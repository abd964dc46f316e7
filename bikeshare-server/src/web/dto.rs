//! Data transfer objects for web responses.

use serde::Serialize;

use crate::domain::{StationSnapshot, StationState, SystemSummary};
use crate::gbfs::FeedErrorKind;

use super::status::CurrentStatus;

/// A station as rendered in the status response.
#[derive(Debug, Serialize)]
pub struct StationView<'a> {
    #[serde(flatten)]
    pub station: &'a StationSnapshot,

    /// Display classification derived from the counts and flags
    pub state: StationState,
}

impl<'a> From<&'a StationSnapshot> for StationView<'a> {
    fn from(station: &'a StationSnapshot) -> Self {
        Self {
            station,
            state: station.state(),
        }
    }
}

/// Response body for `GET /api/stations/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse<'a> {
    pub stations: Vec<StationView<'a>>,

    pub summary: &'a SystemSummary,

    /// When the snapshot was fetched, in epoch seconds
    pub last_updated: i64,

    /// Set when the latest poll failed and this snapshot predates it
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,

    /// Message from the latest failed poll
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FeedErrorKind>,

    /// When the latest poll failed, in epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_at: Option<i64>,
}

impl<'a> StatusResponse<'a> {
    pub fn from_status(status: &'a CurrentStatus) -> Self {
        let snapshot = &status.snapshot;
        let failure = status.failure.as_ref();

        Self {
            stations: snapshot.stations.iter().map(StationView::from).collect(),
            summary: &snapshot.summary,
            last_updated: snapshot.fetched_at.timestamp(),
            stale: status.is_stale(),
            error: failure.map(|f| f.error.to_string()),
            error_kind: failure.map(|f| f.error.kind),
            error_at: failure.map(|f| f.error_at.timestamp()),
        }
    }
}

/// Station metadata in the station listing.
#[derive(Debug, Serialize)]
pub struct StationListItem<'a> {
    pub station_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<&'a str>,
    pub name: &'a str,
    pub lat: f64,
    pub lon: f64,
    pub capacity: u32,
}

/// Response body for `GET /api/stations`.
#[derive(Debug, Serialize)]
pub struct StationListResponse<'a> {
    pub stations: Vec<StationListItem<'a>>,
    pub count: usize,
}

impl<'a> StationListResponse<'a> {
    pub fn from_stations(stations: &'a [StationSnapshot]) -> Self {
        let stations: Vec<_> = stations
            .iter()
            .map(|s| StationListItem {
                station_id: s.station_id.as_str(),
                short_name: s.short_name.as_deref(),
                name: &s.name,
                lat: s.latitude,
                lon: s.longitude,
                capacity: s.capacity,
            })
            .collect();

        Self {
            count: stations.len(),
            stations,
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    /// Whether a feed refresh is in flight
    pub refreshing: bool,
}

/// Response body for `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Cause of the latest failed poll, if relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
