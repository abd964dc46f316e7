//! Station types: near-static metadata, dynamic status, and the joined view.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::occupancy::{StationState, percent_full};

/// Error returned when parsing an invalid station identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// Upstream station identifier, the join key between the two feeds.
///
/// Identifiers are opaque strings compared by exact match. Surrounding
/// whitespace is not trimmed, but an empty identifier is rejected.
///
/// # Examples
///
/// ```
/// use bikeshare_server::domain::StationId;
///
/// let id = StationId::parse("66db237e-0aca-11e7-82f6-3863bb44ef7c").unwrap();
/// assert_eq!(id.as_str(), "66db237e-0aca-11e7-82f6-3863bb44ef7c");
///
/// assert!(StationId::parse("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    /// Parse a station identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        if s.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }
        Ok(StationId(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StationId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StationId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Station metadata from the information feed.
///
/// Positions and capacities change rarely; the whole set is replaced on
/// every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct StationInfo {
    pub station_id: StationId,

    /// Operator-facing short code, when the feed provides one.
    pub short_name: Option<String>,

    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: u32,
}

/// Dynamic station status from the status feed.
#[derive(Debug, Clone, PartialEq)]
pub struct StationStatus {
    pub station_id: StationId,
    pub num_bikes_available: u32,
    pub num_ebikes_available: u32,
    pub num_classic_bikes_available: u32,
    pub num_docks_available: u32,
    pub is_installed: bool,
    pub is_renting: bool,
    pub is_returning: bool,

    /// Upstream report time, seconds since the Unix epoch.
    pub last_reported: i64,
}

impl StationStatus {
    /// Whether the classic and e-bike counts add up to the total.
    ///
    /// Upstream feeds are known to disagree with themselves here; callers
    /// log a mismatch rather than reject the record.
    pub fn bike_counts_consistent(&self) -> bool {
        u64::from(self.num_classic_bikes_available) + u64::from(self.num_ebikes_available)
            == u64::from(self.num_bikes_available)
    }
}

/// A station present in both feeds, with derived occupancy.
///
/// This is the unit the status endpoint serves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSnapshot {
    pub station_id: StationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub capacity: u32,
    pub num_bikes_available: u32,
    pub num_ebikes_available: u32,
    pub num_classic_bikes_available: u32,
    pub num_docks_available: u32,
    pub is_installed: bool,
    pub is_renting: bool,
    pub is_returning: bool,
    pub last_reported: i64,
    pub percent_full: u8,
}

impl StationSnapshot {
    /// Join metadata and status for the same station.
    ///
    /// The caller is responsible for matching identifiers; the metadata's
    /// identifier is the one kept.
    pub fn join(info: StationInfo, status: &StationStatus) -> Self {
        let percent_full = percent_full(
            u64::from(info.capacity),
            u64::from(status.num_docks_available),
        );

        Self {
            station_id: info.station_id,
            short_name: info.short_name,
            name: info.name,
            latitude: info.latitude,
            longitude: info.longitude,
            capacity: info.capacity,
            num_bikes_available: status.num_bikes_available,
            num_ebikes_available: status.num_ebikes_available,
            num_classic_bikes_available: status.num_classic_bikes_available,
            num_docks_available: status.num_docks_available,
            is_installed: status.is_installed,
            is_renting: status.is_renting,
            is_returning: status.is_returning,
            last_reported: status.last_reported,
            percent_full,
        }
    }

    /// Classify this station for display.
    pub fn state(&self) -> StationState {
        StationState::classify(
            self.is_installed,
            self.is_renting,
            self.num_bikes_available,
            self.percent_full,
        )
    }
}
