//! Wire types for GBFS feed documents.
//!
//! The envelope is parsed strictly: a document without `data.stations` is a
//! parse error for the whole fetch. Individual station entries are kept as
//! raw JSON and converted one at a time, so one bad record cannot fail the
//! poll.

use chrono::DateTime;
use serde::{Deserialize, Deserializer};

use crate::domain::StationId;

/// One fetched feed document, envelope metadata plus raw station entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedDocument {
    /// When the upstream last regenerated this document (epoch seconds).
    pub last_updated: Option<i64>,
    /// Upstream's suggested cache lifetime in seconds.
    pub ttl: Option<u64>,
    pub stations: Vec<serde_json::Value>,
}

impl FeedDocument {
    /// Parse a document body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let envelope: GbfsEnvelope = serde_json::from_str(body)?;
        Ok(Self {
            last_updated: envelope.last_updated,
            ttl: envelope.ttl,
            stations: envelope.data.stations,
        })
    }
}

/// Both upstream documents from one successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeed {
    pub information: FeedDocument,
    pub status: FeedDocument,
}

/// Top-level GBFS document.
#[derive(Debug, Deserialize)]
pub struct GbfsEnvelope {
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub last_updated: Option<i64>,
    #[serde(default)]
    pub ttl: Option<u64>,
    pub data: GbfsStations,
}

#[derive(Debug, Deserialize)]
pub struct GbfsStations {
    pub stations: Vec<serde_json::Value>,
}

/// An entry of `station_information.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationInformationRecord {
    #[serde(deserialize_with = "station_id")]
    pub station_id: StationId,
    #[serde(default)]
    pub short_name: Option<String>,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub capacity: u32,
}

/// An entry of `station_status.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationStatusRecord {
    #[serde(deserialize_with = "station_id")]
    pub station_id: StationId,
    pub num_bikes_available: u32,
    #[serde(default)]
    pub num_ebikes_available: Option<u32>,
    #[serde(default)]
    pub num_classic_bikes_available: Option<u32>,
    pub num_docks_available: u32,
    #[serde(deserialize_with = "flag")]
    pub is_installed: bool,
    #[serde(deserialize_with = "flag")]
    pub is_renting: bool,
    #[serde(deserialize_with = "flag")]
    pub is_returning: bool,
    #[serde(deserialize_with = "timestamp")]
    pub last_reported: i64,
}

/// Station ids are strings in current feeds but plain integers in some
/// older ones.
fn station_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StationId, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    let text = match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    };
    StationId::parse(&text).map_err(serde::de::Error::custom)
}

/// Booleans are `true`/`false` from GBFS 2.0 on, `1`/`0` before that.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Int(i64),
    }

    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(b) => Ok(b),
        RawFlag::Int(0) => Ok(false),
        RawFlag::Int(1) => Ok(true),
        RawFlag::Int(n) => Err(serde::de::Error::custom(format!(
            "expected boolean or 0/1, got {n}"
        ))),
    }
}

/// Timestamps are epoch seconds up to GBFS 2.3 and RFC 3339 strings in 3.0.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Seconds(i64),
    Text(String),
}

impl RawTimestamp {
    fn into_seconds<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            RawTimestamp::Seconds(secs) => Ok(secs),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.timestamp())
                .map_err(E::custom),
        }
    }
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    RawTimestamp::deserialize(deserializer)?.into_seconds()
}

/// Like [`timestamp`], but `null` reads as absent.
fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<RawTimestamp>::deserialize(deserializer)?
        .map(RawTimestamp::into_seconds)
        .transpose()
}
