//! Joining station metadata with station status.
//!
//! Reconciliation never fails. Entries that cannot be converted are logged
//! and dropped, and the summary is built from whatever survives.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{StationId, StationSnapshot, StationStatus, SystemSummary};
use crate::gbfs::{convert_station_information, convert_station_status};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// One entry per station present in both feeds, in metadata order.
    pub stations: Vec<StationSnapshot>,
    pub summary: SystemSummary,
    /// Entries dropped because they could not be converted.
    pub dropped_records: usize,
}

/// Joins the two feeds into a snapshot.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    /// When set, only stations whose `station_id` or `short_name` is listed
    /// are kept.
    filter: Option<HashSet<String>>,
}

impl Reconciler {
    /// A reconciler that keeps every station.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the listed stations, matched on `station_id` or `short_name`.
    pub fn with_station_filter<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Join raw information and status entries by station id.
    ///
    /// Stations present in only one feed are omitted: a station without a
    /// status entry has an unknown status, not an empty one.
    pub fn reconcile(&self, information: &[Value], status: &[Value]) -> Reconciled {
        let mut dropped_records = 0;
        let statuses = self.index_statuses(status, &mut dropped_records);

        let mut seen: HashSet<StationId> = HashSet::new();
        let mut stations = Vec::new();

        for raw in information {
            let info = match convert_station_information(raw) {
                Ok(info) => info,
                Err(e) => {
                    warn!(error = %e, "Dropping malformed station information entry");
                    dropped_records += 1;
                    continue;
                }
            };

            if !self.keeps(info.station_id.as_str(), info.short_name.as_deref()) {
                continue;
            }

            if !seen.insert(info.station_id.clone()) {
                warn!(station_id = %info.station_id, "Duplicate station information entry, keeping the first");
                continue;
            }

            let Some(status) = statuses.get(&info.station_id) else {
                debug!(station_id = %info.station_id, "No status for station, omitting");
                continue;
            };

            if !status.bike_counts_consistent() {
                warn!(
                    station_id = %status.station_id,
                    bikes = status.num_bikes_available,
                    classic = status.num_classic_bikes_available,
                    ebikes = status.num_ebikes_available,
                    "Classic and e-bike counts do not add up to total bikes"
                );
            }

            stations.push(StationSnapshot::join(info, status));
        }

        let summary = SystemSummary::from_stations(&stations);

        Reconciled {
            stations,
            summary,
            dropped_records,
        }
    }

    /// Convert status entries into a lookup by id; later duplicates win.
    fn index_statuses(
        &self,
        status: &[Value],
        dropped_records: &mut usize,
    ) -> HashMap<StationId, StationStatus> {
        let mut by_id = HashMap::with_capacity(status.len());

        for raw in status {
            match convert_station_status(raw) {
                Ok(s) => {
                    if let Some(previous) = by_id.insert(s.station_id.clone(), s) {
                        debug!(station_id = %previous.station_id, "Duplicate status entry, keeping the last");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Dropping malformed station status entry");
                    *dropped_records += 1;
                }
            }
        }

        by_id
    }

    fn keeps(&self, station_id: &str, short_name: Option<&str>) -> bool {
        match &self.filter {
            None => true,
            Some(ids) => {
                ids.contains(station_id) || short_name.is_some_and(|name| ids.contains(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StationState;
    use serde_json::json;

    fn info(id: &str, capacity: u32) -> Value {
        json!({
            "station_id": id,
            "short_name": format!("short-{id}"),
            "name": format!("Station {id}"),
            "lat": 40.81,
            "lon": -73.96,
            "capacity": capacity
        })
    }

    fn status(id: &str, bikes: u32, docks: u32, installed: u8, renting: u8) -> Value {
        json!({
            "station_id": id,
            "num_bikes_available": bikes,
            "num_ebikes_available": 0,
            "num_docks_available": docks,
            "is_installed": installed,
            "is_renting": renting,
            "is_returning": 1,
            "last_reported": 1700000000
        })
    }

    #[test]
    fn joins_only_common_stations() {
        let information = vec![info("A", 20), info("B", 10)];
        let statuses = vec![status("A", 15, 5, 1, 1), status("C", 3, 3, 1, 1)];

        let result = Reconciler::new().reconcile(&information, &statuses);

        assert_eq!(result.stations.len(), 1);
        let a = &result.stations[0];
        assert_eq!(a.station_id.as_str(), "A");
        assert_eq!(a.percent_full, 75);
        assert_eq!(a.state(), StationState::Available);
        assert_eq!(result.summary.total_stations, 1);
        assert_eq!(result.summary.total_capacity, 20);
        assert_eq!(result.dropped_records, 0);
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let information = vec![
            info("A", 20),
            json!({"station_id": "B", "name": "No coords", "capacity": 10}),
            info("C", 10),
        ];
        let statuses = vec![
            status("A", 15, 5, 1, 1),
            status("B", 1, 9, 1, 1),
            json!({"station_id": "C", "num_bikes_available": "n/a"}),
        ];

        let result = Reconciler::new().reconcile(&information, &statuses);

        assert_eq!(result.stations.len(), 1);
        assert_eq!(result.stations[0].station_id.as_str(), "A");
        assert_eq!(result.dropped_records, 2);
        assert_eq!(result.summary.total_stations, 1);
    }

    #[test]
    fn preserves_metadata_order() {
        let information = vec![info("Z", 10), info("A", 10), info("M", 10)];
        let statuses = vec![
            status("A", 1, 9, 1, 1),
            status("M", 1, 9, 1, 1),
            status("Z", 1, 9, 1, 1),
        ];

        let result = Reconciler::new().reconcile(&information, &statuses);
        let ids: Vec<_> = result
            .stations
            .iter()
            .map(|s| s.station_id.as_str())
            .collect();
        assert_eq!(ids, vec!["Z", "A", "M"]);
    }

    #[test]
    fn duplicate_ids_yield_one_entry() {
        let information = vec![info("A", 20), info("A", 40)];
        let statuses = vec![status("A", 1, 19, 1, 1), status("A", 15, 5, 1, 1)];

        let result = Reconciler::new().reconcile(&information, &statuses);

        assert_eq!(result.stations.len(), 1);
        // First metadata entry, last status entry.
        assert_eq!(result.stations[0].capacity, 20);
        assert_eq!(result.stations[0].num_docks_available, 5);
    }

    #[test]
    fn offline_station_with_no_bikes_is_offline() {
        let information = vec![info("A", 20)];
        let statuses = vec![status("A", 0, 20, 0, 1)];

        let result = Reconciler::new().reconcile(&information, &statuses);
        assert_eq!(result.stations[0].state(), StationState::Offline);
    }

    #[test]
    fn station_filter_matches_id_or_short_name() {
        let information = vec![info("A", 20), info("B", 10), info("C", 10)];
        let statuses = vec![
            status("A", 15, 5, 1, 1),
            status("B", 5, 5, 1, 1),
            status("C", 5, 5, 1, 1),
        ];

        let reconciler = Reconciler::new().with_station_filter(["A", "short-C"]);
        let result = reconciler.reconcile(&information, &statuses);

        let ids: Vec<_> = result
            .stations
            .iter()
            .map(|s| s.station_id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(result.summary.total_stations, 2);
    }

    #[test]
    fn bike_count_mismatch_is_kept() {
        let information = vec![info("A", 20)];
        let statuses = vec![json!({
            "station_id": "A",
            "num_bikes_available": 10,
            "num_ebikes_available": 3,
            "num_classic_bikes_available": 3,
            "num_docks_available": 10,
            "is_installed": true,
            "is_renting": true,
            "is_returning": true,
            "last_reported": 1700000000
        })];

        let result = Reconciler::new().reconcile(&information, &statuses);
        assert_eq!(result.stations.len(), 1);
        assert_eq!(result.stations[0].num_bikes_available, 10);
    }

    #[test]
    fn empty_feeds_give_empty_summary() {
        let result = Reconciler::new().reconcile(&[], &[]);
        assert!(result.stations.is_empty());
        assert_eq!(result.summary, SystemSummary::default());
    }
}
