//! System-wide aggregates over a snapshot.

use serde::Serialize;

use super::occupancy::percent_full;
use super::station::StationSnapshot;

/// Totals across every station in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemSummary {
    pub total_stations: usize,
    pub total_bikes_available: u64,
    pub total_docks_available: u64,
    pub total_capacity: u64,

    /// Recomputed from the summed capacity and docks, not averaged from
    /// per-station percentages.
    pub overall_percent_full: u8,
}

impl SystemSummary {
    /// Aggregate a set of station snapshots.
    pub fn from_stations<'a>(stations: impl IntoIterator<Item = &'a StationSnapshot>) -> Self {
        let mut summary = stations
            .into_iter()
            .fold(SystemSummary::default(), |mut acc, s| {
                acc.total_stations += 1;
                acc.total_bikes_available += u64::from(s.num_bikes_available);
                acc.total_docks_available += u64::from(s.num_docks_available);
                acc.total_capacity += u64::from(s.capacity);
                acc
            });

        summary.overall_percent_full =
            percent_full(summary.total_capacity, summary.total_docks_available);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StationId, StationInfo, StationStatus};

    fn snapshot(id: &str, capacity: u32, bikes: u32, docks: u32) -> StationSnapshot {
        let info = StationInfo {
            station_id: StationId::parse(id).unwrap(),
            short_name: None,
            name: format!("Station {id}"),
            latitude: 40.8,
            longitude: -73.96,
            capacity,
        };
        let status = StationStatus {
            station_id: StationId::parse(id).unwrap(),
            num_bikes_available: bikes,
            num_ebikes_available: 0,
            num_classic_bikes_available: bikes,
            num_docks_available: docks,
            is_installed: true,
            is_renting: true,
            is_returning: true,
            last_reported: 0,
        };
        StationSnapshot::join(info, &status)
    }

    #[test]
    fn empty_summary() {
        let summary = SystemSummary::from_stations(&Vec::<StationSnapshot>::new());
        assert_eq!(summary, SystemSummary::default());
        assert_eq!(summary.overall_percent_full, 0);
    }

    #[test]
    fn sums_and_recomputes_percentage() {
        // Small station nearly full, big station nearly empty.
        let stations = vec![snapshot("A", 2, 2, 0), snapshot("B", 98, 8, 90)];
        let summary = SystemSummary::from_stations(&stations);

        assert_eq!(summary.total_stations, 2);
        assert_eq!(summary.total_bikes_available, 10);
        assert_eq!(summary.total_docks_available, 90);
        assert_eq!(summary.total_capacity, 100);

        // 10% from the sums; averaging per-station values would give 54%.
        assert_eq!(summary.overall_percent_full, 10);
    }
}
