//! Occupancy metrics and station classification.

use std::fmt;

use serde::Serialize;

/// Stations below this fill level are reported as low.
pub const LOW_PERCENT_FULL: u8 = 10;

/// Percentage of a station's docks that are occupied.
///
/// Computed as `round(100 * (capacity - docks_available) / capacity)`,
/// clamped to `[0, 100]`. A station with zero capacity is 0% full. Docks in
/// excess of capacity (a feed inconsistency) clamp to 0%.
///
/// Used for both single stations and system-wide sums, hence `u64`.
///
/// # Examples
///
/// ```
/// use bikeshare_server::domain::percent_full;
///
/// assert_eq!(percent_full(20, 5), 75);
/// assert_eq!(percent_full(0, 0), 0);
/// assert_eq!(percent_full(3, 1), 67);
/// ```
pub fn percent_full(capacity: u64, docks_available: u64) -> u8 {
    if capacity == 0 {
        return 0;
    }
    let occupied = capacity.saturating_sub(docks_available);

    // Integer round-half-up of 100 * occupied / capacity.
    let pct = (200 * occupied + capacity) / (2 * capacity);
    pct.min(100) as u8
}

/// Display classification of a station.
///
/// Checked as a strict priority chain: the first matching condition wins, so
/// an offline station with no bikes is `Offline`, never `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StationState {
    /// Not installed, or not renting.
    Offline,
    /// No bikes available.
    Empty,
    /// Below [`LOW_PERCENT_FULL`].
    Low,
    Available,
}

impl StationState {
    /// Classify a station from its status flags and occupancy.
    pub fn classify(
        is_installed: bool,
        is_renting: bool,
        bikes_available: u32,
        percent_full: u8,
    ) -> Self {
        if !is_installed || !is_renting {
            StationState::Offline
        } else if bikes_available == 0 {
            StationState::Empty
        } else if percent_full < LOW_PERCENT_FULL {
            StationState::Low
        } else {
            StationState::Available
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StationState::Offline => "offline",
            StationState::Empty => "empty",
            StationState::Low => "low",
            StationState::Available => "available",
        }
    }
}

impl fmt::Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_full_examples() {
        assert_eq!(percent_full(20, 5), 75);
        assert_eq!(percent_full(20, 20), 0);
        assert_eq!(percent_full(20, 0), 100);
        assert_eq!(percent_full(10, 3), 70);
    }

    #[test]
    fn percent_full_rounds_half_up() {
        // 1/8 = 12.5%
        assert_eq!(percent_full(8, 7), 13);
        // 2/3 = 66.67%
        assert_eq!(percent_full(3, 1), 67);
        // 1/3 = 33.33%
        assert_eq!(percent_full(3, 2), 33);
    }

    #[test]
    fn percent_full_zero_capacity() {
        assert_eq!(percent_full(0, 0), 0);
        assert_eq!(percent_full(0, 7), 0);
    }

    #[test]
    fn percent_full_docks_over_capacity_clamps() {
        assert_eq!(percent_full(10, 14), 0);
    }

    #[test]
    fn classify_priority_chain() {
        // Offline beats everything, including empty.
        assert_eq!(
            StationState::classify(false, true, 0, 0),
            StationState::Offline
        );
        assert_eq!(
            StationState::classify(true, false, 10, 90),
            StationState::Offline
        );

        // Empty beats low.
        assert_eq!(StationState::classify(true, true, 0, 5), StationState::Empty);

        assert_eq!(StationState::classify(true, true, 1, 9), StationState::Low);
        assert_eq!(
            StationState::classify(true, true, 1, 10),
            StationState::Available
        );
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&StationState::Offline).unwrap(),
            "\"offline\""
        );
        assert_eq!(StationState::Available.to_string(), "available");
    }
}
