//! Domain types for the station-status service.
//!
//! Feed records are validated into these types before reconciliation, so
//! code holding a `StationInfo` or `StationStatus` can trust its fields.

mod occupancy;
mod station;
mod summary;

pub use occupancy::{LOW_PERCENT_FULL, StationState, percent_full};
pub use station::{InvalidStationId, StationId, StationInfo, StationSnapshot, StationStatus};
pub use summary::SystemSummary;
