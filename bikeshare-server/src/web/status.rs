//! Read side of the snapshot cache.

use std::sync::Arc;

use crate::cache::{PollFailure, Snapshot, SnapshotCache};
use crate::gbfs::FeedError;

/// Status lookup failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatusError {
    /// No poll has succeeded since startup
    #[error("no station data available yet")]
    NoDataAvailable {
        /// Why the most recent poll failed, if one has been attempted
        last_error: Option<FeedError>,
    },
}

/// The cached result, with a snapshot guaranteed present.
#[derive(Debug, Clone)]
pub struct CurrentStatus {
    pub snapshot: Arc<Snapshot>,
    /// Set when the latest poll failed; `snapshot` is then older than it.
    pub failure: Option<PollFailure>,
}

impl CurrentStatus {
    pub fn is_stale(&self) -> bool {
        self.failure.is_some()
    }
}

/// Serves the last good snapshot. Never triggers a refresh.
#[derive(Debug, Clone)]
pub struct StatusEndpoint {
    cache: Arc<SnapshotCache>,
}

impl StatusEndpoint {
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self { cache }
    }

    /// Current status, or `NoDataAvailable` before the first successful poll.
    pub fn get_status(&self) -> Result<CurrentStatus, StatusError> {
        let current = self.cache.current();

        match &current.snapshot {
            Some(snapshot) => Ok(CurrentStatus {
                snapshot: Arc::clone(snapshot),
                failure: current.failure.clone(),
            }),
            None => Err(StatusError::NoDataAvailable {
                last_error: current.failure.as_ref().map(|f| f.error.clone()),
            }),
        }
    }
}
