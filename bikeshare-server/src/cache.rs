//! Snapshot cache with a stale-but-available policy.
//!
//! The cache holds one immutable [`CachedResult`]. Every write builds a new
//! value and swaps it in whole, so readers see either the old or the new
//! result and never a mix of the two. A failed poll only replaces the error
//! fields; the last good snapshot stays in place until the next success.
//!
//! The refresh scheduler is the only writer. Handlers only call
//! [`SnapshotCache::current`].

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::domain::{StationSnapshot, SystemSummary};
use crate::gbfs::FeedError;

/// Data from one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub stations: Vec<StationSnapshot>,
    pub summary: SystemSummary,
    pub fetched_at: DateTime<Utc>,
}

/// The most recent failed poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollFailure {
    pub error: FeedError,
    pub error_at: DateTime<Utc>,
}

/// What the cache currently knows.
///
/// `snapshot` is always the last *successful* poll. `failure` is set only
/// when the most recent poll failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedResult {
    pub snapshot: Option<Arc<Snapshot>>,
    pub failure: Option<PollFailure>,
}

impl CachedResult {
    /// Whether any poll has ever succeeded.
    pub fn has_data(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Whether the data served is older than the latest poll attempt.
    pub fn is_stale(&self) -> bool {
        self.snapshot.is_some() && self.failure.is_some()
    }
}

/// Holder of the current [`CachedResult`].
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Arc<CachedResult>>,
}

impl SnapshotCache {
    /// Create an empty cache: no snapshot, no error.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest result.
    ///
    /// The lock is held only long enough to clone the `Arc`, so this never
    /// waits on a poll in progress.
    pub fn current(&self) -> Arc<CachedResult> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record a successful poll, stamped now. Clears any previous error.
    pub fn store(
        &self,
        stations: Vec<StationSnapshot>,
        summary: SystemSummary,
    ) -> Arc<CachedResult> {
        self.store_at(stations, summary, Utc::now())
    }

    /// Record a successful poll fetched at `fetched_at`.
    pub fn store_at(
        &self,
        stations: Vec<StationSnapshot>,
        summary: SystemSummary,
        fetched_at: DateTime<Utc>,
    ) -> Arc<CachedResult> {
        let result = Arc::new(CachedResult {
            snapshot: Some(Arc::new(Snapshot {
                stations,
                summary,
                fetched_at,
            })),
            failure: None,
        });
        self.swap(result.clone());
        result
    }

    /// Record a failed poll, stamped now. The snapshot is left untouched.
    pub fn store_error(&self, error: FeedError) -> Arc<CachedResult> {
        self.store_error_at(error, Utc::now())
    }

    /// Record a failed poll that happened at `error_at`.
    pub fn store_error_at(
        &self,
        error: FeedError,
        error_at: DateTime<Utc>,
    ) -> Arc<CachedResult> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let result = Arc::new(CachedResult {
            snapshot: guard.snapshot.clone(),
            failure: Some(PollFailure { error, error_at }),
        });
        *guard = result.clone();
        result
    }

    fn swap(&self, result: Arc<CachedResult>) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = result;
    }
}
