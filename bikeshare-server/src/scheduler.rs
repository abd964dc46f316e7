//! Periodic and on-demand feed refresh.
//!
//! The scheduler is either idle or refreshing. Timer ticks and on-demand
//! requests go through the same single-flight gate: while a refresh is in
//! flight, further requests wait for that refresh instead of starting a
//! second fetch, and all of them receive the same result.
//!
//! The refresh itself runs on a spawned task, so a caller that stops
//! waiting (a dropped HTTP request, say) cannot cancel it halfway. The gate
//! is released by a drop guard as the task's last action, which also covers
//! a panicking feed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{CachedResult, SnapshotCache};
use crate::gbfs::{FeedError, FeedSource};
use crate::reconcile::Reconciler;

/// Default polling interval, matching the upstream's realistic cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// A refresh in flight, awaitable by any number of callers.
type InFlight = Shared<BoxFuture<'static, Arc<CachedResult>>>;

/// On-demand refresh, as seen by request handlers.
///
/// Object-safe so the web layer does not depend on the feed type.
pub trait Refresh: Send + Sync {
    /// Refresh now, or join the refresh already in flight.
    fn refresh(&self) -> BoxFuture<'_, Arc<CachedResult>>;

    /// Whether a refresh is currently in flight.
    fn is_refreshing(&self) -> bool;
}

/// Drives FeedSource → Reconciler → SnapshotCache.
pub struct RefreshScheduler<F> {
    inner: Arc<Inner<F>>,
}

struct Inner<F> {
    feed: F,
    reconciler: Reconciler,
    cache: Arc<SnapshotCache>,
    poll_interval: Duration,

    /// `Some` while refreshing.
    in_flight: Mutex<Option<InFlight>>,

    /// Signalled after every completed refresh, to restart the timer.
    completed: Notify,
}

impl<F> Clone for RefreshScheduler<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: FeedSource> RefreshScheduler<F> {
    /// Create a scheduler writing into `cache`.
    pub fn new(
        feed: F,
        reconciler: Reconciler,
        cache: Arc<SnapshotCache>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                feed,
                reconciler,
                cache,
                poll_interval,
                in_flight: Mutex::new(None),
                completed: Notify::new(),
            }),
        }
    }

    /// The cache this scheduler writes to.
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.inner.cache
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.slot().is_some()
    }

    /// Refresh now, or join the refresh already in flight.
    ///
    /// Returns the cache contents after the refresh, whether it succeeded
    /// or failed.
    pub async fn refresh(&self) -> Arc<CachedResult> {
        let in_flight = {
            let mut slot = self.inner.slot();
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Refresh already in flight, joining it");
                    existing.clone()
                }
                None => {
                    let started = self.start_refresh();
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        in_flight.await
    }

    /// Spawn the refresh task. Must be called with the gate held, so the
    /// task cannot release the gate before it has been set.
    fn start_refresh(&self) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _release = GateRelease(Arc::clone(&inner));
            inner.poll_once().await
        });

        let cache = Arc::clone(&self.inner.cache);
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Refresh task did not complete");
                    cache.current()
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Poll immediately, then every `poll_interval`.
    ///
    /// Any completed refresh, on-demand ones included, restarts the
    /// interval. Failures do not change the schedule.
    pub async fn run(self) {
        info!(
            interval_secs = self.inner.poll_interval.as_secs(),
            "Starting refresh loop"
        );

        self.refresh().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.inner.poll_interval) => {
                    self.refresh().await;
                }
                _ = self.inner.completed.notified() => {}
            }
        }
    }

    /// Run the refresh loop on a background task.
    pub fn spawn(&self) -> JoinHandle<()> {
        tokio::spawn(self.clone().run())
    }
}

impl<F: FeedSource> Refresh for RefreshScheduler<F> {
    fn refresh(&self) -> BoxFuture<'_, Arc<CachedResult>> {
        RefreshScheduler::refresh(self).boxed()
    }

    fn is_refreshing(&self) -> bool {
        RefreshScheduler::is_refreshing(self)
    }
}

impl<F> Inner<F> {
    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F: FeedSource> Inner<F> {
    /// One fetch → reconcile → store cycle.
    async fn poll_once(&self) -> Arc<CachedResult> {
        let started = Instant::now();

        match self.feed.fetch_raw().await {
            Ok(raw) => {
                let reconciled = self
                    .reconciler
                    .reconcile(&raw.information.stations, &raw.status.stations);

                info!(
                    stations = reconciled.stations.len(),
                    dropped_records = reconciled.dropped_records,
                    feed_last_updated = ?raw.status.last_updated,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Refreshed station snapshot"
                );

                self.cache.store(reconciled.stations, reconciled.summary)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Feed poll failed, keeping last snapshot"
                );
                self.cache.store_error(e)
            }
        }
    }
}

/// Clears the in-flight slot and signals completion when dropped.
///
/// If dropped while unwinding, the poll is recorded as failed first, so the
/// served snapshot is flagged stale before another refresh can start.
struct GateRelease<F>(Arc<Inner<F>>);

impl<F> Drop for GateRelease<F> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0
                .cache
                .store_error(FeedError::internal("refresh task panicked"));
        }
        *self.0.slot() = None;
        self.0.completed.notify_one();
    }
}
