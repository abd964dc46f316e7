//! GBFS (General Bikeshare Feed Specification) feed access.
//!
//! A bikeshare system publishes station data as two documents:
//! - `station_information.json`: positions, names and capacities, which
//!   change rarely
//! - `station_status.json`: bike and dock counts, regenerated every few
//!   seconds to minutes
//!
//! Both are keyed by `station_id`. This module fetches them and converts
//! individual entries into domain types; joining them is the reconciler's
//! job.

mod client;
mod convert;
mod error;
mod mock;
mod types;

use std::future::Future;

pub use client::{FeedClient, FeedConfig, STATION_INFORMATION, STATION_STATUS};
pub use convert::{RecordError, convert_station_information, convert_station_status};
pub use error::{FeedError, FeedErrorKind};
pub use mock::MockFeed;
pub use types::{FeedDocument, RawFeed};

/// Something that can produce both feed documents.
///
/// Implemented by the live [`FeedClient`] and the file-backed [`MockFeed`].
pub trait FeedSource: Send + Sync + 'static {
    /// Fetch both documents. Both must succeed for the call to succeed.
    fn fetch_raw(&self) -> impl Future<Output = Result<RawFeed, FeedError>> + Send;
}
