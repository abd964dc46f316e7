//! Application state for the web layer.

use std::sync::Arc;

use crate::scheduler::Refresh;

use super::status::StatusEndpoint;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Read-only view of the snapshot cache
    pub status: StatusEndpoint,

    /// On-demand refresh through the scheduler's gate
    pub refresher: Arc<dyn Refresh>,
}

impl AppState {
    pub fn new(status: StatusEndpoint, refresher: Arc<dyn Refresh>) -> Self {
        Self { status, refresher }
    }
}
