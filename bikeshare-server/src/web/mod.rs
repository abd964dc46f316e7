//! Web layer for the bikeshare status service.
//!
//! Handlers only read the snapshot cache; the one exception is
//! `POST /api/stations/refresh`, which goes through the scheduler's
//! single-flight gate.

mod dto;
mod routes;
mod state;
mod status;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use status::{CurrentStatus, StatusEndpoint, StatusError};
