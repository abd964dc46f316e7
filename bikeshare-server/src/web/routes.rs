//! HTTP route handlers.

use std::path::Path;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::warn;

use super::dto::*;
use super::state::AppState;
use super::status::StatusError;

const SERVICE_NAME: &str = "bikeshare-server";

/// Create the application router.
///
/// `artifacts_dir` holds precomputed chart and summary documents, served
/// as-is under `/artifacts`.
pub fn create_router(
    state: AppState,
    artifacts_dir: impl AsRef<Path>,
    allowed_origins: &[String],
) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/stations", get(list_stations))
        .route("/api/stations/status", get(station_status))
        .route("/api/stations/refresh", post(refresh_stations))
        .nest_service("/artifacts", ServeDir::new(artifacts_dir.as_ref()))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        refreshing: state.refresher.is_refreshing(),
    })
}

/// Service description.
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        description: "Live bikeshare station status aggregated from a GBFS feed",
        endpoints: vec![
            "GET /health",
            "GET /api/stations",
            "GET /api/stations/status",
            "POST /api/stations/refresh",
            "GET /artifacts/{file}",
        ],
    })
}

/// Latest snapshot with per-station state and a system summary.
async fn station_status(State(state): State<AppState>) -> Result<Response, AppError> {
    let status = state.status.get_status()?;
    Ok(Json(StatusResponse::from_status(&status)).into_response())
}

/// Refresh now (or join the refresh in flight), then respond like
/// [`station_status`].
async fn refresh_stations(State(state): State<AppState>) -> Result<Response, AppError> {
    state.refresher.refresh().await;
    let status = state.status.get_status()?;
    Ok(Json(StatusResponse::from_status(&status)).into_response())
}

/// Station metadata from the latest snapshot.
async fn list_stations(State(state): State<AppState>) -> Result<Response, AppError> {
    let status = state.status.get_status()?;
    Ok(Json(StationListResponse::from_stations(&status.snapshot.stations)).into_response())
}

// Error handling

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No poll has succeeded yet
    NoDataAvailable { last_error: Option<String> },
}

impl From<StatusError> for AppError {
    fn from(e: StatusError) -> Self {
        match e {
            StatusError::NoDataAvailable { last_error } => AppError::NoDataAvailable {
                last_error: last_error.map(|err| err.to_string()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NoDataAvailable { last_error } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: "no station data available yet".to_string(),
                    last_error,
                },
            ),
        };

        warn!(
            status = status.as_u16(),
            error = %body.error,
            last_error = ?body.last_error,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}
