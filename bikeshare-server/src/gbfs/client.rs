//! GBFS HTTP client.
//!
//! Fetches the station information and station status documents. Retry
//! policy belongs to the refresh scheduler; this client makes exactly one
//! attempt per document.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::FeedSource;
use super::error::{FeedError, FeedErrorKind};
use super::types::{FeedDocument, RawFeed};

/// Default base URL for the feed (Citi Bike, English).
const DEFAULT_BASE_URL: &str = "https://gbfs.citibikenyc.com/gbfs/en";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Document holding near-static station metadata.
pub const STATION_INFORMATION: &str = "station_information.json";

/// Document holding dynamic station status.
pub const STATION_STATUS: &str = "station_status.json";

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL the two documents live under
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Optional API key as (header name, value)
    pub api_key: Option<(String, String)>,
}

impl FeedConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            api_key: None,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send an API key header with every request.
    pub fn with_api_key(mut self, header: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_key = Some((header.into(), key.into()));
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Client for a GBFS feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl FeedClient {
    /// Create a new feed client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();

        if let Some((name, key)) = &config.api_key {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FeedError::internal(format!("invalid API key header name: {name}")))?;
            let value = HeaderValue::from_str(key)
                .map_err(|_| FeedError::internal("invalid API key format"))?;
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    /// Fetch and parse one feed document.
    pub async fn fetch_document(&self, document: &str) -> Result<FeedDocument, FeedError> {
        let url = format!("{}/{}", self.base_url, document);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.describe(document, e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::http(format!(
                "{document}: status {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.describe(document, e))?;

        FeedDocument::from_json(&body).map_err(|e| {
            FeedError::parse(format!(
                "{document}: {e} (body: {})",
                body.chars().take(200).collect::<String>()
            ))
        })
    }

    /// Attach the document name (and timeout, if relevant) to a transport error.
    fn describe(&self, document: &str, err: reqwest::Error) -> FeedError {
        let mut feed_err = FeedError::from(err);
        feed_err.detail = match feed_err.kind {
            FeedErrorKind::Timeout => {
                format!("{document}: no response within {:?}", self.timeout)
            }
            _ => format!("{document}: {}", feed_err.detail),
        };
        feed_err
    }
}

impl FeedSource for FeedClient {
    /// Fetch both documents concurrently; either failing fails the call.
    async fn fetch_raw(&self) -> Result<RawFeed, FeedError> {
        let (information, status) = tokio::try_join!(
            self.fetch_document(STATION_INFORMATION),
            self.fetch_document(STATION_STATUS)
        )?;

        Ok(RawFeed {
            information,
            status,
        })
    }
}
