//! Server configuration.
//!
//! Loaded from environment variables (and a `.env` file, if present) with
//! defaults suitable for local development against the Citi Bike feed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::gbfs::FeedConfig;
use crate::scheduler::DEFAULT_POLL_INTERVAL;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },

    /// Only one half of the API key pair was set
    #[error("{set} is set but {missing} is not")]
    Incomplete {
        set: &'static str,
        missing: &'static str,
    },
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upstream feed access
    pub feed: FeedConfig,

    /// How often the scheduler polls the feed
    pub poll_interval: Duration,

    /// Restrict the snapshot to these station ids or short names
    pub station_filter: Option<Vec<String>>,

    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,

    /// Directory of precomputed chart and summary documents
    pub artifacts_dir: PathBuf,

    /// Serve the feed from files in this directory instead of the network
    pub mock_feed_dir: Option<PathBuf>,

    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using `lookup` to read variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut feed = match var("BIKESHARE_FEED_URL") {
            Some(url) => FeedConfig::new(url),
            None => FeedConfig::default(),
        };

        if let Some(secs) = var("BIKESHARE_FEED_TIMEOUT_SECS") {
            feed = feed.with_timeout(Duration::from_secs(parse_secs(
                "BIKESHARE_FEED_TIMEOUT_SECS",
                &secs,
            )?));
        }

        match (var("BIKESHARE_API_KEY_HEADER"), var("BIKESHARE_API_KEY")) {
            (Some(header), Some(key)) => {
                validate_api_key(&header, &key)?;
                feed = feed.with_api_key(header, key);
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    set: "BIKESHARE_API_KEY_HEADER",
                    missing: "BIKESHARE_API_KEY",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    set: "BIKESHARE_API_KEY",
                    missing: "BIKESHARE_API_KEY_HEADER",
                });
            }
        }

        let poll_interval = match var("BIKESHARE_POLL_INTERVAL_SECS") {
            Some(secs) => Duration::from_secs(parse_secs("BIKESHARE_POLL_INTERVAL_SECS", &secs)?),
            None => DEFAULT_POLL_INTERVAL,
        };

        let station_filter = var("BIKESHARE_STATION_IDS")
            .map(|ids| split_list(&ids))
            .filter(|ids| !ids.is_empty());

        let bind_addr_str = var("BIKESHARE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIKESHARE_BIND_ADDR",
                message: format!("{bind_addr_str}: {e}"),
            })?;

        let allowed_origins = split_list(
            &var("BIKESHARE_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.into()),
        );

        let artifacts_dir = var("BIKESHARE_ARTIFACTS_DIR")
            .unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.into())
            .into();

        let mock_feed_dir = var("BIKESHARE_MOCK_FEED_DIR").map(PathBuf::from);

        let log_level = var("BIKESHARE_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into());

        Ok(Self {
            feed,
            poll_interval,
            station_filter,
            bind_addr,
            allowed_origins,
            artifacts_dir,
            mock_feed_dir,
            log_level,
        })
    }
}

/// Parse a positive number of seconds.
fn parse_secs(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            message: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::Invalid {
            name,
            message: format!("{value}: {e}"),
        }),
    }
}

/// Reject API key settings that cannot be sent as an HTTP header.
fn validate_api_key(header: &str, key: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(header.as_bytes()).map_err(|e| ConfigError::Invalid {
        name: "BIKESHARE_API_KEY_HEADER",
        message: format!("{header}: {e}"),
    })?;
    HeaderValue::from_str(key).map_err(|e| ConfigError::Invalid {
        name: "BIKESHARE_API_KEY",
        message: e.to_string(),
    })?;
    Ok(())
}

/// Split a comma-separated list, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.feed.base_url, "https://gbfs.citibikenyc.com/gbfs/en");
        assert_eq!(config.feed.timeout, Duration::from_secs(10));
        assert!(config.feed.api_key.is_none());
        assert_eq!(config.poll_interval, Duration::from_secs(300));
        assert!(config.station_filter.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert!(config.mock_feed_dir.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("BIKESHARE_FEED_URL", "http://localhost:9000/gbfs"),
            ("BIKESHARE_FEED_TIMEOUT_SECS", "3"),
            ("BIKESHARE_POLL_INTERVAL_SECS", "60"),
            ("BIKESHARE_STATION_IDS", "7783.18, 7741.04,,"),
            ("BIKESHARE_API_KEY_HEADER", "x-apikey"),
            ("BIKESHARE_API_KEY", "secret"),
            ("BIKESHARE_BIND_ADDR", "0.0.0.0:9999"),
            ("BIKESHARE_MOCK_FEED_DIR", "data/mock_feed"),
        ]))
        .unwrap();

        assert_eq!(config.feed.base_url, "http://localhost:9000/gbfs");
        assert_eq!(config.feed.timeout, Duration::from_secs(3));
        assert_eq!(
            config.feed.api_key,
            Some(("x-apikey".to_string(), "secret".to_string()))
        );
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(
            config.station_filter,
            Some(vec!["7783.18".to_string(), "7741.04".to_string()])
        );
        assert_eq!(config.bind_addr.port(), 9999);
        assert_eq!(config.mock_feed_dir, Some(PathBuf::from("data/mock_feed")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("BIKESHARE_STATION_IDS", " "),
            ("BIKESHARE_POLL_INTERVAL_SECS", ""),
        ]))
        .unwrap();

        assert!(config.station_filter.is_none());
        assert_eq!(config.poll_interval, Duration::from_secs(300));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = ServerConfig::from_lookup(lookup(&[("BIKESHARE_POLL_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("BIKESHARE_POLL_INTERVAL_SECS"));

        let err = ServerConfig::from_lookup(lookup(&[("BIKESHARE_FEED_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let err =
            ServerConfig::from_lookup(lookup(&[("BIKESHARE_BIND_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "BIKESHARE_BIND_ADDR",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unusable_api_key() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("BIKESHARE_API_KEY_HEADER", "x api key"),
            ("BIKESHARE_API_KEY", "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "BIKESHARE_API_KEY_HEADER",
                ..
            }
        ));

        let err = ServerConfig::from_lookup(lookup(&[
            ("BIKESHARE_API_KEY_HEADER", "x-apikey"),
            ("BIKESHARE_API_KEY", "line\nbreak"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "BIKESHARE_API_KEY",
                ..
            }
        ));
    }

    #[test]
    fn api_key_needs_both_halves() {
        let err =
            ServerConfig::from_lookup(lookup(&[("BIKESHARE_API_KEY", "secret")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "BIKESHARE_API_KEY is set but BIKESHARE_API_KEY_HEADER is not"
        );
    }
}
