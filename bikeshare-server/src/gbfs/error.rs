//! Feed client error types.

use std::fmt;

use serde::Serialize;

/// Category of a failed feed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedErrorKind {
    /// Upstream did not respond within the configured timeout.
    Timeout,
    /// Upstream responded with a failure status, or could not be reached.
    HttpError,
    /// Response body was not a well-formed feed document.
    ParseError,
    /// The poll itself failed locally, e.g. the refresh task panicked.
    Internal,
}

impl fmt::Display for FeedErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedErrorKind::Timeout => write!(f, "timeout"),
            FeedErrorKind::HttpError => write!(f, "HTTP error"),
            FeedErrorKind::ParseError => write!(f, "parse error"),
            FeedErrorKind::Internal => write!(f, "internal error"),
        }
    }
}

/// A failed fetch of the upstream feed.
///
/// Cloneable so that a single failure can be shared with every caller
/// waiting on the same refresh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct FeedError {
    pub kind: FeedErrorKind,
    pub detail: String,
}

impl FeedError {
    pub fn new(kind: FeedErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FeedErrorKind::Timeout, detail)
    }

    pub fn http(detail: impl Into<String>) -> Self {
        Self::new(FeedErrorKind::HttpError, detail)
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::new(FeedErrorKind::ParseError, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(FeedErrorKind::Internal, detail)
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::parse(err.to_string())
        } else {
            FeedError::http(err.to_string())
        }
    }
}
