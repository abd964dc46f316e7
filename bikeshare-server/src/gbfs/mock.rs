//! Mock feed for running without upstream access.
//!
//! Serves `station_information.json` and `station_status.json` from a
//! directory as if they were live responses. Files are re-read on every
//! fetch, so editing them simulates upstream changes.

use std::path::{Path, PathBuf};

use super::FeedSource;
use super::client::{STATION_INFORMATION, STATION_STATUS};
use super::error::FeedError;
use super::types::{FeedDocument, RawFeed};

/// Mock feed that serves documents from JSON files.
#[derive(Debug, Clone)]
pub struct MockFeed {
    data_dir: PathBuf,
}

impl MockFeed {
    /// Create a mock feed reading from `data_dir`.
    ///
    /// Fails if either document is missing, so misconfiguration shows up at
    /// startup rather than on the first poll.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let data_dir = data_dir.as_ref().to_path_buf();

        for document in [STATION_INFORMATION, STATION_STATUS] {
            let path = data_dir.join(document);
            if !path.is_file() {
                return Err(FeedError::http(format!(
                    "mock feed document not found: {}",
                    path.display()
                )));
            }
        }

        Ok(Self { data_dir })
    }

    async fn read_document(&self, document: &str) -> Result<FeedDocument, FeedError> {
        let path = self.data_dir.join(document);
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FeedError::http(format!("failed to read {}: {}", path.display(), e)))?;

        FeedDocument::from_json(&body)
            .map_err(|e| FeedError::parse(format!("{}: {}", path.display(), e)))
    }
}

impl FeedSource for MockFeed {
    async fn fetch_raw(&self) -> Result<RawFeed, FeedError> {
        let information = self.read_document(STATION_INFORMATION).await?;
        let status = self.read_document(STATION_STATUS).await?;

        Ok(RawFeed {
            information,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbfs::FeedErrorKind;
    use tempfile::tempdir;

    const INFORMATION: &str = r#"{
        "last_updated": 1700000000,
        "ttl": 5,
        "data": {"stations": [
            {"station_id": "A", "name": "Alpha", "lat": 40.8, "lon": -73.96, "capacity": 20}
        ]}
    }"#;

    const STATUS: &str = r#"{
        "last_updated": 1700000000,
        "ttl": 5,
        "data": {"stations": [
            {"station_id": "A", "num_bikes_available": 15, "num_docks_available": 5,
             "is_installed": 1, "is_renting": 1, "is_returning": 1,
             "last_reported": 1699999990}
        ]}
    }"#;

    #[tokio::test]
    async fn serves_documents_from_disk() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STATION_INFORMATION), INFORMATION).unwrap();
        std::fs::write(dir.path().join(STATION_STATUS), STATUS).unwrap();

        let feed = MockFeed::new(dir.path()).unwrap();
        let raw = feed.fetch_raw().await.unwrap();

        assert_eq!(raw.information.stations.len(), 1);
        assert_eq!(raw.status.stations.len(), 1);
        assert_eq!(raw.status.ttl, Some(5));
    }

    #[tokio::test]
    async fn malformed_document_is_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STATION_INFORMATION), INFORMATION).unwrap();
        std::fs::write(dir.path().join(STATION_STATUS), STATUS).unwrap();

        let feed = MockFeed::new(dir.path()).unwrap();
        std::fs::write(dir.path().join(STATION_STATUS), "{not json").unwrap();

        let err = feed.fetch_raw().await.unwrap_err();
        assert_eq!(err.kind, FeedErrorKind::ParseError);
    }

    #[test]
    fn missing_document_fails_at_creation() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STATION_INFORMATION), INFORMATION).unwrap();

        assert!(MockFeed::new(dir.path()).is_err());
    }

    #[tokio::test]
    async fn bundled_sample_feed_covers_every_state() {
        use crate::domain::StationState;
        use crate::reconcile::Reconciler;

        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/mock_feed");
        let raw = MockFeed::new(dir).unwrap().fetch_raw().await.unwrap();

        let reconciled =
            Reconciler::new().reconcile(&raw.information.stations, &raw.status.stations);
        let states: Vec<_> = reconciled.stations.iter().map(|s| s.state()).collect();

        assert_eq!(
            states,
            vec![
                StationState::Available,
                StationState::Empty,
                StationState::Low,
                StationState::Offline,
            ]
        );
        assert_eq!(reconciled.dropped_records, 0);
    }
}
