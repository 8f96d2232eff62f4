use crate::domain::model::CacheRecord;
use crate::domain::ports::{Storage, TableFetcher};

/// Table compiled into the binary, used by the snapshot mode.
pub const SNAPSHOT_TABLE: &str = include_str!("../../data/japanpost_snapshot.md");

pub const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub file_name: String,
    pub expiry_seconds: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            file_name: "ems_status_cache.json".to_string(),
            expiry_seconds: 24 * SECONDS_PER_HOUR,
        }
    }
}

/// Where the raw table text comes from.
pub enum TableProvider<S: Storage, F: TableFetcher> {
    Snapshot(String),
    Live {
        fetcher: F,
        /// `None` disables the cache.
        cache: Option<(S, CacheSettings)>,
    },
}

impl<S: Storage, F: TableFetcher> TableProvider<S, F> {
    pub fn snapshot() -> Self {
        TableProvider::Snapshot(SNAPSHOT_TABLE.to_string())
    }

    pub fn live(fetcher: F, storage: S, settings: CacheSettings) -> Self {
        TableProvider::Live {
            fetcher,
            cache: Some((storage, settings)),
        }
    }

    pub fn live_uncached(fetcher: F) -> Self {
        TableProvider::Live {
            fetcher,
            cache: None,
        }
    }

    pub async fn get_latest_table(&self) -> Option<String> {
        self.get_latest_table_at(chrono::Utc::now().timestamp()).await
    }

    /// Fresh cache first, then a live fetch, then any cache at all.
    pub async fn get_latest_table_at(&self, now: i64) -> Option<String> {
        let (fetcher, cache) = match self {
            TableProvider::Snapshot(text) => {
                tracing::info!("Using the embedded status snapshot");
                return Some(text.clone());
            }
            TableProvider::Live { fetcher, cache } => (fetcher, cache),
        };

        let cached = match cache {
            Some((storage, settings)) => read_cache(storage, &settings.file_name).await,
            None => None,
        };

        if let (Some(record), Some((_, settings))) = (&cached, cache) {
            if record.is_fresh(now, settings.expiry_seconds) {
                tracing::info!(
                    "Using cached status table ({}s old)",
                    record.age_seconds(now).unwrap_or_default()
                );
                return Some(record.status.clone());
            }
            tracing::info!(
                "Cached status table is stale or misdated (timestamp {}), fetching",
                format_timestamp(record.timestamp)
            );
        }

        match fetcher.fetch_table().await {
            Ok(status) => {
                tracing::info!("Fetched live status table");
                if let Some((storage, settings)) = cache {
                    write_cache(storage, &settings.file_name, &status, now).await;
                }
                Some(status)
            }
            Err(e) => {
                tracing::warn!("Fetching the status table failed: {}", e);
                match cached {
                    Some(record) => {
                        tracing::warn!(
                            "Falling back to cached table from {}",
                            format_timestamp(record.timestamp)
                        );
                        Some(record.status)
                    }
                    None => None,
                }
            }
        }
    }
}

async fn read_cache<S: Storage>(storage: &S, file_name: &str) -> Option<CacheRecord> {
    let bytes = match storage.read_file(file_name).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("No cache available: {}", e);
            return None;
        }
    };

    match serde_json::from_slice::<CacheRecord>(&bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Ignoring unreadable cache file {}: {}", file_name, e);
            None
        }
    }
}

async fn write_cache<S: Storage>(storage: &S, file_name: &str, status: &str, now: i64) {
    let record = CacheRecord {
        status: status.to_string(),
        timestamp: now,
    };

    let result = match serde_json::to_vec_pretty(&record) {
        Ok(data) => storage.write_file(file_name, &data).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => tracing::debug!("Cache written to {}", file_name),
        Err(e) => tracing::warn!("Could not write cache {}: {}", file_name, e),
    }
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{NotifyError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                NotifyError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.put(path, data).await;
            Ok(())
        }
    }

    struct MockFetcher {
        result: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl MockFetcher {
        fn ok(text: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fetcher = Self {
                result: Some(text.to_string()),
                calls: calls.clone(),
            };
            (fetcher, calls)
        }

        fn failing() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fetcher = Self {
                result: None,
                calls: calls.clone(),
            };
            (fetcher, calls)
        }
    }

    #[async_trait]
    impl TableFetcher for MockFetcher {
        async fn fetch_table(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().ok_or_else(|| NotifyError::TableNotFound {
                url: "mock".to_string(),
            })
        }
    }

    const NOW: i64 = 1_700_000_000;

    async fn storage_with(status: &str, timestamp: i64) -> MockStorage {
        let storage = MockStorage::default();
        let record = CacheRecord {
            status: status.to_string(),
            timestamp,
        };
        storage
            .put(
                &CacheSettings::default().file_name,
                &serde_json::to_vec(&record).unwrap(),
            )
            .await;
        storage
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let storage = storage_with("cached", NOW - 3600).await;
        let (fetcher, calls) = MockFetcher::ok("live");
        let provider = TableProvider::live(fetcher, storage, CacheSettings::default());

        let table = provider.get_latest_table_at(NOW).await;

        assert_eq!(table.as_deref(), Some("cached"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_triggers_fetch_and_rewrite() {
        let storage = storage_with("cached", NOW - 25 * 3600).await;
        let (fetcher, calls) = MockFetcher::ok("live");
        let provider = TableProvider::live(fetcher, storage.clone(), CacheSettings::default());

        let table = provider.get_latest_table_at(NOW).await;

        assert_eq!(table.as_deref(), Some("live"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let written = storage
            .get_file(&CacheSettings::default().file_name)
            .await
            .unwrap();
        let record: CacheRecord = serde_json::from_slice(&written).unwrap();
        assert_eq!(record.status, "live");
        assert_eq!(record.timestamp, NOW);
    }

    #[tokio::test]
    async fn test_misdated_cache_triggers_fetch() {
        for timestamp in [i64::MIN, NOW + 7 * 24 * 3600] {
            let storage = storage_with("cached", timestamp).await;
            let (fetcher, calls) = MockFetcher::ok("live");
            let provider = TableProvider::live(fetcher, storage, CacheSettings::default());

            let table = provider.get_latest_table_at(NOW).await;

            assert_eq!(table.as_deref(), Some("live"));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_stale_cache() {
        let storage = storage_with("stale", NOW - 30 * 24 * 3600).await;
        let (fetcher, calls) = MockFetcher::failing();
        let provider = TableProvider::live(fetcher, storage, CacheSettings::default());

        let table = provider.get_latest_table_at(NOW).await;

        assert_eq!(table.as_deref(), Some("stale"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_cache_and_failed_fetch_yields_nothing() {
        let (fetcher, _) = MockFetcher::failing();
        let provider = TableProvider::live(fetcher, MockStorage::default(), CacheSettings::default());

        assert_eq!(provider.get_latest_table_at(NOW).await, None);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_ignored() {
        let storage = MockStorage::default();
        storage
            .put(&CacheSettings::default().file_name, b"{not json")
            .await;
        let (fetcher, calls) = MockFetcher::ok("live");
        let provider = TableProvider::live(fetcher, storage, CacheSettings::default());

        assert_eq!(provider.get_latest_table_at(NOW).await.as_deref(), Some("live"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncached_always_fetches() {
        let (fetcher, calls) = MockFetcher::ok("live");
        let provider: TableProvider<MockStorage, _> = TableProvider::live_uncached(fetcher);

        provider.get_latest_table_at(NOW).await;
        provider.get_latest_table_at(NOW).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_snapshot_contains_status_rows() {
        let provider: TableProvider<MockStorage, MockFetcher> = TableProvider::snapshot();

        let table = provider.get_latest_table_at(NOW).await.unwrap();
        assert!(table.contains("中華人民共和国"));
        assert!(table.contains("EMS"));
    }
}
