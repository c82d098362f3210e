//! Upstream feed adapter and its revalidation cache.
//!
//! The upstream provider returns the whole market as one JSON array. The
//! `FeedCache` keeps the last successful pull as an explicit entry
//! `{snapshot, fetched_at}` and only goes back to the provider once that entry
//! is stale. Failures are never cached and never retried here: the caller
//! sees `FeedError::RateLimited` or `FeedError::FetchFailed` and decides.
//!
//! Design notes:
//! - The cache entry sits behind a `tokio::sync::Mutex` that is held across the
//!   upstream request, so concurrent requests arriving while the entry is
//!   stale wait for one refresh instead of each hitting the provider.
//! - Records are normalized once per refresh; queries only filter, sort and
//!   slice the shared rows.
//! - Reporting fields live in a separate `RwLock` so health checks never wait
//!   on an upstream request.
//! - Staleness uses `Instant` (monotonic); the UTC timestamp is kept only for
//!   reporting.
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde_json::Value;
use stock_common::{DisplayRecord, RawRecord, StockError};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::model::normalizer::normalize_snapshot;

/// Failure of a snapshot pull.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The provider answered HTTP 429.
    #[error("upstream rate limit reached")]
    RateLimited,
    /// Transport failure, non-success status or undecodable body.
    #[error("upstream fetch failed: {0}")]
    FetchFailed(String),
}

impl From<FeedError> for StockError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::RateLimited => StockError::RateLimited(err.to_string()),
            FeedError::FetchFailed(reason) => StockError::FetchFailed(reason),
        }
    }
}

/// Source of full market snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Pulls the current snapshot from the provider.
    async fn fetch_snapshot(&self) -> Result<Vec<RawRecord>, FeedError>;
}

/// Snapshot source backed by an HTTP GET returning a JSON array.
pub struct HttpSnapshotSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    /// Creates a source for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StockError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Vec<RawRecord>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }
        if !status.is_success() {
            return Err(FeedError::FetchFailed(format!("upstream status {}", status)));
        }

        let values: Vec<Value> = response
            .json()
            .await
            .map_err(|e| FeedError::FetchFailed(format!("invalid upstream body: {}", e)))?;
        Ok(decode_snapshot(values))
    }
}

/// Decodes upstream array elements into records, skipping elements that are
/// not record-shaped.
pub fn decode_snapshot(values: Vec<Value>) -> Vec<RawRecord> {
    let total = values.len();
    let records: Vec<RawRecord> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<RawRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Skipping upstream element: {}", e);
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!(
            "Skipped {} of {} upstream elements that were not records",
            total - records.len(),
            total
        );
    }
    records
}

/// A successful pull, normalized once and shared between requests.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Eligible records in upstream order, with derived fields.
    pub rows: Arc<Vec<DisplayRecord>>,
    /// When the pull completed.
    pub fetched_at: DateTime<Utc>,
}

struct CacheEntry {
    snapshot: Snapshot,
    fetched_at: Instant,
}

/// What `/health` reports about the cache; readable while a refresh runs.
#[derive(Debug, Clone, Copy)]
struct CacheStatus {
    fetched_at: DateTime<Utc>,
    loaded_at: Instant,
    rows: usize,
}

fn is_stale(loaded_at: Instant, now: Instant, window: Duration) -> bool {
    now.saturating_duration_since(loaded_at) >= window
}

/// Process-wide snapshot cache with a fixed revalidation window.
pub struct FeedCache {
    source: Arc<dyn SnapshotSource>,
    revalidate: Duration,
    entry: Mutex<Option<CacheEntry>>,
    status: RwLock<Option<CacheStatus>>,
}

impl FeedCache {
    /// Creates an empty cache over `source`.
    pub fn new(source: Arc<dyn SnapshotSource>, revalidate: Duration) -> Self {
        Self {
            source,
            revalidate,
            entry: Mutex::new(None),
            status: RwLock::new(None),
        }
    }

    /// Current snapshot, refreshed from the provider if the cached one is stale.
    pub async fn snapshot(&self) -> Result<Snapshot, FeedError> {
        self.snapshot_at(Instant::now()).await
    }

    /// Same as [`Self::snapshot`], evaluated at `now`.
    pub async fn snapshot_at(&self, now: Instant) -> Result<Snapshot, FeedError> {
        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry.as_ref() {
            if !is_stale(cached.fetched_at, now, self.revalidate) {
                debug!("Serving cached snapshot from {}", cached.snapshot.fetched_at);
                return Ok(cached.snapshot.clone());
            }
        }

        let records = self.source.fetch_snapshot().await.inspect_err(|e| {
            warn!("Upstream snapshot refresh failed: {}", e);
        })?;
        let total = records.len();
        let rows = normalize_snapshot(records);
        info!(
            "Upstream snapshot refreshed: {} records, {} eligible",
            total,
            rows.len()
        );

        let snapshot = Snapshot {
            rows: Arc::new(rows),
            fetched_at: Utc::now(),
        };
        *entry = Some(CacheEntry {
            snapshot: snapshot.clone(),
            fetched_at: now,
        });
        *self.status.write().await = Some(CacheStatus {
            fetched_at: snapshot.fetched_at,
            loaded_at: now,
            rows: snapshot.rows.len(),
        });
        Ok(snapshot)
    }

    /// Whether the cached entry (if any) is stale at `now`. Does not wait for
    /// a refresh in progress.
    pub async fn is_stale(&self, now: Instant) -> bool {
        self.status
            .read()
            .await
            .is_none_or(|status| is_stale(status.loaded_at, now, self.revalidate))
    }

    /// Time and row count of the cached snapshot, without refreshing it or
    /// waiting for a refresh in progress.
    pub async fn cached_info(&self) -> Option<(DateTime<Utc>, usize)> {
        self.status
            .read()
            .await
            .map(|status| (status.fetched_at, status.rows))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source counting how often it is asked.
    pub(crate) struct FakeSource {
        pub(crate) result: std::sync::Mutex<Result<Vec<RawRecord>, FeedError>>,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn new(result: Result<Vec<RawRecord>, FeedError>) -> Self {
            Self {
                result: std::sync::Mutex::new(result),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn set(&self, result: Result<Vec<RawRecord>, FeedError>) {
            *self.result.lock().unwrap() = result;
        }
    }

    #[async_trait]
    impl SnapshotSource for FakeSource {
        async fn fetch_snapshot(&self) -> Result<Vec<RawRecord>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.lock().unwrap().clone()
        }
    }

    fn record(symbol: &str) -> RawRecord {
        RawRecord {
            symbol: Some(symbol.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_refetch() {
        let source = Arc::new(FakeSource::new(Ok(vec![record("A"), record("B")])));
        let cache = FeedCache::new(source.clone(), Duration::from_secs(1800));
        let t0 = Instant::now();

        let first = cache.snapshot_at(t0).await.unwrap();
        let second = cache.snapshot_at(t0 + Duration::from_secs(60)).await.unwrap();

        assert_eq!(first.rows.len(), 2);
        assert!(Arc::ptr_eq(&first.rows, &second.rows));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!cache.is_stale(t0 + Duration::from_secs(1799)).await);
    }

    #[tokio::test]
    async fn stale_entry_is_refetched_once() {
        let source = Arc::new(FakeSource::new(Ok(vec![record("A")])));
        let cache = FeedCache::new(source.clone(), Duration::from_secs(1800));
        let t0 = Instant::now();
        cache.snapshot_at(t0).await.unwrap();

        source.set(Ok(vec![record("A"), record("B"), record("C")]));
        let later = t0 + Duration::from_secs(1800);
        assert!(cache.is_stale(later).await);

        let refreshed = cache.snapshot_at(later).await.unwrap();
        cache.snapshot_at(later + Duration::from_secs(1)).await.unwrap();
        assert_eq!(refreshed.rows.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_propagate_and_are_not_cached() {
        let source = Arc::new(FakeSource::new(Err(FeedError::RateLimited)));
        let cache = FeedCache::new(source.clone(), Duration::from_secs(1800));
        let t0 = Instant::now();

        assert_eq!(cache.snapshot_at(t0).await.unwrap_err(), FeedError::RateLimited);
        assert!(cache.cached_info().await.is_none());

        source.set(Ok(vec![record("A")]));
        let snapshot = cache.snapshot_at(t0).await.unwrap();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_info().await.map(|(_, n)| n), Some(1));
    }

    #[test]
    fn decode_skips_non_record_elements() {
        let records = decode_snapshot(vec![
            json!({"l18": "A", "tvol": 10}),
            json!(42),
            json!({"l18": "B"}),
        ]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].symbol.as_deref(), Some("B"));
    }

    #[test]
    fn feed_errors_map_onto_shared_taxonomy() {
        assert!(StockError::from(FeedError::RateLimited).is_rate_limited());
        assert!(matches!(
            StockError::from(FeedError::FetchFailed("boom".into())),
            StockError::FetchFailed(_)
        ));
    }

    /// Holds every fetch until released.
    struct GatedSource {
        gate: tokio::sync::Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotSource for GatedSource {
        async fn fetch_snapshot(&self) -> Result<Vec<RawRecord>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(vec![record("A"), record("B")])
        }
    }

    #[tokio::test]
    async fn status_is_readable_while_a_refresh_is_in_flight() {
        let source = Arc::new(GatedSource {
            gate: tokio::sync::Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(FeedCache::new(source.clone(), Duration::from_secs(1800)));

        let refresh = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.snapshot().await }
        });
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let info = tokio::time::timeout(Duration::from_millis(200), cache.cached_info()).await;
        assert_eq!(info, Ok(None));
        let stale = tokio::time::timeout(Duration::from_millis(200), cache.is_stale(Instant::now())).await;
        assert_eq!(stale, Ok(true));

        source.gate.notify_one();
        let snapshot = refresh.await.unwrap().unwrap();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(cache.cached_info().await.map(|(_, n)| n), Some(2));
    }

    #[tokio::test]
    async fn ineligible_records_are_dropped_at_refresh() {
        let dotted = RawRecord {
            name: Some("Fund.X".into()),
            ..record("F")
        };
        let source = Arc::new(FakeSource::new(Ok(vec![record("A"), dotted])));
        let cache = FeedCache::new(source, Duration::from_secs(1800));

        let snapshot = cache.snapshot().await.unwrap();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].symbol.as_deref(), Some("A"));
    }
}
