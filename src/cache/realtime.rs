// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use crate::cache::layer::SnapshotCache;
use crate::cache::traits::LiveSource;
use crate::error::DataError;
use crate::registry::CollectionName;
use crate::snapshot::{RemoteRecord, Snapshot};

pub const DEFAULT_REALTIME_TTL: Duration = Duration::from_secs(2 * 60);

/// Read-through cache in front of the live query API.
///
/// Bulk reads share one aggregate fetch per TTL window. High-churn
/// collections are fetched on every read. When the live API fails, the last
/// snapshot we have is served no matter how old it is.
#[derive(Clone)]
pub struct RealtimeCache {
    source: Arc<dyn LiveSource>,
    cache: SnapshotCache,
}

impl RealtimeCache {
    pub fn new(source: Arc<dyn LiveSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(ttl),
        }
    }

    /// Aggregate snapshot, falling back to stale data on failure.
    ///
    /// Errors only when the live fetch failed and nothing was ever cached.
    pub async fn read_snapshot(&self) -> Result<Arc<Snapshot>, DataError> {
        let source = Arc::clone(&self.source);
        let read = self
            .cache
            .get_or_fetch(move || async move { source.fetch_all().await })
            .await;

        match read {
            Ok(read) => Ok(read.into_snapshot()),
            Err(failure) => match failure.stale {
                Some(stale) => {
                    warn!(error = %failure.error, "Live fetch failed, serving expired cache");
                    Ok(stale)
                }
                None => {
                    warn!(error = %failure.error, "Live fetch failed and no cached data exists");
                    Err(DataError::RealtimeUnavailable(failure.error.to_string()))
                }
            },
        }
    }

    /// Records of one collection. High-churn collections skip the bulk cache.
    pub async fn read_collection(&self, name: CollectionName) -> Result<Vec<RemoteRecord>, DataError> {
        if !name.is_high_churn() {
            return Ok(self.read_snapshot().await?.records(name).to_vec());
        }

        debug!(collection = %name, "Fetching high-churn collection directly");
        match self.source.fetch_collection(name).await {
            Ok(records) => Ok(records),
            Err(e) => {
                // Fall back to whatever the last aggregate fetch had
                match self.cache.peek() {
                    Some(stale) if stale.get(name).is_some() => {
                        warn!(collection = %name, error = %e, "Direct fetch failed, serving cached collection");
                        Ok(stale.records(name).to_vec())
                    }
                    _ => {
                        warn!(collection = %name, error = %e, "Direct fetch failed and no cached collection exists");
                        Err(DataError::RealtimeUnavailable(format!("{}: {:#}", name, e)))
                    }
                }
            }
        }
    }

    /// Aggregate snapshot; empty when nothing can be loaded
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.read_snapshot()
            .await
            .unwrap_or_else(|_| Arc::new(Snapshot::default()))
    }

    /// Records of one collection; empty when nothing can be loaded
    pub async fn get_collection_data(&self, name: CollectionName) -> Vec<RemoteRecord> {
        self.read_collection(name).await.unwrap_or_default()
    }

    pub async fn get_last_update_time(&self) -> Option<DateTime<Utc>> {
        self.snapshot().await.last_updated()
    }

    /// Forget the cached snapshot so the next read goes to the live API
    pub fn invalidate(&self) {
        info!("Clearing realtime cache");
        self.cache.invalidate();
    }

    /// Invalidate and re-populate from the live API
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, DataError> {
        self.invalidate();
        self.read_snapshot().await
    }
}
