// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::cache::layer::SnapshotCache;
use crate::registry::CollectionName;
use crate::snapshot::{RemoteRecord, Snapshot, SnapshotSource};

pub const DEFAULT_STATIC_TTL: Duration = Duration::from_secs(5 * 60);

/// Read-through cache over the persisted snapshot document.
///
/// Never fails: if the document can't be loaded, readers get an empty
/// snapshot.
#[derive(Clone)]
pub struct StaticCache {
    source: Arc<dyn SnapshotSource>,
    cache: SnapshotCache,
}

impl StaticCache {
    pub fn new(source: Arc<dyn SnapshotSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(ttl),
        }
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        let source = Arc::clone(&self.source);
        let read = self
            .cache
            .get_or_fetch(move || async move { source.load().await })
            .await;

        match read {
            Ok(read) => read.into_snapshot(),
            Err(failure) => {
                warn!(
                    location = %self.source.location(),
                    error = %failure.error,
                    "Failed to load snapshot, serving empty data"
                );
                Arc::new(Snapshot::default())
            }
        }
    }

    pub async fn get_collection_data(&self, name: CollectionName) -> Vec<RemoteRecord> {
        self.snapshot().await.records(name).to_vec()
    }

    pub async fn get_last_update_time(&self) -> Option<DateTime<Utc>> {
        self.snapshot().await.last_updated()
    }

    pub fn invalidate(&self) {
        info!(location = %self.source.location(), "Clearing static snapshot cache");
        self.cache.invalidate();
    }

    /// Drop the cached snapshot and load it again
    pub async fn refresh(&self) -> Arc<Snapshot> {
        self.invalidate();
        self.snapshot().await
    }
}
