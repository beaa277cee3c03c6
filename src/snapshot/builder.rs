// SPDX-License-Identifier: GPL-3.0-only
use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use crate::registry::{CollectionName, CollectionRegistry, RemoteId};
use crate::remote::{fetch_all_pages, PageLimits, QueryService};
use crate::snapshot::models::{CollectionResult, RemoteRecord, Snapshot};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Fans the paginated fetch out over every registered collection.
#[derive(Clone)]
pub struct SnapshotBuilder {
    service: Arc<dyn QueryService>,
    limits: PageLimits,
    fetch_timeout: Duration,
}

impl SnapshotBuilder {
    pub fn new(service: Arc<dyn QueryService>, limits: PageLimits, fetch_timeout: Duration) -> Self {
        Self {
            service,
            limits,
            fetch_timeout,
        }
    }

    /// Fetch every collection concurrently and wait for all of them to settle.
    ///
    /// A failing or timed-out collection becomes an empty entry carrying the
    /// error; it never cancels its siblings.
    pub async fn build_snapshot(&self, registry: &CollectionRegistry) -> Snapshot {
        info!(collections = registry.len(), "Building snapshot");

        let fetches = registry
            .iter()
            .map(|(name, remote_id)| self.fetch_collection(name, remote_id));
        let snapshot = Snapshot::from_results(join_all(fetches).await);

        info!(
            collections = snapshot.len(),
            records = snapshot.record_count(),
            failed = snapshot.failed().count(),
            "Snapshot built"
        );
        snapshot
    }

    /// Fetch one collection and stamp the result when it settles
    pub async fn fetch_collection(&self, name: CollectionName, remote_id: &RemoteId) -> CollectionResult {
        info!(collection = %name, "Fetching collection");

        match self.fetch_records(remote_id).await {
            Ok(records) => {
                info!(collection = %name, count = records.len(), "Fetched collection");
                CollectionResult::success(name, records, Utc::now())
            }
            Err(e) => {
                error!(collection = %name, error = %e, "Failed to fetch collection");
                CollectionResult::failure(name, format!("{:#}", e), Utc::now())
            }
        }
    }

    /// All records of one collection, bounded by the per-collection timeout
    pub async fn fetch_records(&self, remote_id: &RemoteId) -> anyhow::Result<Vec<RemoteRecord>> {
        let fetch = fetch_all_pages(self.service.as_ref(), remote_id, self.limits);

        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "Fetch timed out after {}s",
                self.fetch_timeout.as_secs_f64()
            )),
        }
    }
}
