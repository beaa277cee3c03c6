// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use crate::registry::CollectionName;
use crate::snapshot::{RemoteRecord, Snapshot};

/// Live query API behind the realtime cache.
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Every collection in one aggregate request
    async fn fetch_all(&self) -> anyhow::Result<Snapshot>;

    /// A single collection, bypassing any aggregate
    async fn fetch_collection(&self, name: CollectionName) -> anyhow::Result<Vec<RemoteRecord>>;
}
