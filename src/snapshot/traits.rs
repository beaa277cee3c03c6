// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use crate::snapshot::models::Snapshot;

/// Where the static cache reads its persisted snapshot from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Load the whole document. Missing or malformed documents are errors.
    async fn load(&self) -> anyhow::Result<Snapshot>;

    /// Location for log messages
    fn location(&self) -> String;
}
