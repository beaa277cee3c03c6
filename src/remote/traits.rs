// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use serde::Deserialize;
use crate::registry::RemoteId;
use crate::snapshot::models::RemoteRecord;

/// One page of a cursor-paginated query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPage {
    #[serde(rename = "results")]
    pub records: Vec<RemoteRecord>,

    pub has_more: bool,

    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[async_trait]
pub trait QueryService: Send + Sync {
    /// Fetch one page of a collection, starting at `cursor` (first page when `None`)
    async fn query(
        &self,
        remote_id: &RemoteId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> anyhow::Result<QueryPage>;
}
