// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use crate::cache::traits::LiveSource;
use crate::error::ConfigError;
use crate::registry::{CollectionName, CollectionRegistry};
use crate::snapshot::{RemoteRecord, Snapshot, SnapshotBuilder};

/// Live source that queries the remote database API directly.
#[derive(Clone)]
pub struct DirectLiveSource {
    builder: SnapshotBuilder,
    registry: Arc<CollectionRegistry>,
}

impl DirectLiveSource {
    pub fn new(builder: SnapshotBuilder, registry: Arc<CollectionRegistry>) -> Self {
        Self { builder, registry }
    }
}

#[async_trait]
impl LiveSource for DirectLiveSource {
    async fn fetch_all(&self) -> anyhow::Result<Snapshot> {
        let snapshot = self.builder.build_snapshot(&self.registry).await;

        // Individual failures stay inside their entries; if nothing came back
        // at all the upstream is down and older data is preferable
        if !snapshot.is_empty() && snapshot.failed().count() == snapshot.len() {
            let first = snapshot
                .failed()
                .find_map(|result| result.error.clone())
                .unwrap_or_default();
            return Err(anyhow::anyhow!(
                "All {} collections failed to fetch: {}",
                snapshot.len(),
                first
            ));
        }

        Ok(snapshot)
    }

    async fn fetch_collection(&self, name: CollectionName) -> anyhow::Result<Vec<RemoteRecord>> {
        let remote_id = self
            .registry
            .remote_id(name)
            .ok_or(ConfigError::MissingCollectionId(name))?;

        self.builder.fetch_records(remote_id).await
    }
}

/// Live source backed by another dashboard API server.
#[derive(Debug, Clone)]
pub struct HttpLiveSource {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CollectionResponse {
    data: Option<Vec<RemoteRecord>>,
    error: Option<String>,
}

impl HttpLiveSource {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lifeboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LiveSource for HttpLiveSource {
    async fn fetch_all(&self) -> anyhow::Result<Snapshot> {
        info!(url = %self.base_url, "Fetching all databases from API server");

        let response = self.client.get(self.url("api/databases")).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            error!(status = %status, "Failed to load realtime data from API server");
            return Err(anyhow::anyhow!("HTTP {}", status));
        }

        let snapshot: Snapshot = response.json().await?;
        info!(collections = snapshot.len(), "Loaded all databases from API server");
        Ok(snapshot)
    }

    async fn fetch_collection(&self, name: CollectionName) -> anyhow::Result<Vec<RemoteRecord>> {
        let response = self
            .client
            .post(self.url(&format!("api/database/{}", name)))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!(collection = %name, status = %status, "Failed to fetch collection from API server");
            return Err(anyhow::anyhow!("HTTP {}", status));
        }

        let body: CollectionResponse = response.json().await?;
        match (body.data, body.error) {
            (Some(records), _) => Ok(records),
            (None, Some(message)) => Err(anyhow::anyhow!(message)),
            (None, None) => Ok(Vec::new()),
        }
    }
}
