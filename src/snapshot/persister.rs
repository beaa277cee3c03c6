// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use crate::snapshot::models::Snapshot;
use crate::snapshot::traits::SnapshotSource;

/// Location of the snapshot document under the public asset root
pub const SNAPSHOT_RELATIVE_PATH: &str = "data/notion-data.json";

/// Snapshot document on the local filesystem.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_public_dir(public_dir: &Path) -> Self {
        Self::new(public_dir.join(SNAPSHOT_RELATIVE_PATH))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot as pretty-printed JSON, creating parent directories.
    ///
    /// The document is written to a temp file next to the target and renamed
    /// over it, so readers see either the old or the new snapshot.
    pub async fn persist(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create snapshot directory: {}", dir.display()))?;

        let json = serde_json::to_vec_pretty(snapshot).context("Failed to serialize snapshot")?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut temp = tempfile::NamedTempFile::new_in(&dir)
                .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
            temp.write_all(&json)?;
            temp.as_file().sync_all()?;
            temp.persist(&path)
                .with_context(|| format!("Failed to move snapshot into place: {}", path.display()))?;
            Ok(())
        })
        .await
        .context("Snapshot write task panicked")??;

        info!(
            path = %self.path.display(),
            collections = snapshot.len(),
            records = snapshot.record_count(),
            "Snapshot persisted"
        );
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for SnapshotFile {
    async fn load(&self) -> anyhow::Result<Snapshot> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;

        serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed snapshot document: {}", self.path.display()))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Snapshot document served over HTTP, e.g. by the static site host.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    client: Client,
    url: String,
}

impl HttpSnapshotSource {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lifeboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn load(&self) -> anyhow::Result<Snapshot> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            error!(url = %self.url, status = %status, "Failed to fetch snapshot");
            return Err(anyhow::anyhow!("Failed to fetch snapshot: {}", status));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed snapshot document: {}", self.url))
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}
