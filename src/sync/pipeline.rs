// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;
use crate::config::Config;
use crate::registry::{CollectionName, CollectionRegistry};
use crate::remote::NotionClient;
use crate::snapshot::{SnapshotBuilder, SnapshotFile};

/// Snapshot builder talking to the Notion API with the configured limits.
///
/// Fails with `ConfigError::MissingCredential` when no API key is set.
pub fn notion_snapshot_builder(config: &Config) -> anyhow::Result<SnapshotBuilder> {
    let api_key = config.api_key()?;
    let client = NotionClient::new(
        config.notion_api_url.clone(),
        api_key.to_string(),
        config.notion_version.clone(),
        config.fetch_timeout(),
    )?;

    Ok(SnapshotBuilder::new(
        Arc::new(client),
        config.page_limits(),
        config.fetch_timeout(),
    ))
}

/// Outcome of one sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub path: PathBuf,
    pub collections: usize,
    pub records: usize,
    pub failed: Vec<CollectionName>,
    pub elapsed: Duration,
}

/// Offline pipeline: build a snapshot of every collection and persist it.
pub struct SyncPipeline {
    builder: SnapshotBuilder,
    registry: Arc<CollectionRegistry>,
    file: SnapshotFile,
}

impl SyncPipeline {
    pub fn new(builder: SnapshotBuilder, registry: Arc<CollectionRegistry>, file: SnapshotFile) -> Self {
        Self {
            builder,
            registry,
            file,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let builder = notion_snapshot_builder(config)?;
        let registry = Arc::new(config.registry()?);
        let file = SnapshotFile::new(config.snapshot_path());
        Ok(Self::new(builder, registry, file))
    }

    /// Run one sync.
    ///
    /// Collection failures are logged and kept in the snapshot as error
    /// entries. The document is written even when every collection failed.
    pub async fn run(&self) -> anyhow::Result<SyncReport> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(run_id = %run_id, path = %self.file.path().display(), "Sync started");

        let snapshot = self.builder.build_snapshot(&self.registry).await;

        let failed: Vec<CollectionName> = snapshot.failed().map(|result| result.name).collect();
        for result in snapshot.failed() {
            warn!(
                run_id = %run_id,
                collection = %result.name,
                error = result.error.as_deref().unwrap_or_default(),
                "Collection failed during sync"
            );
        }

        if !snapshot.is_empty() && failed.len() == snapshot.len() {
            error!(run_id = %run_id, collections = snapshot.len(), "Every collection failed to fetch");
        }

        self.file.persist(&snapshot).await?;

        let report = SyncReport {
            run_id,
            path: self.file.path().to_path_buf(),
            collections: snapshot.len(),
            records: snapshot.record_count(),
            failed,
            elapsed: started.elapsed(),
        };
        info!(
            run_id = %run_id,
            collections = report.collections,
            records = report.records,
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Sync finished"
        );
        Ok(report)
    }
}
