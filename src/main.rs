// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use lifeboard::api::HttpServer;
use lifeboard::cache::{DirectLiveSource, HttpLiveSource, LiveSource, RealtimeCache, StaticCache};
use lifeboard::config::Config;
use lifeboard::logging::setup_logging;
use lifeboard::mode::ModeController;
use lifeboard::registry::CollectionRegistry;
use lifeboard::snapshot::{HttpSnapshotSource, SnapshotFile, SnapshotSource};
use lifeboard::sync::{notion_snapshot_builder, SyncPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_json)?;

    info!("Starting Lifeboard v{}", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(config.registry()?);
    info!(collections = registry.len(), "Collection registry loaded");

    // Static snapshot
    let static_source: Arc<dyn SnapshotSource> = match &config.snapshot_url {
        Some(url) => Arc::new(HttpSnapshotSource::new(url.clone(), config.fetch_timeout())?),
        None => Arc::new(SnapshotFile::new(config.snapshot_path())),
    };
    info!(location = %static_source.location(), "Static snapshot source configured");
    let static_cache = StaticCache::new(static_source, config.static_ttl());

    // Live source, if any
    let realtime = live_source(&config, Arc::clone(&registry))?
        .map(|source| RealtimeCache::new(source, config.realtime_ttl()));

    let controller = ModeController::start(static_cache.clone(), realtime);
    info!(mode = ?controller.mode(), "Data layer ready");

    let sync_task = spawn_sync_task(&config, static_cache);

    // Start HTTP server
    let http_server = HttpServer::new(Arc::clone(&controller), config.local_api_bind);
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.serve().await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("All services started. Waiting for shutdown signal...");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    info!("Initiating graceful shutdown...");

    if let Some(task) = sync_task {
        task.abort();
    }
    http_task.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Notion directly when a credential is present, else a remote dashboard API
fn live_source(
    config: &Config,
    registry: Arc<CollectionRegistry>,
) -> anyhow::Result<Option<Arc<dyn LiveSource>>> {
    if config.api_key().is_ok() {
        info!("Realtime source: Notion API");
        let builder = notion_snapshot_builder(config)?;
        return Ok(Some(Arc::new(DirectLiveSource::new(builder, registry))));
    }

    if let Some(url) = &config.live_api_url {
        info!(url = %url, "Realtime source: dashboard API server");
        let source = HttpLiveSource::new(url.clone(), config.fetch_timeout())?;
        return Ok(Some(Arc::new(source)));
    }

    warn!("No Notion credential or live API configured, realtime mode unavailable");
    Ok(None)
}

/// Periodically rebuild the snapshot file while the server runs
fn spawn_sync_task(config: &Config, static_cache: StaticCache) -> Option<JoinHandle<()>> {
    if config.sync_interval_secs == 0 {
        return None;
    }

    let pipeline = match SyncPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            warn!(error = %e, "Scheduled sync disabled");
            return None;
        }
    };

    let sync_interval = config.sync_interval_secs;
    Some(tokio::spawn(async move {
        info!(interval_secs = sync_interval, "Sync task started");
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(sync_interval));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;

            match pipeline.run().await {
                Ok(report) => {
                    info!(run_id = %report.run_id, "Scheduled sync complete");
                    // Pick up the new document on the next static read
                    static_cache.invalidate();
                }
                Err(e) => {
                    error!(error = %e, "Scheduled sync failed");
                }
            }
        }
    }))
}
