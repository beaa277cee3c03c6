// SPDX-License-Identifier: GPL-3.0-only
use tracing::{error, info};

use lifeboard::config::Config;
use lifeboard::logging::setup_logging;
use lifeboard::sync::SyncPipeline;

/// Build a snapshot of every collection and write it under the public dir.
///
/// Exits non-zero when the credential is missing or the document cannot be
/// written. Collections that failed to fetch are stored as error entries.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    setup_logging(&config.log_level, config.log_json)?;

    let pipeline = match SyncPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Cannot start sync");
            return Err(e);
        }
    };

    let report = pipeline.run().await?;
    info!(
        path = %report.path.display(),
        records = report.records,
        failed = report.failed.len(),
        "Snapshot written"
    );

    Ok(())
}
