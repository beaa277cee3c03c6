// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};
use crate::cache::{RealtimeCache, StaticCache};
use crate::error::DataError;
use crate::registry::CollectionName;
use crate::snapshot::{RemoteRecord, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    Static,
    Realtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceInfo {
    pub mode: DataMode,
    /// Whether a live source is configured
    pub available: bool,
}

/// Routes reads to the cache of the active mode.
///
/// Starts in `Static`. The only transition is `Static -> Realtime`, and it
/// clears the static cache so the two sources are never mixed.
pub struct ModeController {
    static_cache: StaticCache,
    realtime: Option<RealtimeCache>,
    mode: RwLock<DataMode>,
}

impl ModeController {
    pub fn new(static_cache: StaticCache, realtime: Option<RealtimeCache>) -> Self {
        Self {
            static_cache,
            realtime,
            mode: RwLock::new(DataMode::Static),
        }
    }

    /// Controller in its startup state: realtime whenever a live source is
    /// configured, static otherwise.
    pub fn start(static_cache: StaticCache, realtime: Option<RealtimeCache>) -> Arc<Self> {
        let controller = Self::new(static_cache, realtime);
        if controller.realtime.is_some() {
            controller.transition_to_realtime();
        } else {
            info!("No live source configured, serving static snapshot");
        }
        Arc::new(controller)
    }

    pub fn mode(&self) -> DataMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to realtime mode, clearing the static cache on entry.
    pub fn enter_realtime(&self) -> Result<(), DataError> {
        if self.realtime.is_none() {
            return Err(DataError::RealtimeUnavailable(
                "no live source configured".to_string(),
            ));
        }

        self.transition_to_realtime();
        Ok(())
    }

    /// `Static -> Realtime`; the entry action empties the static cache
    fn transition_to_realtime(&self) {
        let mut mode = self.mode.write().unwrap_or_else(PoisonError::into_inner);
        match *mode {
            DataMode::Realtime => debug!("Already in realtime mode"),
            DataMode::Static => {
                self.static_cache.invalidate();
                *mode = DataMode::Realtime;
                info!("Switched to realtime mode");
            }
        }
    }

    fn active_realtime(&self) -> Option<&RealtimeCache> {
        match self.mode() {
            DataMode::Static => None,
            DataMode::Realtime => self.realtime.as_ref(),
        }
    }

    /// Records of one collection from the active source.
    ///
    /// In realtime mode a live failure with nothing cached is returned as an
    /// error; static data is never substituted.
    pub async fn collection_data(&self, name: CollectionName) -> Result<Vec<RemoteRecord>, DataError> {
        match self.active_realtime() {
            Some(realtime) => realtime.read_collection(name).await,
            None => Ok(self.static_cache.get_collection_data(name).await),
        }
    }

    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, DataError> {
        match self.active_realtime() {
            Some(realtime) => realtime.read_snapshot().await,
            None => Ok(self.static_cache.snapshot().await),
        }
    }

    /// Most recent `lastUpdated` across collections; `None` when there is no data
    pub async fn last_update_time(&self) -> Result<Option<DateTime<Utc>>, DataError> {
        Ok(self.snapshot().await?.last_updated())
    }

    /// Invalidate the active cache and re-populate it before returning
    pub async fn refresh(&self) -> Result<(), DataError> {
        match self.active_realtime() {
            Some(realtime) => {
                if let Err(e) = realtime.refresh().await {
                    warn!(error = %e, "Realtime refresh failed");
                    return Err(e);
                }
            }
            None => {
                self.static_cache.refresh().await;
            }
        }
        info!(mode = ?self.mode(), "Data refreshed");
        Ok(())
    }

    pub fn data_source_info(&self) -> DataSourceInfo {
        DataSourceInfo {
            mode: self.mode(),
            available: self.realtime.is_some(),
        }
    }
}
