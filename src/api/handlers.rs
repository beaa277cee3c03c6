// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::DataError;
use crate::mode::{DataSourceInfo, ModeController};
use crate::registry::CollectionName;
use crate::snapshot::{RemoteRecord, Snapshot};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn api_error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ApiResponse::error(message)))
}

fn unavailable(e: DataError) -> ApiError {
    api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
}

pub struct ApiHandlers {
    controller: Arc<ModeController>,
}

impl ApiHandlers {
    pub fn new(controller: Arc<ModeController>) -> Self {
        Self { controller }
    }
}

impl ApiHandlers {
    pub async fn health() -> Json<HealthStatus> {
        Json(HealthStatus {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            message: "Lifeboard API is running".to_string(),
        })
    }

    /// Every collection of the active source, in the snapshot document format
    pub async fn list_databases(&self) -> Result<Json<Snapshot>, ApiError> {
        match self.controller.snapshot().await {
            Ok(snapshot) => Ok(Json(Snapshot::clone(&snapshot))),
            Err(e) => {
                error!(error = %e, "Failed to load databases");
                Err(unavailable(e))
            }
        }
    }

    pub async fn get_database(&self, Path(name): Path<String>) -> ApiResult<Vec<RemoteRecord>> {
        let name: CollectionName = match name.parse() {
            Ok(name) => name,
            Err(e) => {
                warn!(collection = %name, "Unknown collection requested");
                return Err(api_error(StatusCode::NOT_FOUND, format!("{}", e)));
            }
        };

        match self.controller.collection_data(name).await {
            Ok(records) => Ok(Json(ApiResponse::success(records))),
            Err(e) => {
                error!(collection = %name, error = %e, "Failed to load collection");
                Err(unavailable(e))
            }
        }
    }

    pub async fn last_update(&self) -> ApiResult<Option<String>> {
        match self.controller.last_update_time().await {
            Ok(updated) => Ok(Json(ApiResponse::success(updated.map(|t| t.to_rfc3339())))),
            Err(e) => {
                error!(error = %e, "Failed to determine last update time");
                Err(unavailable(e))
            }
        }
    }

    pub async fn refresh(&self) -> ApiResult<()> {
        info!("Refresh requested");

        match self.controller.refresh().await {
            Ok(()) => Ok(Json(ApiResponse::success(()))),
            Err(e) => {
                error!(error = %e, "Refresh failed");
                Err(unavailable(e))
            }
        }
    }

    pub async fn data_source(&self) -> Json<ApiResponse<DataSourceInfo>> {
        Json(ApiResponse::success(self.controller.data_source_info()))
    }
}
