// SPDX-License-Identifier: GPL-3.0-only
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use crate::api::handlers::{ApiError, ApiHandlers, ApiResponse, ApiResult, HealthStatus};
use crate::mode::{DataSourceInfo, ModeController};
use crate::snapshot::{RemoteRecord, Snapshot};

pub struct HttpServer {
    handlers: ApiHandlers,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(controller: Arc<ModeController>, addr: SocketAddr) -> Self {
        Self {
            handlers: ApiHandlers::new(controller),
            addr,
        }
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let app = router(Arc::new(self.handlers));

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

pub fn router(handlers: Arc<ApiHandlers>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/databases", get(list_databases_handler))
        .route("/api/databases/:name", get(get_database_handler))
        .route("/api/database/:name", post(get_database_handler))
        .route("/api/last-update", get(last_update_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/source", get(data_source_handler))
        .with_state(handlers)
}

async fn health_handler() -> Json<HealthStatus> {
    ApiHandlers::health().await
}

async fn list_databases_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> Result<Json<Snapshot>, ApiError> {
    handlers.list_databases().await
}

async fn get_database_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path(name): Path<String>,
) -> ApiResult<Vec<RemoteRecord>> {
    handlers.get_database(Path(name)).await
}

async fn last_update_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> ApiResult<Option<String>> {
    handlers.last_update().await
}

async fn refresh_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> ApiResult<()> {
    handlers.refresh().await
}

async fn data_source_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> Json<ApiResponse<DataSourceInfo>> {
    handlers.data_source().await
}
