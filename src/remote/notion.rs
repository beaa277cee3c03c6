// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};
use crate::registry::RemoteId;
use crate::remote::traits::{QueryPage, QueryService};

pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Database query client for the Notion REST API.
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    base_url: String,
    api_key: String,
    notion_version: String,
}

impl NotionClient {
    pub fn new(
        base_url: String,
        api_key: String,
        notion_version: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lifeboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            notion_version,
        })
    }

    fn build_query_request(&self, remote_id: &RemoteId) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/databases/{}/query",
            self.base_url.trim_end_matches('/'),
            remote_id
        );

        self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.notion_version)
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    page_size: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[async_trait]
impl QueryService for NotionClient {
    async fn query(
        &self,
        remote_id: &RemoteId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> anyhow::Result<QueryPage> {
        debug!(remote_id = %remote_id, cursor = ?cursor, page_size, "Querying database page");

        let request = QueryRequest {
            page_size,
            start_cursor: cursor,
        };
        let response = self
            .build_query_request(remote_id)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(remote_id = %remote_id, status = %status, body = %text, "Database query failed");
            return Err(anyhow::anyhow!("Database query failed: {} - {}", status, text));
        }

        let page: QueryPage = response.json().await?;
        debug!(
            remote_id = %remote_id,
            count = page.records.len(),
            has_more = page.has_more,
            "Received database page"
        );

        Ok(page)
    }
}
