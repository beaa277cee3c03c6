// SPDX-License-Identifier: GPL-3.0-only
use tracing::{debug, warn};
use crate::registry::RemoteId;
use crate::remote::traits::QueryService;
use crate::snapshot::models::RemoteRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page_size: u32,

    /// Hard ceiling on pages per collection
    pub max_pages: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Collection {remote_id} exceeded the limit of {max_pages} pages")]
    PageLimitExceeded { remote_id: RemoteId, max_pages: u32 },

    #[error("Collection {0} reported more pages but returned no cursor")]
    MissingCursor(RemoteId),
}

/// Retrieve every record of a collection by following cursors until the API
/// reports no more pages.
///
/// Records keep the API's order. Any page failure aborts the whole fetch.
pub async fn fetch_all_pages(
    service: &dyn QueryService,
    remote_id: &RemoteId,
    limits: PageLimits,
) -> anyhow::Result<Vec<RemoteRecord>> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        if pages >= limits.max_pages {
            warn!(remote_id = %remote_id, max_pages = limits.max_pages, "Page limit reached");
            return Err(PaginationError::PageLimitExceeded {
                remote_id: remote_id.clone(),
                max_pages: limits.max_pages,
            }
            .into());
        }

        let page = service
            .query(remote_id, cursor.as_deref(), limits.page_size)
            .await?;
        pages += 1;
        records.extend(page.records);

        if !page.has_more {
            break;
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Err(PaginationError::MissingCursor(remote_id.clone()).into()),
        }
    }

    debug!(remote_id = %remote_id, pages, count = records.len(), "Fetched all pages");
    Ok(records)
}
