// SPDX-License-Identifier: GPL-3.0-only
pub mod notion;
pub mod pagination;
pub mod traits;

pub use notion::NotionClient;
pub use pagination::{fetch_all_pages, PageLimits, PaginationError};
pub use traits::{QueryPage, QueryService};
