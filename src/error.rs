// SPDX-License-Identifier: GPL-3.0-only
use crate::registry::CollectionName;

/// Configuration problems detected at startup.
///
/// Fatal for the sync pipeline. The dashboard server downgrades to static
/// mode instead of exiting.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Notion API credential is not set (NOTION_API_KEY or LIFEBOARD_NOTION_API_KEY)")]
    MissingCredential,

    #[error("No remote identifier configured for collection '{0}'")]
    MissingCollectionId(CollectionName),

    #[error("Unknown collection in configuration: '{0}'")]
    UnknownCollection(String),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Typed failure status handed to collaborators of the data layer.
///
/// `Clone` so one in-flight fetch can hand the same failure to every
/// coalesced waiter.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Upstream fetch failed (static file or live API).
    #[error("Failed to load data: {0}")]
    Load(String),

    /// Realtime mode is active, the live fetch failed, and no stale data exists.
    #[error("Realtime data unavailable: {0}")]
    RealtimeUnavailable(String),
}
