// SPDX-License-Identifier: GPL-3.0-only
pub mod pipeline;

pub use pipeline::{notion_snapshot_builder, SyncPipeline, SyncReport};
