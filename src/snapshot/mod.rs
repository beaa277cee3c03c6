// SPDX-License-Identifier: GPL-3.0-only
pub mod builder;
pub mod models;
pub mod persister;
pub mod traits;

pub use builder::SnapshotBuilder;
pub use models::{CollectionResult, RemoteRecord, Snapshot};
pub use persister::{HttpSnapshotSource, SnapshotFile};
pub use traits::SnapshotSource;
