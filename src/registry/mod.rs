// SPDX-License-Identifier: GPL-3.0-only
pub mod collections;
pub mod models;

pub use collections::{CollectionRegistry, RemoteId};
pub use models::CollectionName;
