// SPDX-License-Identifier: GPL-3.0-only
pub mod layer;
pub mod live;
pub mod realtime;
pub mod static_cache;
pub mod traits;

pub use layer::{CacheRead, FetchFailure, SnapshotCache};
pub use live::{DirectLiveSource, HttpLiveSource};
pub use realtime::RealtimeCache;
pub use static_cache::StaticCache;
pub use traits::LiveSource;
