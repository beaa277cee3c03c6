// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Map};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use crate::cache::LiveSource;
use crate::registry::{CollectionName, RemoteId};
use crate::remote::{QueryPage, QueryService};
use crate::snapshot::{CollectionResult, RemoteRecord, Snapshot, SnapshotSource};

/// Create a temporary directory for tests
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("Failed to create temp directory")
}

/// Record with fixed timestamps and a title property
pub fn record(id: &str) -> RemoteRecord {
    let mut properties = Map::new();
    properties.insert("Name".to_string(), json!({ "title": [{ "plain_text": id }] }));

    RemoteRecord {
        id: id.to_string(),
        created_time: "2024-01-01T00:00:00.000Z".to_string(),
        last_edited_time: "2024-01-02T00:00:00.000Z".to_string(),
        properties,
        extra: Map::new(),
    }
}

fn records(prefix: &str, count: usize) -> Vec<RemoteRecord> {
    (0..count).map(|i| record(&format!("{}-{}", prefix, i))).collect()
}

/// Goals (2 records), actions (1), daily-log (3) and a failed health entry
pub fn sample_snapshot() -> Snapshot {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    Snapshot::from_results(vec![
        CollectionResult::success(CollectionName::Goals, records("goal", 2), at),
        CollectionResult::success(CollectionName::Actions, records("action", 1), at),
        CollectionResult::success(CollectionName::DailyLog, records("log", 3), at),
        CollectionResult::failure(CollectionName::Health, "HTTP 500", at),
    ])
}

#[derive(Clone)]
enum FakeCollection {
    Records { count: usize, delay: Duration },
    Failure(String),
    FailAfter { count: usize, fail_page: usize },
    Endless,
    Cursorless,
}

/// In-memory paginated query API.
///
/// Cursors have the form `offset:N`. Records are named `{remote_id}-{index}`.
/// Unknown remote ids fail.
#[derive(Default)]
pub struct FakeQueryService {
    collections: HashMap<String, FakeCollection>,
    calls: AtomicUsize,
}

impl FakeQueryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(self, remote_id: &str, count: usize) -> Self {
        self.with_delayed_records(remote_id, count, Duration::ZERO)
    }

    /// Every page of this collection takes `delay` to arrive
    pub fn with_delayed_records(mut self, remote_id: &str, count: usize, delay: Duration) -> Self {
        self.collections
            .insert(remote_id.to_string(), FakeCollection::Records { count, delay });
        self
    }

    pub fn with_failure(mut self, remote_id: &str, message: &str) -> Self {
        self.collections
            .insert(remote_id.to_string(), FakeCollection::Failure(message.to_string()));
        self
    }

    /// Serve pages normally until page `fail_page` (zero-based), which fails
    pub fn with_failure_after(mut self, remote_id: &str, count: usize, fail_page: usize) -> Self {
        self.collections
            .insert(remote_id.to_string(), FakeCollection::FailAfter { count, fail_page });
        self
    }

    /// Always reports another page
    pub fn with_endless(mut self, remote_id: &str) -> Self {
        self.collections.insert(remote_id.to_string(), FakeCollection::Endless);
        self
    }

    /// Reports another page without a cursor to reach it
    pub fn with_cursorless(mut self, remote_id: &str) -> Self {
        self.collections.insert(remote_id.to_string(), FakeCollection::Cursorless);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn page(remote_id: &str, count: usize, offset: usize, page_size: usize) -> QueryPage {
        let end = (offset + page_size).min(count);
        let has_more = end < count;

        QueryPage {
            records: (offset..end).map(|i| record(&format!("{}-{}", remote_id, i))).collect(),
            has_more,
            next_cursor: has_more.then(|| format!("offset:{}", end)),
        }
    }
}

#[async_trait]
impl QueryService for FakeQueryService {
    async fn query(
        &self,
        remote_id: &RemoteId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> anyhow::Result<QueryPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let id = remote_id.as_str();
        let page_size = page_size as usize;
        let offset = match cursor {
            Some(cursor) => cursor
                .strip_prefix("offset:")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| anyhow::anyhow!("Invalid cursor: {}", cursor))?,
            None => 0,
        };

        let collection = self
            .collections
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Database query failed: 404 Not Found - unknown database {}", id))?;

        match collection {
            FakeCollection::Records { count, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(Self::page(id, count, offset, page_size))
            }
            FakeCollection::Failure(message) => Err(anyhow::anyhow!(message)),
            FakeCollection::FailAfter { count, fail_page } => {
                if offset / page_size.max(1) >= fail_page {
                    return Err(anyhow::anyhow!("Database query failed: 502 Bad Gateway"));
                }
                Ok(Self::page(id, count, offset, page_size))
            }
            FakeCollection::Endless => Ok(QueryPage {
                records: (offset..offset + page_size)
                    .map(|i| record(&format!("{}-{}", id, i)))
                    .collect(),
                has_more: true,
                next_cursor: Some(format!("offset:{}", offset + page_size)),
            }),
            FakeCollection::Cursorless => Ok(QueryPage {
                records: vec![record(&format!("{}-0", id))],
                has_more: true,
                next_cursor: None,
            }),
        }
    }
}

/// Snapshot source serving an in-memory snapshot and counting loads.
pub struct FakeSnapshotSource {
    snapshot: Mutex<Snapshot>,
    failure: Option<String>,
    delay: Duration,
    loads: AtomicUsize,
}

impl FakeSnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            failure: None,
            delay: Duration::ZERO,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Snapshot::default())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for FakeSnapshotSource {
    async fn load(&self) -> anyhow::Result<Snapshot> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(anyhow::anyhow!(message.clone()));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Live source serving an in-memory snapshot, switchable to failing.
pub struct FakeLiveSource {
    snapshot: Mutex<Snapshot>,
    failing: AtomicBool,
    bulk_fetches: AtomicUsize,
    direct_fetches: AtomicUsize,
}

impl FakeLiveSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            failing: AtomicBool::new(false),
            bulk_fetches: AtomicUsize::new(0),
            direct_fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn bulk_fetches(&self) -> usize {
        self.bulk_fetches.load(Ordering::SeqCst)
    }

    pub fn direct_fetches(&self) -> usize {
        self.direct_fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Live API unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl LiveSource for FakeLiveSource {
    async fn fetch_all(&self) -> anyhow::Result<Snapshot> {
        self.bulk_fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn fetch_collection(&self, name: CollectionName) -> anyhow::Result<Vec<RemoteRecord>> {
        self.direct_fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.snapshot.lock().unwrap().records(name).to_vec())
    }
}
