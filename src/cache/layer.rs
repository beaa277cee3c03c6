// SPDX-License-Identifier: GPL-3.0-only
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use crate::error::DataError;
use crate::snapshot::Snapshot;

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Snapshot>, DataError>>>;

/// How a successful read was answered.
#[derive(Debug, Clone)]
pub enum CacheRead {
    /// Served from memory inside the TTL window
    Fresh(Arc<Snapshot>),
    /// Result of an upstream fetch this read started or joined
    Fetched(Arc<Snapshot>),
    /// TTL expired and a refresh is already running; served without waiting
    Stale(Arc<Snapshot>),
}

impl CacheRead {
    pub fn into_snapshot(self) -> Arc<Snapshot> {
        match self {
            CacheRead::Fresh(s) | CacheRead::Fetched(s) | CacheRead::Stale(s) => s,
        }
    }
}

/// Upstream fetch failed. Carries whatever was cached, however old.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub error: DataError,
    pub stale: Option<Arc<Snapshot>>,
}

struct CachedSnapshot {
    snapshot: Arc<Snapshot>,
    fetched_at: Instant,
    generation: u64,
}

struct InFlight {
    generation: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    cached: Option<CachedSnapshot>,
    in_flight: Option<InFlight>,
    /// Last generation handed out; fetches are numbered in start order
    generation: u64,
    /// Results of fetches numbered below this are discarded
    floor: u64,
}

impl CacheState {
    fn store(&mut self, generation: u64, snapshot: Arc<Snapshot>) -> bool {
        if generation < self.floor {
            return false;
        }
        if let Some(cached) = &self.cached {
            if cached.generation > generation {
                return false;
            }
        }

        self.cached = Some(CachedSnapshot {
            snapshot,
            fetched_at: Instant::now(),
            generation,
        });
        true
    }
}

/// Single-entry read-through cache for a whole `Snapshot`.
///
/// Concurrent misses share one upstream fetch. Fetches run on their own task
/// and finish even if every caller goes away. A fetch only overwrites the
/// cache if it started after the fetch that produced the cached value and
/// after the last `invalidate()`.
#[derive(Clone)]
pub struct SnapshotCache {
    ttl: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached snapshot, fetching through `fetch` when it is
    /// missing or older than the TTL.
    ///
    /// `fetch` is only invoked when no other fetch is in flight.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<CacheRead, FetchFailure>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<Snapshot>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();

            if let Some(cached) = &state.cached {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(CacheRead::Fresh(Arc::clone(&cached.snapshot)));
                }
            }

            if let Some(in_flight) = &state.in_flight {
                // Someone else is refreshing an expired entry
                if let Some(cached) = &state.cached {
                    return Ok(CacheRead::Stale(Arc::clone(&cached.snapshot)));
                }
                // First population: wait on the shared fetch
                in_flight.fetch.clone()
            } else {
                self.start_fetch(&mut state, fetch())
            }
        };

        match pending.await {
            Ok(snapshot) => Ok(CacheRead::Fetched(snapshot)),
            Err(error) => Err(FetchFailure {
                error,
                stale: self.peek(),
            }),
        }
    }

    fn start_fetch<Fut>(&self, state: &mut CacheState, fetch: Fut) -> SharedFetch
    where
        Fut: Future<Output = anyhow::Result<Snapshot>> + Send + 'static,
    {
        state.generation += 1;
        let generation = state.generation;
        debug!(generation, "Starting snapshot fetch");

        let shared_state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let result = fetch.await;

            let mut state = shared_state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.in_flight.as_ref().is_some_and(|f| f.generation == generation) {
                state.in_flight = None;
            }

            match result {
                Ok(snapshot) => {
                    let snapshot = Arc::new(snapshot);
                    let stored = state.store(generation, Arc::clone(&snapshot));
                    debug!(generation, stored, "Snapshot fetch completed");
                    Ok(snapshot)
                }
                Err(e) => Err(DataError::Load(format!("{:#}", e))),
            }
        });

        let join_state = Arc::clone(&self.state);
        let shared = async move {
            task.await.unwrap_or_else(|e| {
                // The task never reached its own cleanup
                let mut state = join_state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.in_flight.as_ref().is_some_and(|f| f.generation == generation) {
                    state.in_flight = None;
                }
                Err(DataError::Load(format!("Fetch task failed: {}", e)))
            })
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight {
            generation,
            fetch: shared.clone(),
        });
        shared
    }

    /// Cached snapshot regardless of age
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        self.lock().cached.as_ref().map(|c| Arc::clone(&c.snapshot))
    }

    /// Drop the cached snapshot and in-flight marker. Fetches already running
    /// can no longer populate the cache.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.cached = None;
        state.in_flight = None;
        state.floor = state.generation + 1;
        debug!(floor = state.floor, "Snapshot cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CollectionName;
    use crate::snapshot::CollectionResult;
    use crate::test_helpers::record;
    use chrono::Utc;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot_with(id: &str) -> Snapshot {
        Snapshot::from_results(vec![CollectionResult::success(
            CollectionName::Goals,
            vec![record(id)],
            Utc::now(),
        )])
    }

    fn first_id(snapshot: &Snapshot) -> String {
        snapshot.records(CollectionName::Goals)[0].id.clone()
    }

    /// Fetch closure that counts invocations and returns `id` after `delay`
    fn counting_fetch(
        counter: &Arc<AtomicUsize>,
        id: &'static str,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<Snapshot>> + Send + use<> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(delay).await;
                Ok(snapshot_with(id))
            }
            .boxed()
        }
    }

    fn failing_fetch(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<Snapshot>> + Send + use<> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Err(anyhow::anyhow!("upstream down")) }.boxed()
        }
    }

    /// Panics on the first call, succeeds afterwards
    fn panicking_once_fetch(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<Snapshot>> + Send + use<> {
        let counter = Arc::clone(counter);
        move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    panic!("fetch task panicked");
                }
                Ok(snapshot_with("recovered"))
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_within_ttl_hit_memory() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_fetch(counting_fetch(&calls, "v1", Duration::ZERO))
            .await
            .unwrap();
        assert!(matches!(first, CacheRead::Fetched(_)));

        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache
            .get_or_fetch(counting_fetch(&calls, "v2", Duration::ZERO))
            .await
            .unwrap();

        assert!(matches!(second, CacheRead::Fresh(_)));
        assert_eq!(first_id(&second.into_snapshot()), "v1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_ttl_fetches_once() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch(counting_fetch(&calls, "v1", Duration::ZERO))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;

        let read = cache
            .get_or_fetch(counting_fetch(&calls, "v2", Duration::ZERO))
            .await
            .unwrap();
        assert!(matches!(read, CacheRead::Fetched(_)));
        assert_eq!(first_id(&read.into_snapshot()), "v2");

        let again = cache
            .get_or_fetch(counting_fetch(&calls, "v3", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(first_id(&again.into_snapshot()), "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_reads_coalesce() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let reads = (0..10).map(|_| {
            let cache = cache.clone();
            let fetch = counting_fetch(&calls, "v1", Duration::from_secs(2));
            async move { cache.get_or_fetch(fetch).await.unwrap().into_snapshot() }
        });
        let snapshots = join_all(reads).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for snapshot in &snapshots {
            assert!(Arc::ptr_eq(snapshot, &snapshots[0]));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_served_stale_while_refreshing() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch(counting_fetch(&calls, "v1", Duration::ZERO))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        // This read starts the refresh and waits for it
        let refresher = {
            let cache = cache.clone();
            let fetch = counting_fetch(&calls, "v2", Duration::from_secs(5));
            tokio::spawn(async move { cache.get_or_fetch(fetch).await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        // Concurrent reader gets the old value immediately
        let concurrent = cache
            .get_or_fetch(counting_fetch(&calls, "v3", Duration::ZERO))
            .await
            .unwrap();
        assert!(matches!(concurrent, CacheRead::Stale(_)));
        assert_eq!(first_id(&concurrent.into_snapshot()), "v1");

        let refreshed = refresher.await.unwrap();
        assert_eq!(first_id(&refreshed.into_snapshot()), "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_reports_stale_snapshot() {
        let cache = SnapshotCache::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        let failure = cache.get_or_fetch(failing_fetch(&calls)).await.unwrap_err();
        assert!(failure.stale.is_none());
        assert_eq!(failure.error, DataError::Load("upstream down".to_string()));

        cache
            .get_or_fetch(counting_fetch(&calls, "v1", Duration::ZERO))
            .await
            .unwrap();

        let failure = cache.get_or_fetch(failing_fetch(&calls)).await.unwrap_err();
        assert_eq!(first_id(&failure.stale.unwrap()), "v1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_started_before_invalidate_is_discarded() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow = {
            let cache = cache.clone();
            let fetch = counting_fetch(&calls, "old", Duration::from_secs(10));
            tokio::spawn(async move { cache.get_or_fetch(fetch).await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        cache.invalidate();
        let fresh = cache
            .get_or_fetch(counting_fetch(&calls, "new", Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(first_id(&fresh.into_snapshot()), "new");

        // The superseded fetch completes later but must not clobber
        let old = slow.await.unwrap();
        assert_eq!(first_id(&old.into_snapshot()), "old");
        assert_eq!(first_id(&cache.peek().unwrap()), "new");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_store_ignores_older_generation() {
        let mut state = CacheState {
            floor: 1,
            ..Default::default()
        };

        assert!(state.store(3, Arc::new(snapshot_with("gen3"))));
        assert!(!state.store(2, Arc::new(snapshot_with("gen2"))));
        assert_eq!(first_id(&state.cached.as_ref().unwrap().snapshot), "gen3");

        state.floor = 5;
        assert!(!state.store(4, Arc::new(snapshot_with("gen4"))));
        assert!(state.store(5, Arc::new(snapshot_with("gen5"))));
    }

    #[tokio::test]
    async fn test_fetch_completes_without_waiters() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let read = {
            let cache = cache.clone();
            let fetch = counting_fetch(&calls, "v1", Duration::from_millis(20));
            tokio::spawn(async move { cache.get_or_fetch(fetch).await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        read.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(first_id(&cache.peek().unwrap()), "v1");
    }

    #[tokio::test]
    async fn test_panicked_fetch_does_not_block_later_fetches() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let failure = cache
            .get_or_fetch(panicking_once_fetch(&calls))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, DataError::Load(ref msg) if msg.contains("Fetch task failed")));
        assert!(failure.stale.is_none());

        let read = cache.get_or_fetch(panicking_once_fetch(&calls)).await.unwrap();
        assert!(matches!(read, CacheRead::Fetched(_)));
        assert_eq!(first_id(&read.into_snapshot()), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
