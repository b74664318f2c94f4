//! Block hash to size cache backed by a whole-document store.
//!
//! Reads are served from an in-memory snapshot and never touch the store.
//! Misses are fetched without holding any lock; only the persistence cycle
//! (load every entry, add one, save every entry) runs under `write_lock`, so
//! two inserts can never overwrite each other's entry. The cycle itself runs
//! on the blocking thread pool, since file stores do synchronous I/O.
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info, warn};

use crate::net::FetchError;
use crate::store::{SizeEntry, SizeStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

/// Size of one block, as handed out by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSizeRecord {
    pub hash: String,
    pub size: u64,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to load block size cache: {0}")]
    Load(#[source] StoreError),
    #[error("failed to fetch size of block {hash}: {source}")]
    Fetch {
        hash: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to persist size of block {hash}: {source}")]
    Write {
        hash: String,
        #[source]
        source: StoreError,
    },
}

pub struct BlockSizeCache<S> {
    store: Arc<S>,
    snapshot: RwLock<HashMap<String, u64>>,
    write_lock: Mutex<()>,
}

impl<S: SizeStore> BlockSizeCache<S> {
    /// Loads every complete entry from `store`.
    ///
    /// Entries without a size are skipped and will be fetched again on use.
    pub fn open(store: S) -> Result<Self, CacheError> {
        let entries = store.load().map_err(CacheError::Load)?;
        let mut snapshot = HashMap::with_capacity(entries.len());
        let mut incomplete = 0usize;
        for entry in entries {
            match entry.size {
                Some(size) => {
                    snapshot.entry(entry.hash).or_insert(size);
                }
                None => incomplete += 1,
            }
        }
        if incomplete > 0 {
            warn!(incomplete, "cached entries without a size will be fetched again");
        }
        info!(blocks = snapshot.len(), "block size cache loaded");

        Ok(BlockSizeCache {
            store: Arc::new(store),
            snapshot: RwLock::new(snapshot),
            write_lock: Mutex::new(()),
        })
    }

    pub fn get(&self, hash: &str) -> Option<BlockSizeRecord> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        snapshot.get(hash).map(|&size| BlockSizeRecord {
            hash: hash.to_string(),
            size,
        })
    }

    pub fn len(&self) -> usize {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached size of `hash`, or fetches, persists and returns it.
    ///
    /// Nothing is persisted when `fetcher` fails. Two concurrent misses on the
    /// same hash may both fetch; the first committed size is kept.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        hash: &str,
        fetcher: F,
    ) -> Result<BlockSizeRecord, CacheError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<u64, FetchError>>,
    {
        Ok(self.resolve(hash, fetcher).await?.0)
    }

    /// Like `get_or_fetch`, also reporting whether the record was cached.
    pub async fn resolve<F, Fut>(
        &self,
        hash: &str,
        fetcher: F,
    ) -> Result<(BlockSizeRecord, CacheLookup), CacheError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<u64, FetchError>>,
    {
        if let Some(record) = self.get(hash) {
            debug!(hash, size = record.size, "cache hit");
            return Ok((record, CacheLookup::Hit));
        }

        debug!(hash, "cache miss, fetching");
        let size = fetcher(hash.to_string())
            .await
            .map_err(|source| CacheError::Fetch {
                hash: hash.to_string(),
                source,
            })?;

        let record = self
            .insert(hash, size)
            .await
            .map_err(|source| CacheError::Write {
                hash: hash.to_string(),
                source,
            })?;
        Ok((record, CacheLookup::Miss))
    }

    async fn insert(&self, hash: &str, size: u64) -> Result<BlockSizeRecord, StoreError> {
        let _guard = self.write_lock.lock().await;

        let store = Arc::clone(&self.store);
        let owned = hash.to_string();
        let size = task::spawn_blocking(move || persist(store.as_ref(), &owned, size))
            .await
            .map_err(|e| StoreError::Io(io::Error::other(e)))??;

        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hash.to_string(), size);

        Ok(BlockSizeRecord {
            hash: hash.to_string(),
            size,
        })
    }
}

/// One load-append-save cycle. Returns the size that ends up committed.
fn persist<S: SizeStore>(store: &S, hash: &str, size: u64) -> Result<u64, StoreError> {
    let mut entries = store.load()?;
    let position = entries.iter().position(|e| e.hash == hash);

    // Another writer got here first.
    if let Some(existing) = position.and_then(|i| entries[i].size) {
        return Ok(existing);
    }

    match position {
        Some(i) => entries[i].size = Some(size),
        None => entries.push(SizeEntry {
            hash: hash.to_string(),
            size: Some(size),
        }),
    }
    store.save(&entries)?;
    debug!(hash, size, entries = entries.len(), "block size persisted");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::file::JsonFileStore;
    use crate::store::memory::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache = BlockSizeCache::open(MemoryStore::new()).unwrap();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move |_: String| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, FetchError>(1_500)
        };

        let first = cache.get_or_fetch("a", fetch).await.unwrap();
        let second = cache.get_or_fetch("a", fetch).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.size, 1_500);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_never_fetches() {
        let cache = BlockSizeCache::open(MemoryStore::with_entries(vec![SizeEntry {
            hash: "a".into(),
            size: Some(100),
        }]))
        .unwrap();
        assert_eq!(cache.get("a").map(|r| r.size), Some(100));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_persists_nothing() {
        let store = MemoryStore::new();
        let cache = BlockSizeCache::open(store).unwrap();
        let err = cache
            .get_or_fetch("a", |_| async { Err::<u64, _>(FetchError::Client("offline".into())) })
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Fetch { ref hash, .. } if hash == "a"));
        assert!(cache.is_empty());
        assert_eq!(cache.store.save_count(), 0);
        assert!(cache.store.load().unwrap().is_empty());
    }

    struct ReadOnlyStore;

    impl SizeStore for ReadOnlyStore {
        fn load(&self) -> Result<Vec<SizeEntry>, StoreError> {
            Ok(Vec::new())
        }

        fn save(&self, _: &[SizeEntry]) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[tokio::test]
    async fn store_failure_is_a_write_error() {
        let cache = BlockSizeCache::open(ReadOnlyStore).unwrap();
        let err = cache
            .get_or_fetch("a", |_| async { Ok::<u64, FetchError>(5) })
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Write { ref hash, .. } if hash == "a"));
        assert!(cache.get("a").is_none());
    }

    /// Remembers which thread performed the last save.
    #[derive(Default)]
    struct ThreadRecordingStore {
        inner: MemoryStore,
        saved_on: std::sync::Mutex<Option<std::thread::ThreadId>>,
    }

    impl SizeStore for ThreadRecordingStore {
        fn load(&self) -> Result<Vec<SizeEntry>, StoreError> {
            self.inner.load()
        }

        fn save(&self, entries: &[SizeEntry]) -> Result<(), StoreError> {
            *self.saved_on.lock().unwrap() = Some(std::thread::current().id());
            self.inner.save(entries)
        }
    }

    #[tokio::test]
    async fn store_cycle_runs_off_the_runtime_thread() {
        let cache = BlockSizeCache::open(ThreadRecordingStore::default()).unwrap();
        cache
            .get_or_fetch("a", |_| async { Ok::<u64, FetchError>(3) })
            .await
            .unwrap();

        let saved_on = (*cache.store.saved_on.lock().unwrap()).expect("store was saved");
        assert_ne!(saved_on, std::thread::current().id());
        assert_eq!(cache.store.inner.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn entry_without_size_is_fetched_and_completed() {
        let store = MemoryStore::with_entries(vec![SizeEntry {
            hash: "a".into(),
            size: None,
        }]);
        let cache = BlockSizeCache::open(store).unwrap();
        assert!(cache.get("a").is_none());

        let (record, lookup) = cache.resolve("a", |_| async { Ok::<u64, FetchError>(42) }).await.unwrap();
        assert_eq!(record.size, 42);
        assert_eq!(lookup, CacheLookup::Miss);
        assert_eq!(
            cache.store.load().unwrap(),
            vec![SizeEntry {
                hash: "a".into(),
                size: Some(42)
            }]
        );
    }

    #[tokio::test]
    async fn committed_size_wins_over_racing_fetch() {
        let cache = BlockSizeCache::open(MemoryStore::new()).unwrap();
        // Simulate a second process writing between our miss and our insert.
        cache
            .store
            .save(&[SizeEntry {
                hash: "a".into(),
                size: Some(7),
            }])
            .unwrap();

        let record = cache.get_or_fetch("a", |_| async { Ok::<u64, FetchError>(9) }).await.unwrap();
        assert_eq!(record.size, 7);
        assert_eq!(cache.store.load().unwrap().len(), 1);
        assert_eq!(cache.get("a").map(|r| r.size), Some(7));
    }

    #[tokio::test]
    async fn fetches_for_different_hashes_overlap() {
        let cache = BlockSizeCache::open(MemoryStore::new()).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        // `a` cannot finish until `b` has been fetched, which only works if
        // fetching `a` does not hold the cache.
        let a = cache.get_or_fetch("a", |_| async move {
            rx.await.map_err(|e| FetchError::Client(e.to_string()))?;
            Ok::<u64, FetchError>(1)
        });
        let b = cache.get_or_fetch("b", |_| async move {
            let _ = tx.send(());
            Ok::<u64, FetchError>(2)
        });

        let (a, b) = tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(a, b) })
            .await
            .expect("fetches blocked each other");
        assert_eq!(a.unwrap().size, 1);
        assert_eq!(b.unwrap().size, 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.json");
        let cache = BlockSizeCache::open(JsonFileStore::new(&path).unwrap()).unwrap();

        let lookups = (0..32u64).map(|i| {
            let cache = &cache;
            async move {
                cache
                    .get_or_fetch(&format!("block-{i}"), move |_| async move {
                        tokio::time::sleep(Duration::from_millis(i % 4)).await;
                        Ok::<u64, FetchError>(i * 10)
                    })
                    .await
            }
        });
        for result in futures::future::join_all(lookups).await {
            result.unwrap();
        }

        let reopened = BlockSizeCache::open(JsonFileStore::new(&path).unwrap()).unwrap();
        assert_eq!(reopened.len(), 32);
        assert_eq!(reopened.get("block-31").map(|r| r.size), Some(310));
    }
}
