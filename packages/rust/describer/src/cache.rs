//! Bounded memoization of merged descriptions.
//!
//! Keyed by the exact, ordered list of contributing description files. Entries
//! are never invalidated by content changes: description files are treated as
//! immutable for the lifetime of the process. Eviction is least-recently-used
//! and only ever costs a recomputation.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::debug;

use stacforge_shared::{Result, StacForgeError};

use crate::merge::merge;
use crate::model::CollectionDescription;
use crate::store::{DescriptionFile, DescriptionStore};

type Entries = LruCache<Vec<DescriptionFile>, Arc<CollectionDescription>>;

/// LRU cache in front of the description merger.
///
/// Access is serialized through a mutex; loading and merging on a miss happen
/// outside the lock.
#[derive(Debug)]
pub struct MergeCache {
    store: DescriptionStore,
    entries: Mutex<Entries>,
    verify: bool,
}

impl MergeCache {
    /// Create a cache holding at most `capacity` merged descriptions.
    pub fn new(store: DescriptionStore, capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| StacForgeError::config("merge cache capacity must be at least 1"))?;

        Ok(Self {
            store,
            entries: Mutex::new(LruCache::new(capacity)),
            verify: false,
        })
    }

    /// Recompute on every hit and fail if the cached value differs.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// The merged description for `files`, computing it on a miss.
    pub fn get(&self, files: &[DescriptionFile]) -> Result<Arc<CollectionDescription>> {
        let cached = self.lock().get(files).cloned();

        if let Some(description) = cached {
            debug!(files = files.len(), "merge cache hit");
            if self.verify {
                let fresh = self.compute(files)?;
                if *description != fresh {
                    return Err(StacForgeError::MergeCacheCorruption {
                        files: join_files(files),
                    });
                }
            }
            return Ok(description);
        }

        debug!(files = files.len(), "merge cache miss");
        let description = Arc::new(self.compute(files)?);

        if let Some((evicted, _)) = self.lock().push(files.to_vec(), Arc::clone(&description)) {
            if evicted.as_slice() != files {
                debug!(evicted = %join_files(&evicted), "merge cache evicted entry");
            }
        }

        Ok(description)
    }

    /// The store used to load files on a miss.
    pub fn store(&self) -> &DescriptionStore {
        &self.store
    }

    /// Number of cached descriptions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of cached descriptions.
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Load every file fresh and merge, root first.
    fn compute(&self, files: &[DescriptionFile]) -> Result<CollectionDescription> {
        let documents = files
            .iter()
            .map(|file| self.store.load(file))
            .collect::<Result<Vec<_>>>()?;
        Ok(merge(documents))
    }

    // The cache holds no invariants a panicking holder could break.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn insert_raw(&self, files: Vec<DescriptionFile>, description: CollectionDescription) {
        self.lock().put(files, Arc::new(description));
    }
}

fn join_files(files: &[DescriptionFile]) -> String {
    files
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
