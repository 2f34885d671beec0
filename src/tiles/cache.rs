use crate::constants::DEFAULT_CACHE_CAPACITY;
use crate::core::geo::TileId;
use crate::tiles::source::TileImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where a tile is in its load lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileLoadState {
    /// Nothing is known about the tile
    NotLoaded,
    /// A background decode has been scheduled
    Loading,
    Loaded(Arc<TileImage>),
    /// The backing file is absent or unreadable; not retried this session
    Missing,
}

impl TileLoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, TileLoadState::Loaded(_))
    }

    pub fn image(&self) -> Option<&Arc<TileImage>> {
        match self {
            TileLoadState::Loaded(image) => Some(image),
            _ => None,
        }
    }
}

/// Counters exposed for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

#[derive(Debug)]
struct CacheInner {
    entries: LruCache<TileId, TileLoadState>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheInner {
    fn install(&mut self, id: TileId, state: TileLoadState) {
        // `push` hands back either the old value of `id` or the evicted LRU entry
        if let Some((evicted, _)) = self.entries.push(id, state) {
            if evicted != id {
                self.evictions += 1;
                log::debug!("evicted tile {} from cache", evicted);
            }
        }
    }
}

/// Fixed-capacity tile cache with least-recently-used eviction.
///
/// Holds decoded tiles, in-flight markers and terminal misses. Clones share
/// the same storage, so one cache can be handed to worker threads.
#[derive(Debug, Clone)]
pub struct TileCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl TileCache {
    /// Create a new tile cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CACHE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            })),
        }
    }

    /// Create a new tile cache with default capacity (80 tiles)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // Every operation leaves the map consistent, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of a tile, marking it most recently used
    pub fn get(&self, id: TileId) -> TileLoadState {
        let mut inner = self.lock();
        match inner.entries.get(&id).cloned() {
            Some(state) => {
                inner.hits += 1;
                state
            }
            None => {
                inner.misses += 1;
                TileLoadState::NotLoaded
            }
        }
    }

    /// Current state of a tile without touching recency or counters
    pub fn peek(&self, id: TileId) -> TileLoadState {
        self.lock()
            .entries
            .peek(&id)
            .cloned()
            .unwrap_or(TileLoadState::NotLoaded)
    }

    /// Claim an absent tile for loading.
    ///
    /// Returns `true` only for the caller that moved the tile from absent to
    /// [`TileLoadState::Loading`]; that caller owns scheduling the decode.
    pub fn reserve(&self, id: TileId) -> bool {
        let mut inner = self.lock();
        if inner.entries.contains(&id) {
            return false;
        }
        inner.install(id, TileLoadState::Loading);
        true
    }

    /// Install a decoded tile, evicting the least recently used entry if full
    pub fn put(&self, id: TileId, image: impl Into<Arc<TileImage>>) {
        self.lock().install(id, TileLoadState::Loaded(image.into()));
    }

    /// Record that a tile has no usable backing file
    pub fn mark_missing(&self, id: TileId) {
        self.lock().install(id, TileLoadState::Missing);
    }

    /// Check if a tile is in the cache in any state
    pub fn contains(&self, id: TileId) -> bool {
        self.lock().entries.contains(&id)
    }

    /// Remove a tile from the cache
    pub fn remove(&self, id: TileId) -> Option<TileLoadState> {
        self.lock().entries.pop(&id)
    }

    /// Clear all tiles from the cache
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Get the current number of cached entries
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.entries.len(),
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
