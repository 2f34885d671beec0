use crossbeam_channel::{unbounded, Receiver, Sender};

use super::cache::{TileCache, TileLoadState};
use super::source::{TileError, TileStore};
use crate::core::geo::TileId;
use crate::runtime::{self, TaskSpawner};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A tile positioned for display.
///
/// Rebuilt with every new tile list; the image inside a `Loaded` state is
/// shared with the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenTile {
    pub id: TileId,
    pub screen_x: i32,
    pub screen_y: i32,
    pub state: TileLoadState,
}

/// How a background load ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileOutcome {
    Loaded,
    /// No backing file
    Missing,
    /// Backing file exists but could not be decoded
    Corrupt,
}

/// "Data became available, redraw" notification.
///
/// Carries no pixels: consumers re-read the cache on their next rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileEvent {
    pub id: TileId,
    pub outcome: TileOutcome,
}

/// Serves tiles from the cache and schedules background decodes for the rest
pub struct TileLoader {
    cache: TileCache,
    store: Arc<dyn TileStore>,
    spawner: Arc<dyn TaskSpawner>,
    event_tx: Sender<TileEvent>,
    event_rx: Receiver<TileEvent>,
    scheduled: AtomicU64,
}

impl TileLoader {
    /// Create a loader that runs decodes on the global [`runtime::runtime`]
    pub fn new(store: Arc<dyn TileStore>, cache: TileCache) -> Self {
        Self::with_spawner(store, cache, runtime::runtime())
    }

    pub fn with_spawner(
        store: Arc<dyn TileStore>,
        cache: TileCache,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            cache,
            store,
            spawner,
            event_tx,
            event_rx,
            scheduled: AtomicU64::new(0),
        }
    }

    /// Tile `id` positioned at (`screen_x`, `screen_y`). Never blocks.
    ///
    /// Cached tiles come back `Loaded` or `Missing`. Anything else comes back
    /// `Loading`, and the first caller to claim the tile schedules its decode.
    pub fn request(&self, id: TileId, screen_x: i32, screen_y: i32) -> ScreenTile {
        let state = match self.cache.get(id) {
            state @ (TileLoadState::Loaded(_) | TileLoadState::Missing | TileLoadState::Loading) => {
                state
            }
            TileLoadState::NotLoaded => {
                if !self.cache.reserve(id) || self.schedule(id) {
                    TileLoadState::Loading
                } else {
                    TileLoadState::NotLoaded
                }
            }
        };

        ScreenTile {
            id,
            screen_x,
            screen_y,
            state,
        }
    }

    /// Hand the decode of a reserved tile to the spawner. When the spawner
    /// refuses, the reservation is dropped so a later request retries.
    fn schedule(&self, id: TileId) -> bool {
        log::debug!("scheduling load of tile {}", id);

        let store = self.store.clone();
        let cache = self.cache.clone();
        let event_tx = self.event_tx.clone();
        let spawned = self.spawner.spawn(Box::new(move || {
            let outcome = load_into_cache(store.as_ref(), &cache, id);
            // The receiver lives as long as the loader; a closed channel only
            // means nobody is waiting for redraws any more
            let _ = event_tx.send(TileEvent { id, outcome });
        }));

        match spawned {
            Ok(()) => {
                self.scheduled.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                log::error!("could not schedule load of tile {}: {}", id, e);
                self.cache.remove(id);
                false
            }
        }
    }

    /// `tile` with its state re-read from the cache. Never schedules work.
    pub fn refreshed(&self, tile: &ScreenTile) -> ScreenTile {
        ScreenTile {
            state: self.cache.get(tile.id),
            ..tile.clone()
        }
    }

    /// Completion notifications, one per finished background load
    pub fn events(&self) -> &Receiver<TileEvent> {
        &self.event_rx
    }

    /// Drain completion notifications without blocking
    pub fn try_recv_events(&self) -> Vec<TileEvent> {
        self.event_rx.try_iter().collect()
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn TileStore> {
        &self.store
    }

    /// Number of background loads scheduled so far
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for TileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("cache", &self.cache.stats())
            .field("scheduled", &self.scheduled_count())
            .field("pending_events", &self.event_rx.len())
            .finish()
    }
}

/// Body of one background load: decode, then publish the result in the cache
fn load_into_cache(store: &dyn TileStore, cache: &TileCache, id: TileId) -> TileOutcome {
    let loaded = catch_unwind(AssertUnwindSafe(|| store.load_tile(id))).unwrap_or_else(|_| {
        Err(TileError::Corrupt {
            path: store.tile_path(id),
            source: "decoder panicked".into(),
        })
    });

    match loaded {
        Ok(image) => {
            log::debug!("loaded tile {} ({}x{})", id, image.width, image.height);
            cache.put(id, image);
            TileOutcome::Loaded
        }
        Err(TileError::NotFound(path)) => {
            log::debug!("{} is not an available tile", path.display());
            cache.mark_missing(id);
            TileOutcome::Missing
        }
        Err(e @ TileError::Corrupt { .. }) => {
            log::warn!("{}", e);
            cache.mark_missing(id);
            TileOutcome::Corrupt
        }
    }
}
