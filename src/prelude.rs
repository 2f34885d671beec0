//! Prelude module for common slicemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use slicemap::prelude::*;`

pub use crate::core::{
    config::{SliceMapConfig, StoreConfig, ZoomConfig},
    geo::{tile_grid_dimensions, visible_tile_range, TileCoord, TileGrid, TileId, TileRange},
    map::SlicedMapView,
    viewport::ViewportState,
    zoom::{ZoomController, ZoomLevel},
};

pub use crate::tiles::{
    cache::{CacheStats, TileCache, TileLoadState},
    loader::{ScreenTile, TileEvent, TileLoader, TileOutcome},
    set::{TileList, ViewportTileSet},
    slicer::{slice_level, slice_level_with, SliceOptions, SliceReport},
    source::{DirectoryTileStore, MemoryTileStore, TileError, TileImage, TileStore},
};

pub use crate::input::{events::MapEvent, gestures::ZoomGesture};

pub use crate::runtime::{runtime, DeferredSpawner, TaskSpawner, ThreadSpawner};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioSpawner;

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
