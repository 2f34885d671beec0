//! # slicemap
//!
//! Viewport-driven tile addressing, caching and asynchronous loading for very
//! large raster maps that have been pre-sliced into fixed-size tiles on disk.
//!
//! The crate computes which tiles a scrollable, zoomable viewport can see,
//! assigns every tile a stable packed identifier, serves decoded tiles from a
//! bounded LRU cache and schedules non-blocking decodes for the rest. Drawing,
//! gesture recognition and window lifecycle stay with the host: it feeds
//! [`input::events::MapEvent`]s in and blits the [`tiles::set::TileList`] it
//! gets back.

pub mod core;
pub mod input;
pub mod prelude;
pub mod runtime;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::SliceMapConfig,
    geo::{TileCoord, TileGrid, TileId, TileRange},
    map::SlicedMapView,
    viewport::ViewportState,
    zoom::{ZoomController, ZoomLevel},
};

pub use crate::tiles::{
    cache::{TileCache, TileLoadState},
    loader::{ScreenTile, TileEvent, TileLoader, TileOutcome},
    set::{TileList, ViewportTileSet},
    slicer::{slice_level, SliceOptions, SliceReport},
    source::{DirectoryTileStore, TileImage, TileStore},
};

pub use crate::input::events::MapEvent;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid zoom level {0}: must be one of 22, 23 or 24")]
    InvalidLevel(u8),

    #[error("Tile coordinate {column},{row} is outside the addressable range")]
    CoordinateOutOfRange { column: i64, row: i64 },

    #[error("Map of {width}x{height} px needs a {columns}x{rows} grid, more than the id layout can address")]
    GridTooLarge {
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
    },

    #[error("Full map for level {level} is unavailable: {source}")]
    MapUnavailable {
        level: u8,
        #[source]
        source: image::ImageError,
    },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
