//! Core constants of the tile layout and the on-disk naming scheme.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Default number of entries held by the tile cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 80;

/// Width of the column field of a [`TileId`](crate::core::geo::TileId), bits 0..12.
pub const TILE_ID_COLUMN_BITS: u32 = 12;

/// Width of the row field of a [`TileId`](crate::core::geo::TileId), bits 12..24.
pub const TILE_ID_ROW_BITS: u32 = 12;

/// Width of the level field of a [`TileId`](crate::core::geo::TileId), bits 24..32.
pub const TILE_ID_LEVEL_BITS: u32 = 8;

/// Largest column (and row) index a tile id can carry.
pub const MAX_TILE_INDEX: u32 = (1 << TILE_ID_COLUMN_BITS) - 1;

/// On-disk number of the lowest magnification level.
pub const LEVEL_LOW: u8 = 22;

/// On-disk number of the medium magnification level, the one a map opens at.
pub const LEVEL_MEDIUM: u8 = 23;

/// On-disk number of the highest magnification level.
pub const LEVEL_HIGH: u8 = 24;

/// Baseline scale factors of the low, medium and high levels.
pub const DEFAULT_BASELINE_FACTORS: [f32; 3] = [0.5, 1.0, 2.0];
