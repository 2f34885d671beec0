//! Tile addressing: packed tile identifiers, tile-index ranges and map grids.
//!
//! A [`TileId`] doubles as the filename stem of a tile on disk, so its bit
//! layout is a stable contract:
//!
//! ```text
//! | level (8) | row (12) | column (12) |
//! 31       24 23      12 11          0
//! ```
//!
//! `level` is the on-disk level number (22, 23 or 24). Columns and rows are
//! limited to `0..=4095`, which bounds a map at 4096 x 4096 tiles.

use crate::constants::{MAX_TILE_INDEX, TILE_ID_COLUMN_BITS, TILE_ID_LEVEL_BITS, TILE_ID_ROW_BITS};
use crate::core::zoom::ZoomLevel;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

const COLUMN_SHIFT: u32 = 0;
const ROW_SHIFT: u32 = TILE_ID_COLUMN_BITS;
const LEVEL_SHIFT: u32 = TILE_ID_COLUMN_BITS + TILE_ID_ROW_BITS;

const COLUMN_MASK: u32 = (1 << TILE_ID_COLUMN_BITS) - 1;
const ROW_MASK: u32 = (1 << TILE_ID_ROW_BITS) - 1;
const LEVEL_MASK: u32 = (1 << TILE_ID_LEVEL_BITS) - 1;

/// Logical address of a tile before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub column: u32,
    pub row: u32,
    pub level: ZoomLevel,
}

impl TileCoord {
    pub fn new(column: u32, row: u32, level: ZoomLevel) -> Self {
        Self { column, row, level }
    }

    /// Encode into the packed identifier
    pub fn id(&self) -> TileId {
        TileId::encode(self.column, self.row, self.level)
    }
}

/// Packed (column, row, level) identifier of one tile image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TileId(u32);

impl TileId {
    /// Pack a tile address.
    ///
    /// Panics if `column` or `row` exceeds [`MAX_TILE_INDEX`]; grids are
    /// validated by [`TileGrid::for_map`] so in-grid coordinates always fit.
    pub fn encode(column: u32, row: u32, level: ZoomLevel) -> Self {
        assert!(
            column <= MAX_TILE_INDEX && row <= MAX_TILE_INDEX,
            "tile {},{} does not fit the 12-bit column/row fields",
            column,
            row
        );
        TileId(
            (column & COLUMN_MASK) << COLUMN_SHIFT
                | (row & ROW_MASK) << ROW_SHIFT
                | (u32::from(level.number()) & LEVEL_MASK) << LEVEL_SHIFT,
        )
    }

    /// Checked variant of [`TileId::encode`] for signed grid indices
    pub fn try_encode(column: i64, row: i64, level: ZoomLevel) -> Result<Self> {
        let max = i64::from(MAX_TILE_INDEX);
        if !(0..=max).contains(&column) || !(0..=max).contains(&row) {
            return Err(MapError::CoordinateOutOfRange { column, row });
        }
        Ok(Self::encode(column as u32, row as u32, level))
    }

    /// Rebuild an id from its raw value, e.g. a filename stem
    pub fn from_raw(raw: u32) -> Result<Self> {
        ZoomLevel::from_number(((raw >> LEVEL_SHIFT) & LEVEL_MASK) as u8)?;
        Ok(TileId(raw))
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn column(self) -> u32 {
        (self.0 >> COLUMN_SHIFT) & COLUMN_MASK
    }

    pub fn row(self) -> u32 {
        (self.0 >> ROW_SHIFT) & ROW_MASK
    }

    pub fn level(self) -> ZoomLevel {
        match ZoomLevel::from_number(((self.0 >> LEVEL_SHIFT) & LEVEL_MASK) as u8) {
            Ok(level) => level,
            Err(_) => unreachable!("tile id {} carries an unknown level", self.0),
        }
    }

    /// Unpack into the logical address
    pub fn decode(self) -> TileCoord {
        TileCoord::new(self.column(), self.row(), self.level())
    }
}

impl TryFrom<u32> for TileId {
    type Error = MapError;

    fn try_from(raw: u32) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<TileId> for u32 {
    fn from(id: TileId) -> u32 {
        id.0
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TileId {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s
            .parse::<u32>()
            .map_err(|e| MapError::ParseError(format!("tile id '{}': {}", s, e)))?;
        Self::from_raw(raw)
    }
}

/// Inclusive range of tile columns and rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRange {
    pub left_col: i32,
    pub top_row: i32,
    pub right_col: i32,
    pub bottom_row: i32,
}

impl TileRange {
    pub fn new(left_col: i32, top_row: i32, right_col: i32, bottom_row: i32) -> Self {
        Self {
            left_col,
            top_row,
            right_col,
            bottom_row,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.right_col < self.left_col || self.bottom_row < self.top_row
    }

    pub fn columns(&self) -> u32 {
        (i64::from(self.right_col) - i64::from(self.left_col) + 1).max(0) as u32
    }

    pub fn rows(&self) -> u32 {
        (i64::from(self.bottom_row) - i64::from(self.top_row) + 1).max(0) as u32
    }

    pub fn contains(&self, column: i32, row: i32) -> bool {
        (self.left_col..=self.right_col).contains(&column)
            && (self.top_row..=self.bottom_row).contains(&row)
    }

    /// All (column, row) pairs, top-to-bottom then left-to-right
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> {
        let (left, right) = (self.left_col, self.right_col);
        (self.top_row..=self.bottom_row).flat_map(move |row| (left..=right).map(move |col| (col, row)))
    }

    /// Pixel rectangle covered by the range, inclusive: (left, top, right, bottom)
    pub fn pixel_extent(&self, tile_size: u32) -> (i64, i64, i64, i64) {
        let t = i64::from(tile_size);
        (
            i64::from(self.left_col) * t,
            i64::from(self.top_row) * t,
            (i64::from(self.right_col) + 1) * t - 1,
            (i64::from(self.bottom_row) + 1) * t - 1,
        )
    }
}

/// Tile columns/rows intersecting a viewport.
///
/// Edges are floor-divided so negative offsets (a centred map smaller than
/// the view) land in negative tile indices. A zero-sized viewport yields an
/// empty range.
pub fn visible_tile_range(left: i32, top: i32, width: u32, height: u32, tile_size: u32) -> TileRange {
    debug_assert!(tile_size > 0);
    let t = i64::from(tile_size);
    let left = i64::from(left);
    let top = i64::from(top);
    let right = left + i64::from(width) - 1;
    let bottom = top + i64::from(height) - 1;

    let left_col = left.div_euclid(t) as i32;
    let top_row = top.div_euclid(t) as i32;
    if width == 0 || height == 0 {
        return TileRange::new(left_col, top_row, left_col - 1, top_row - 1);
    }

    TileRange::new(
        left_col,
        top_row,
        right.div_euclid(t) as i32,
        bottom.div_euclid(t) as i32,
    )
}

/// Number of tile columns and rows needed to cover a map (ceiling division)
pub fn tile_grid_dimensions(map_width: u32, map_height: u32, tile_size: u32) -> (u32, u32) {
    (map_width.div_ceil(tile_size), map_height.div_ceil(tile_size))
}

/// Tile grid of one zoom level's map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
    pub tile_size: u32,
    /// Pixel size of the source image before gridding
    pub map_width: u32,
    pub map_height: u32,
}

impl TileGrid {
    /// Grid covering a `map_width` x `map_height` image, rejected if the id
    /// layout cannot address every tile
    pub fn for_map(map_width: u32, map_height: u32, tile_size: u32) -> Result<Self> {
        let (columns, rows) = tile_grid_dimensions(map_width, map_height, tile_size);
        if columns > MAX_TILE_INDEX + 1 || rows > MAX_TILE_INDEX + 1 {
            return Err(MapError::GridTooLarge {
                width: map_width,
                height: map_height,
                columns,
                rows,
            });
        }

        Ok(Self {
            columns,
            rows,
            tile_size,
            map_width,
            map_height,
        })
    }

    /// Gridded width in pixels, never smaller than the map width
    pub fn width(&self) -> u32 {
        self.columns * self.tile_size
    }

    /// Gridded height in pixels, never smaller than the map height
    pub fn height(&self) -> u32 {
        self.rows * self.tile_size
    }

    pub fn contains(&self, column: i32, row: i32) -> bool {
        column >= 0 && row >= 0 && (column as u32) < self.columns && (row as u32) < self.rows
    }

    /// Part of `range` that lies inside the grid, possibly empty
    pub fn clip(&self, range: TileRange) -> TileRange {
        TileRange::new(
            range.left_col.max(0),
            range.top_row.max(0),
            range.right_col.min(self.columns as i32 - 1),
            range.bottom_row.min(self.rows as i32 - 1),
        )
    }

    /// Id of an in-grid tile, `None` for cells outside the grid
    pub fn tile_id(&self, column: i32, row: i32, level: ZoomLevel) -> Option<TileId> {
        self.contains(column, row)
            .then(|| TileId::encode(column as u32, row as u32, level))
    }
}
