//! The visible tile set: which tiles a viewport shows, and where.

use super::loader::{ScreenTile, TileLoader};
use crate::core::geo::{visible_tile_range, TileGrid, TileId, TileRange};
use crate::core::viewport::ViewportState;
use crate::core::zoom::ZoomLevel;
use crate::prelude::HashMap;
use crate::Result;
use std::sync::Arc;

/// One generation of positioned tiles, row-major.
///
/// Positions are relative to the viewport as it was when the list was built
/// (the anchor). A list reused across sub-tile pans is drawn shifted by
/// [`TileList::draw_offset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileList {
    pub level: ZoomLevel,
    pub range: TileRange,
    pub anchor_x: i32,
    pub anchor_y: i32,
    tiles: Vec<ScreenTile>,
}

impl TileList {
    fn empty(level: ZoomLevel) -> Self {
        Self {
            level,
            range: TileRange::new(0, 0, -1, -1),
            anchor_x: 0,
            anchor_y: 0,
            tiles: Vec::new(),
        }
    }

    pub fn tiles(&self) -> &[ScreenTile] {
        &self.tiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScreenTile> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.iter().any(|tile| tile.id == id)
    }

    /// Shift to add to every tile position when drawing for `state`
    pub fn draw_offset(&self, state: &ViewportState) -> (i32, i32) {
        (
            self.anchor_x.saturating_sub(state.cur_x),
            self.anchor_y.saturating_sub(state.cur_y),
        )
    }
}

/// Screen coordinate of tile `index` for a viewport starting at map pixel `cur`
fn screen_position(index: i32, tile_size: u32, cur: i32) -> i32 {
    let position = i64::from(index) * i64::from(tile_size) - i64::from(cur);
    position.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl<'a> IntoIterator for &'a TileList {
    type Item = &'a ScreenTile;
    type IntoIter = std::slice::Iter<'a, ScreenTile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

/// Memo key: the tile list is rebuilt only when this changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VisibleBox {
    range: TileRange,
    level: ZoomLevel,
}

/// Turns viewport updates into tile lists, skipping the rebuild while the
/// viewport stays within the same tile-index box.
#[derive(Debug)]
pub struct ViewportTileSet {
    loader: TileLoader,
    tile_size: u32,
    grids: HashMap<ZoomLevel, TileGrid>,
    state: Option<ViewportState>,
    visible: Option<VisibleBox>,
    current: Arc<TileList>,
}

impl ViewportTileSet {
    pub fn new(loader: TileLoader, tile_size: u32) -> Self {
        assert!(tile_size > 0, "tile size must be positive");
        Self {
            loader,
            tile_size,
            grids: HashMap::default(),
            state: None,
            visible: None,
            current: Arc::new(TileList::empty(ZoomLevel::default())),
        }
    }

    /// Move the viewport and return the tiles it shows.
    ///
    /// The requested position is clamped to the map (see
    /// [`ViewportState::clamped_to`]). When the visible box and level are
    /// unchanged since the last rebuild the previous list is returned as is.
    pub fn update(
        &mut self,
        cur_x: i32,
        cur_y: i32,
        level: ZoomLevel,
        view_width: u32,
        view_height: u32,
    ) -> Result<Arc<TileList>> {
        self.update_state(ViewportState::new(cur_x, cur_y, level, view_width, view_height))
    }

    pub fn update_state(&mut self, requested: ViewportState) -> Result<Arc<TileList>> {
        let grid = self.grid(requested.level)?;
        let state = requested.clamped_to(&grid);
        let range = visible_tile_range(
            state.cur_x,
            state.cur_y,
            state.view_width,
            state.view_height,
            self.tile_size,
        );
        self.state = Some(state);

        let visible = VisibleBox {
            range,
            level: state.level,
        };
        if self.visible == Some(visible) {
            return Ok(self.current.clone());
        }

        Ok(self.rebuild(state, range, &grid))
    }

    /// New generation of the current list with every tile's state re-read
    /// from the cache, e.g. after background loads completed.
    ///
    /// Positions and anchor are kept and nothing is requested, so a tile
    /// evicted meanwhile shows as not loaded until the next rebuild.
    pub fn refresh(&mut self) -> Arc<TileList> {
        let tiles = self
            .current
            .iter()
            .map(|tile| self.loader.refreshed(tile))
            .collect();
        self.current = Arc::new(TileList {
            level: self.current.level,
            range: self.current.range,
            anchor_x: self.current.anchor_x,
            anchor_y: self.current.anchor_y,
            tiles,
        });
        self.current.clone()
    }

    fn rebuild(&mut self, state: ViewportState, range: TileRange, grid: &TileGrid) -> Arc<TileList> {
        // Cells outside the grid have no file and no valid id
        let cells = grid.clip(range);

        let mut tiles = Vec::with_capacity(cells.columns() as usize * cells.rows() as usize);
        for (column, row) in cells.iter() {
            let Some(id) = grid.tile_id(column, row, state.level) else {
                continue;
            };
            let x = screen_position(column, self.tile_size, state.cur_x);
            let y = screen_position(row, self.tile_size, state.cur_y);
            tiles.push(self.loader.request(id, x, y));
        }

        let capacity = self.loader.cache().capacity();
        if tiles.len() > capacity {
            log::warn!(
                "{} visible tiles exceed the cache capacity of {}",
                tiles.len(),
                capacity
            );
        }

        log::debug!(
            "rebuilt tile list for level {}: columns {}..={}, rows {}..={}, {} tiles",
            state.level,
            range.left_col,
            range.right_col,
            range.top_row,
            range.bottom_row,
            tiles.len()
        );

        self.visible = Some(VisibleBox {
            range,
            level: state.level,
        });
        self.current = Arc::new(TileList {
            level: state.level,
            range,
            anchor_x: state.cur_x,
            anchor_y: state.cur_y,
            tiles,
        });
        self.current.clone()
    }

    /// Grid of `level`, read from the store once per level
    pub fn grid(&mut self, level: ZoomLevel) -> Result<TileGrid> {
        if let Some(grid) = self.grids.get(&level) {
            return Ok(*grid);
        }

        let (width, height) = self.loader.store().map_dimensions(level)?;
        let grid = TileGrid::for_map(width, height, self.tile_size)?;
        log::info!(
            "level {} map is {}x{} px, {}x{} tiles",
            level,
            width,
            height,
            grid.columns,
            grid.rows
        );
        self.grids.insert(level, grid);
        Ok(grid)
    }

    /// Viewport after the last update, clamped
    pub fn state(&self) -> Option<ViewportState> {
        self.state
    }

    /// The list produced by the last update
    pub fn current(&self) -> Arc<TileList> {
        self.current.clone()
    }

    pub fn loader(&self) -> &TileLoader {
        &self.loader
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
}
