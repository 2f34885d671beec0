use crate::core::geo::TileGrid;
use crate::core::zoom::ZoomLevel;
use serde::{Deserialize, Serialize};

/// Position and size of the visible window into one zoom level's map.
///
/// `cur_x`/`cur_y` are the map pixel under the viewport's top-left corner;
/// they go negative when a map smaller than the view is centred in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportState {
    pub cur_x: i32,
    pub cur_y: i32,
    pub level: ZoomLevel,
    pub view_width: u32,
    pub view_height: u32,
}

impl ViewportState {
    pub fn new(cur_x: i32, cur_y: i32, level: ZoomLevel, view_width: u32, view_height: u32) -> Self {
        Self {
            cur_x,
            cur_y,
            level,
            view_width,
            view_height,
        }
    }

    /// Viewport of the given size with the gridded map centred in it
    pub fn centered(level: ZoomLevel, view_width: u32, view_height: u32, grid: &TileGrid) -> Self {
        Self::new(
            center_axis(grid.width(), view_width),
            center_axis(grid.height(), view_height),
            level,
            view_width,
            view_height,
        )
    }

    /// Keep the viewport inside the gridded map on every axis where the map
    /// is larger than the view. Axes where the map fits are left alone, so a
    /// centred small map keeps its margins.
    pub fn clamped_to(self, grid: &TileGrid) -> Self {
        Self {
            cur_x: clamp_axis(self.cur_x, self.view_width, grid.width()),
            cur_y: clamp_axis(self.cur_y, self.view_height, grid.height()),
            ..self
        }
    }

    /// Scroll by a pixel delta. An axis on which the map is not larger than
    /// the view does not scroll.
    pub fn panned(self, dx: i32, dy: i32, grid: &TileGrid) -> Self {
        let dx = if grid.width() <= self.view_width { 0 } else { dx };
        let dy = if grid.height() <= self.view_height { 0 } else { dy };
        Self {
            cur_x: self.cur_x.saturating_add(dx),
            cur_y: self.cur_y.saturating_add(dy),
            ..self
        }
        .clamped_to(grid)
    }

    pub fn with_size(self, view_width: u32, view_height: u32) -> Self {
        Self {
            view_width,
            view_height,
            ..self
        }
    }

    /// Change the view size, keeping the position where the map is still
    /// larger than the view. An axis on which the map now fits is recentred.
    pub fn resized(self, view_width: u32, view_height: u32, grid: &TileGrid) -> Self {
        let cur_x = if grid.width() <= view_width {
            center_axis(grid.width(), view_width)
        } else {
            self.cur_x
        };
        let cur_y = if grid.height() <= view_height {
            center_axis(grid.height(), view_height)
        } else {
            self.cur_y
        };
        Self {
            cur_x,
            cur_y,
            ..self.with_size(view_width, view_height)
        }
        .clamped_to(grid)
    }
}

fn center_axis(extent: u32, view: u32) -> i32 {
    ((i64::from(extent) - i64::from(view)) / 2) as i32
}

fn clamp_axis(cur: i32, view: u32, extent: u32) -> i32 {
    if extent > view {
        cur.clamp(0, (extent - view) as i32)
    } else {
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32) -> TileGrid {
        TileGrid::for_map(width, height, 256).unwrap()
    }

    #[test]
    fn test_centered_on_large_and_small_maps() {
        let big = grid(2000, 1500); // 2048 x 1536
        let state = ViewportState::centered(ZoomLevel::Medium, 400, 300, &big);
        assert_eq!((state.cur_x, state.cur_y), (824, 618));

        let small = grid(700, 300); // 768 x 512
        let state = ViewportState::centered(ZoomLevel::Low, 1080, 1920, &small);
        assert_eq!((state.cur_x, state.cur_y), (-156, -704));
    }

    #[test]
    fn test_clamp_only_where_map_exceeds_view() {
        let g = grid(768, 512);

        // Map wider than view: clamped on x. Map shorter than view: y untouched
        let state = ViewportState::new(-50, -300, ZoomLevel::Low, 400, 600).clamped_to(&g);
        assert_eq!((state.cur_x, state.cur_y), (0, -300));

        let state = ViewportState::new(900, 20, ZoomLevel::Low, 400, 600).clamped_to(&g);
        assert_eq!(state.cur_x, 368);
        assert_eq!(state.cur_y, 20);
    }

    #[test]
    fn test_pan_stops_at_edges() {
        let g = grid(768, 512);
        let state = ViewportState::new(100, 50, ZoomLevel::Low, 400, 300);

        let moved = state.panned(30, -20, &g);
        assert_eq!((moved.cur_x, moved.cur_y), (130, 30));

        let moved = state.panned(10_000, 10_000, &g);
        assert_eq!((moved.cur_x, moved.cur_y), (368, 212));

        let moved = state.panned(-10_000, -10_000, &g);
        assert_eq!((moved.cur_x, moved.cur_y), (0, 0));
    }

    #[test]
    fn test_resize_recentres_axis_that_now_fits() {
        let g = grid(2000, 1500); // 2048 x 1536
        let state = ViewportState::new(1648, 100, ZoomLevel::Medium, 400, 300);

        let wide = state.resized(3000, 300, &g);
        assert_eq!((wide.cur_x, wide.cur_y), (-476, 100));
        assert_eq!((wide.view_width, wide.view_height), (3000, 300));

        // Shrinking again keeps the map in view
        let narrow = wide.resized(400, 300, &g);
        assert_eq!((narrow.cur_x, narrow.cur_y), (0, 100));

        let short = state.resized(400, 200, &g);
        assert_eq!((short.cur_x, short.cur_y), (1648, 100));
    }

    #[test]
    fn test_pan_ignored_on_axis_where_map_fits() {
        let g = grid(768, 512);
        let state = ViewportState::centered(ZoomLevel::Low, 1000, 300, &g);
        let moved = state.panned(40, 40, &g);
        assert_eq!(moved.cur_x, state.cur_x);
        assert_eq!(moved.cur_y, state.cur_y + 40);
    }
}
