use crate::{
    core::{config::SliceMapConfig, viewport::ViewportState, zoom::ZoomLevel},
    input::{events::MapEvent, gestures::ZoomGesture},
    tiles::{
        cache::{CacheStats, TileCache},
        loader::TileLoader,
        set::{TileList, ViewportTileSet},
        source::{DirectoryTileStore, TileStore},
    },
    Result,
};
use std::sync::Arc;

/// A scrollable, zoomable view of a sliced map.
///
/// Translates host input into viewport updates: the host feeds
/// [`MapEvent`]s, polls for finished background loads once per frame and
/// draws [`SlicedMapView::tiles`] shifted by [`SlicedMapView::draw_offset`]
/// and scaled by [`SlicedMapView::display_scale`].
#[derive(Debug)]
pub struct SlicedMapView {
    config: SliceMapConfig,
    tiles: ViewportTileSet,
    gesture: ZoomGesture,
    level: ZoomLevel,
    view_size: Option<(u32, u32)>,
    list: Arc<TileList>,
}

impl SlicedMapView {
    /// View over the on-disk tile tree named by `config.store`
    pub fn open(config: SliceMapConfig) -> Result<Self> {
        let store = Arc::new(DirectoryTileStore::new(config.store.clone()));
        Self::new(config, store)
    }

    /// View over any tile store, loading on the global runtime
    pub fn new(config: SliceMapConfig, store: Arc<dyn TileStore>) -> Result<Self> {
        let loader = TileLoader::new(store, TileCache::new(config.cache_capacity));
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: SliceMapConfig, loader: TileLoader) -> Result<Self> {
        config.validate()?;
        let tiles = ViewportTileSet::new(loader, config.tile_size);
        let list = tiles.current();
        Ok(Self {
            gesture: ZoomGesture::new(config.zoom.controller()),
            level: config.zoom.initial_level,
            config,
            tiles,
            view_size: None,
            list,
        })
    }

    /// Apply one input event and return the tile list to draw
    pub fn handle_event(&mut self, event: MapEvent) -> Result<Arc<TileList>> {
        match event {
            MapEvent::Resize { width, height } => self.resize(width, height)?,
            MapEvent::Pan { dx, dy } => self.pan(dx, dy)?,
            MapEvent::ZoomBegin => self.gesture.begin(self.level),
            MapEvent::ZoomUpdate { factor } => self.gesture.update(factor),
            MapEvent::ZoomEnd => {
                if let Some(level) = self.gesture.end() {
                    if level != self.level {
                        self.set_level(level)?;
                    }
                }
            }
        }
        Ok(self.list.clone())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let first = self.view_size.is_none();
        self.view_size = Some((width, height));

        match self.tiles.state() {
            Some(state) if !first && state.level == self.level => {
                let grid = self.tiles.grid(state.level)?;
                self.list = self
                    .tiles
                    .update_state(state.resized(width, height, &grid))?;
                Ok(())
            }
            _ => self.load_level(self.level),
        }
    }

    fn pan(&mut self, dx: i32, dy: i32) -> Result<()> {
        let Some(state) = self.tiles.state() else {
            return Ok(());
        };
        let grid = self.tiles.grid(state.level)?;
        self.list = self.tiles.update_state(state.panned(dx, dy, &grid))?;
        Ok(())
    }

    /// Switch to `level`. Before the first resize only the level is recorded.
    pub fn set_level(&mut self, level: ZoomLevel) -> Result<()> {
        if self.view_size.is_none() {
            self.level = level;
            return Ok(());
        }
        self.load_level(level)
    }

    /// Read the level's map frame and centre the viewport on it
    fn load_level(&mut self, level: ZoomLevel) -> Result<()> {
        let Some((width, height)) = self.view_size else {
            return Ok(());
        };
        let grid = self.tiles.grid(level)?;
        log::info!(
            "showing level {} ({}x{} tiles) in a {}x{} view",
            level,
            grid.columns,
            grid.rows,
            width,
            height
        );

        let state = ViewportState::centered(level, width, height, &grid);
        self.list = self.tiles.update_state(state)?;
        self.level = level;
        Ok(())
    }

    /// Drain finished background loads. Rebuilds the tile list and returns
    /// `true` when one of them belongs to it.
    pub fn poll_redraw(&mut self) -> Result<bool> {
        let events = self.tiles.loader().try_recv_events();
        if !events.iter().any(|event| self.list.contains(event.id)) {
            return Ok(false);
        }

        log::debug!("{} tile load(s) finished, redrawing", events.len());
        self.list = self.tiles.refresh();
        Ok(true)
    }

    /// Tiles to draw, positioned relative to [`TileList::anchor_x`]/`anchor_y`
    pub fn tiles(&self) -> Arc<TileList> {
        self.list.clone()
    }

    /// Shift to add to every tile position of [`SlicedMapView::tiles`]
    pub fn draw_offset(&self) -> (i32, i32) {
        match self.tiles.state() {
            Some(state) => self.list.draw_offset(&state),
            None => (0, 0),
        }
    }

    /// Scale of an in-progress zoom gesture, 1.0 otherwise
    pub fn display_scale(&self) -> f32 {
        self.gesture.display_scale()
    }

    pub fn level(&self) -> ZoomLevel {
        self.level
    }

    pub fn viewport(&self) -> Option<ViewportState> {
        self.tiles.state()
    }

    pub fn config(&self) -> &SliceMapConfig {
        &self.config
    }

    pub fn tile_set(&self) -> &ViewportTileSet {
        &self.tiles
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.tiles.loader().cache().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::TileId;
    use crate::runtime::DeferredSpawner;
    use crate::tiles::cache::TileLoadState;
    use crate::tiles::source::{MemoryTileStore, TileImage};

    fn fixture() -> (DeferredSpawner, SlicedMapView) {
        let store = Arc::new(MemoryTileStore::new());
        store.set_map_dimensions(ZoomLevel::Low, 300, 200);
        store.set_map_dimensions(ZoomLevel::Medium, 2000, 1500);
        store.set_map_dimensions(ZoomLevel::High, 4000, 3000);
        for row in 0..6 {
            for column in 0..8 {
                store.insert_tile(
                    TileId::encode(column, row, ZoomLevel::Medium),
                    TileImage::from_rgba(1, 1, vec![0, 0, 0, 255]),
                );
            }
        }

        let spawner = DeferredSpawner::new();
        let loader = TileLoader::with_spawner(store, TileCache::new(80), Arc::new(spawner.clone()));
        let view = SlicedMapView::with_loader(SliceMapConfig::default(), loader).unwrap();
        (spawner, view)
    }

    fn resize(view: &mut SlicedMapView, width: u32, height: u32) -> Arc<TileList> {
        view.handle_event(MapEvent::Resize { width, height }).unwrap()
    }

    #[test]
    fn test_first_resize_centres_map() {
        let (_, mut view) = fixture();
        assert!(view.tiles().is_empty());

        let list = resize(&mut view, 400, 300);
        let state = view.viewport().unwrap();
        assert_eq!((state.cur_x, state.cur_y), (824, 618));
        assert_eq!(state.level, ZoomLevel::Medium);
        // columns 3..=4, rows 2..=3
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_pan_before_resize_is_ignored() {
        let (_, mut view) = fixture();
        let list = view.handle_event(MapEvent::Pan { dx: 10, dy: 10 }).unwrap();
        assert!(list.is_empty());
        assert!(view.viewport().is_none());
    }

    #[test]
    fn test_sub_tile_pan_reuses_list() {
        let (spawner, mut view) = fixture();
        let before = resize(&mut view, 400, 300);
        let after = view.handle_event(MapEvent::Pan { dx: 10, dy: -5 }).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(view.draw_offset(), (-10, 5));
        assert_eq!(spawner.pending(), before.len());
    }

    #[test]
    fn test_later_resize_keeps_position() {
        let (_, mut view) = fixture();
        resize(&mut view, 400, 300);
        view.handle_event(MapEvent::Pan { dx: 100, dy: 0 }).unwrap();
        resize(&mut view, 800, 300);
        let state = view.viewport().unwrap();
        assert_eq!((state.cur_x, state.view_width), (924, 800));
    }

    #[test]
    fn test_widening_past_map_recentres_after_pan() {
        let (_, mut view) = fixture();
        resize(&mut view, 400, 300);
        view.handle_event(MapEvent::Pan { dx: 1000, dy: 0 }).unwrap();
        assert_eq!(view.viewport().unwrap().cur_x, 1648);

        resize(&mut view, 3000, 300);
        let state = view.viewport().unwrap();
        // 2048 px map centred in 3000 px
        assert_eq!(state.cur_x, -476);

        view.handle_event(MapEvent::Pan { dx: -5000, dy: 0 }).unwrap();
        assert_eq!(view.viewport().unwrap().cur_x, -476);
        let left = view.tiles().iter().map(|t| t.screen_x).min().unwrap();
        assert_eq!(left + view.draw_offset().0, 476);
    }

    #[test]
    fn test_redraws_settle_when_view_outgrows_cache() {
        let store = Arc::new(MemoryTileStore::new());
        store.set_map_dimensions(ZoomLevel::Medium, 768, 512);
        for row in 0..2 {
            for column in 0..3 {
                store.insert_tile(
                    TileId::encode(column, row, ZoomLevel::Medium),
                    TileImage::from_rgba(1, 1, vec![0, 0, 0, 255]),
                );
            }
        }
        let spawner = DeferredSpawner::new();
        let loader = TileLoader::with_spawner(
            store.clone(),
            TileCache::new(4),
            Arc::new(spawner.clone()),
        );
        let mut view = SlicedMapView::with_loader(SliceMapConfig::default(), loader).unwrap();
        resize(&mut view, 768, 512);

        let mut redraws = 0;
        for _ in 0..50 {
            spawner.run_pending();
            if view.poll_redraw().unwrap() {
                redraws += 1;
            }
        }
        assert_eq!(redraws, 1);
        assert_eq!(store.load_count(), 6);
        assert_eq!(spawner.pending(), 0);
    }

    #[test]
    fn test_zoom_gesture_switches_level_and_recentres() {
        let (_, mut view) = fixture();
        resize(&mut view, 400, 300);

        view.handle_event(MapEvent::ZoomBegin).unwrap();
        view.handle_event(MapEvent::ZoomUpdate { factor: 1.6 }).unwrap();
        assert_eq!(view.display_scale(), 1.6);
        assert_eq!(view.level(), ZoomLevel::Medium);

        let list = view.handle_event(MapEvent::ZoomEnd).unwrap();
        assert_eq!(view.level(), ZoomLevel::High);
        assert_eq!(view.display_scale(), 1.0);
        assert!(list.iter().all(|tile| tile.id.level() == ZoomLevel::High));
        let state = view.viewport().unwrap();
        assert_eq!((state.cur_x, state.cur_y), ((4096 - 400) / 2, (3072 - 300) / 2));
    }

    #[test]
    fn test_small_map_is_not_scrolled() {
        let (_, mut view) = fixture();
        view.set_level(ZoomLevel::Low).unwrap();
        resize(&mut view, 600, 300); // 512 x 256 grid
        let centred = view.viewport().unwrap();
        assert_eq!((centred.cur_x, centred.cur_y), (-44, -22));

        view.handle_event(MapEvent::Pan { dx: 50, dy: 50 }).unwrap();
        assert_eq!(view.viewport().unwrap(), centred);
    }

    #[test]
    fn test_poll_redraw_after_loads_finish() {
        let (spawner, mut view) = fixture();
        let before = resize(&mut view, 400, 300);
        assert!(!view.poll_redraw().unwrap());

        spawner.run_pending();
        assert!(view.poll_redraw().unwrap());
        let after = view.tiles();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after
            .iter()
            .all(|tile| matches!(tile.state, TileLoadState::Loaded(_))));
        assert!(!view.poll_redraw().unwrap());
    }

    #[test]
    fn test_failed_level_switch_keeps_level() {
        let store = Arc::new(MemoryTileStore::new());
        store.set_map_dimensions(ZoomLevel::Medium, 512, 512);
        let loader = TileLoader::with_spawner(
            store,
            TileCache::new(8),
            Arc::new(DeferredSpawner::new()),
        );
        let mut view = SlicedMapView::with_loader(SliceMapConfig::default(), loader).unwrap();
        resize(&mut view, 256, 256);

        assert!(view.set_level(ZoomLevel::High).is_err());
        assert_eq!(view.level(), ZoomLevel::Medium);
    }
}
