use slicemap::prelude::*;
use std::sync::Arc;

/// End-to-end scenarios: a level sliced to disk, viewed through the public API
#[cfg(test)]
mod integration_tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    /// Slice a 768x512 medium level (3 x 2 tiles of 256) into a temp dir
    fn sliced_tree() -> (tempfile::TempDir, SliceMapConfig) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SliceMapConfig::for_testing(dir.path());
        config.tile_size = 256;
        config.cache_capacity = 80;

        let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(768, 512, |x, y| {
            Rgba([(x / 256) as u8 * 60, (y / 256) as u8 * 60, 128, 255])
        }));
        let report = slice_level(&config.store, ZoomLevel::Medium, &image, 256).unwrap();
        assert_eq!(report.written, 6);
        (dir, config)
    }

    fn deferred_view(config: SliceMapConfig) -> (DeferredSpawner, SlicedMapView) {
        let spawner = DeferredSpawner::new();
        let store = Arc::new(DirectoryTileStore::new(config.store.clone()));
        let loader = TileLoader::with_spawner(
            store,
            TileCache::new(config.cache_capacity),
            Arc::new(spawner.clone()),
        );
        let view = SlicedMapView::with_loader(config, loader).unwrap();
        (spawner, view)
    }

    #[test]
    fn test_visible_tiles_positions_from_disk() {
        println!("🧪 [TEST] 3x2 grid, 400x300 view at (100, 50)");
        let (_dir, config) = sliced_tree();
        let spawner = DeferredSpawner::new();
        let loader = TileLoader::with_spawner(
            Arc::new(DirectoryTileStore::new(config.store.clone())),
            TileCache::new(80),
            Arc::new(spawner.clone()),
        );
        let mut set = ViewportTileSet::new(loader, 256);

        let list = set.update(100, 50, ZoomLevel::Medium, 400, 300).unwrap();
        assert_eq!(list.range, TileRange::new(0, 0, 1, 1));
        let positions: Vec<_> = list.iter().map(|t| (t.screen_x, t.screen_y)).collect();
        assert_eq!(positions, vec![(-100, -50), (156, -50), (-100, 206), (156, 206)]);

        assert_eq!(spawner.run_pending(), 4);
        let list = set.refresh();
        for tile in list.iter() {
            let image = tile.state.image().expect("tile decoded");
            assert_eq!((image.width, image.height), (256, 256));
            let expected = [tile.id.column() as u8 * 60, tile.id.row() as u8 * 60, 128, 255];
            assert_eq!(&image.pixels[..4], &expected);
        }
        println!("✅ [TEST] positions and pixels match");
    }

    #[test]
    fn test_memoized_list_is_same_object() {
        let (_dir, config) = sliced_tree();
        let (_, mut view) = deferred_view(config);

        let first = view.handle_event(MapEvent::Resize { width: 400, height: 300 }).unwrap();
        let second = view.handle_event(MapEvent::Pan { dx: 3, dy: 2 }).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_absent_tile_stays_missing_without_new_work() {
        println!("🧪 [TEST] sparse tile set");
        let (_dir, config) = sliced_tree();
        let hole = TileId::encode(1, 0, ZoomLevel::Medium);
        std::fs::remove_file(config.store.tile_path(hole)).unwrap();

        let spawner = DeferredSpawner::new();
        let store = Arc::new(DirectoryTileStore::new(config.store.clone()));
        let loader = TileLoader::with_spawner(store, TileCache::new(80), Arc::new(spawner.clone()));

        assert_eq!(loader.request(hole, 0, 0).state, TileLoadState::Loading);
        assert_eq!(spawner.run_pending(), 1);
        assert_eq!(
            loader.try_recv_events(),
            vec![TileEvent {
                id: hole,
                outcome: TileOutcome::Missing
            }]
        );

        for _ in 0..3 {
            assert_eq!(loader.request(hole, 0, 0).state, TileLoadState::Missing);
        }
        assert_eq!(spawner.pending(), 0);
        assert_eq!(loader.scheduled_count(), 1);
        println!("✅ [TEST] missing tile never rescheduled");
    }

    #[test]
    fn test_corrupt_tile_is_reported_separately() {
        let (_dir, config) = sliced_tree();
        let broken = TileId::encode(0, 1, ZoomLevel::Medium);
        std::fs::write(config.store.tile_path(broken), b"\x89PNG truncated").unwrap();

        let spawner = DeferredSpawner::new();
        let store = Arc::new(DirectoryTileStore::new(config.store.clone()));
        let loader = TileLoader::with_spawner(store, TileCache::new(80), Arc::new(spawner.clone()));

        loader.request(broken, 0, 0);
        spawner.run_pending();
        assert_eq!(loader.try_recv_events()[0].outcome, TileOutcome::Corrupt);
        assert_eq!(loader.request(broken, 0, 0).state, TileLoadState::Missing);
    }

    #[test]
    fn test_zoom_at_upper_midpoint_selects_high() {
        let controller = ZoomController::default();
        assert_eq!(controller.upper_midpoint(), 1.5);
        assert_eq!(controller.factor_to_level(1.5), ZoomLevel::High);
        assert_eq!(controller.factor_to_level(0.75), ZoomLevel::Medium);
        assert_eq!(controller.factor_to_level(0.7499), ZoomLevel::Low);
        assert!(matches!(
            controller.level_to_baseline_factor(7),
            Err(MapError::InvalidLevel(7))
        ));
    }

    #[test]
    fn test_tile_ids_round_trip_over_grid_edges() {
        for level in ZoomLevel::ALL {
            for &column in &[0, 1, 255, 256, 2047, 4095] {
                for &row in &[0, 1, 16, 4000, 4095] {
                    let id = TileId::encode(column, row, level);
                    assert_eq!(id.decode(), TileCoord::new(column, row, level));
                    assert_eq!(id.to_string().parse::<TileId>().unwrap(), id);
                }
            }
        }
    }

    #[test]
    fn test_visible_range_covers_viewport() {
        for &(x, y) in &[(0, 0), (100, 50), (-156, -704), (255, 256), (-1, -257)] {
            for &(w, h) in &[(1, 1), (400, 300), (1080, 1920), (256, 256)] {
                let range = visible_tile_range(x, y, w, h, 256);
                let (left, top, right, bottom) = range.pixel_extent(256);
                assert!(left <= i64::from(x) && top <= i64::from(y));
                assert!(right >= i64::from(x) + i64::from(w) - 1);
                assert!(bottom >= i64::from(y) + i64::from(h) - 1);
                // No spare tile on any side
                assert!(left + 256 > i64::from(x) && top + 256 > i64::from(y));
            }
        }
    }

    #[test]
    fn test_config_file_drives_directory_view() {
        let (dir, config) = sliced_tree();
        let path = dir.path().join("slicemap.json");
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

        let loaded = SliceMapConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let (spawner, mut view) = deferred_view(loaded);
        view.handle_event(MapEvent::Resize { width: 512, height: 512 }).unwrap();
        let state = view.viewport().unwrap();
        assert_eq!((state.cur_x, state.cur_y), (128, 0));

        spawner.run_pending();
        assert!(view.poll_redraw().unwrap());
        assert!(view.tiles().iter().all(|t| t.state.is_loaded()));
    }
}
