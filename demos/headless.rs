use slicemap::prelude::*;
use std::sync::Arc;

/// Drive a sliced map view without any UI, pumping tile loads by hand
fn main() -> slicemap::Result<()> {
    println!("🗺️ Slicemap Headless Example");
    println!("============================");

    // A 2000x1500 medium level and a 4000x3000 high level, tiles held in memory
    let store = Arc::new(MemoryTileStore::new());
    store.set_map_dimensions(ZoomLevel::Medium, 2000, 1500);
    store.set_map_dimensions(ZoomLevel::High, 4000, 3000);
    for level in [ZoomLevel::Medium, ZoomLevel::High] {
        let (width, height) = store.map_dimensions(level)?;
        let grid = TileGrid::for_map(width, height, 256)?;
        for row in 0..grid.rows {
            for column in 0..grid.columns {
                // Leave a hole so the sparse case shows up
                if (column + row) % 7 == 0 {
                    continue;
                }
                let shade = ((column * 31 + row * 17) % 255) as u8;
                store.insert_tile(
                    TileId::encode(column, row, level),
                    TileImage::from_rgba(1, 1, vec![shade, shade, shade, 255]),
                );
            }
        }
    }

    let spawner = DeferredSpawner::new();
    let loader = TileLoader::with_spawner(
        store,
        TileCache::with_default_capacity(),
        Arc::new(spawner.clone()),
    );
    let mut view = SlicedMapView::with_loader(SliceMapConfig::default(), loader)?;

    let script = [
        MapEvent::Resize {
            width: 1080,
            height: 720,
        },
        MapEvent::Pan { dx: 40, dy: 25 },
        MapEvent::Pan { dx: 300, dy: 0 },
        MapEvent::ZoomBegin,
        MapEvent::ZoomUpdate { factor: 1.3 },
        MapEvent::ZoomUpdate { factor: 1.3 },
        MapEvent::ZoomEnd,
        MapEvent::Pan { dx: -500, dy: -500 },
    ];

    for event in script {
        let list = view.handle_event(event)?;
        let jobs = spawner.run_pending();
        let redrawn = view.poll_redraw()?;

        let state = view.viewport();
        println!("\n▶ {:?}", event);
        if let Some(state) = state {
            println!(
                "   Level {} at ({}, {}), {} tiles, {} decode jobs{}",
                state.level,
                state.cur_x,
                state.cur_y,
                list.len(),
                jobs,
                if redrawn { ", redrawn" } else { "" }
            );
        }
        if view.display_scale() != 1.0 {
            println!("   Gesture scale x{:.2}", view.display_scale());
        }

        let tiles = view.tiles();
        let (dx, dy) = view.draw_offset();
        for tile in tiles.iter().take(4) {
            let state = match &tile.state {
                TileLoadState::Loaded(_) => "loaded",
                TileLoadState::Missing => "missing",
                TileLoadState::Loading => "loading",
                TileLoadState::NotLoaded => "not loaded",
            };
            println!(
                "   📍 tile ({}, {}) at ({}, {}) {}",
                tile.id.column(),
                tile.id.row(),
                tile.screen_x + dx,
                tile.screen_y + dy,
                state
            );
        }
    }

    let stats = view.cache_stats();
    println!(
        "\n📊 Cache: {} entries, {} hits, {} misses, {} evictions",
        stats.size, stats.hits, stats.misses, stats.evictions
    );
    Ok(())
}
