use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use slicemap::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(name = "slicemap-app", about = "Headless driver for sliced maps")]
pub struct Opt {
    /// JSON configuration file; defaults apply when omitted
    #[clap(long = "config", short = 'c', global = true, env = "SLICEMAP_CONFIG")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cut a level image into tiles under the configured root
    Slice {
        image: PathBuf,

        /// Zoom level: 22 (low), 23 (medium) or 24 (high)
        level: u8,

        #[clap(long = "skip-transparent")]
        skip_transparent: bool,
    },
    /// Print a JSON summary of every sliced level
    Inspect,
    /// Feed a JSON event script through a view and print every frame
    Replay { script: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    env_logger::init();

    let config = match &opt.config {
        Some(path) => SliceMapConfig::load(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => SliceMapConfig::default(),
    };

    match opt.command {
        Command::Slice {
            image,
            level,
            skip_transparent,
        } => slice(&config, &image, level, skip_transparent),
        Command::Inspect => inspect(&config),
        Command::Replay { script } => replay(config, &script).await,
    }
}

fn slice(
    config: &SliceMapConfig,
    image_path: &Path,
    level: u8,
    skip_transparent: bool,
) -> anyhow::Result<()> {
    let level = ZoomLevel::from_number(level)?;
    let image = image::open(image_path)
        .with_context(|| format!("opening {}", image_path.display()))?;

    let options = SliceOptions {
        skip_transparent,
        ..Default::default()
    };
    let report = slice_level_with(&config.store, level, &image, config.tile_size, &options)?;
    println!(
        "level {}: {}x{} tiles, {} written, {} skipped",
        report.level, report.grid.columns, report.grid.rows, report.written, report.skipped
    );
    Ok(())
}

#[derive(Serialize)]
struct LevelSummary {
    level: u8,
    map_width: u32,
    map_height: u32,
    columns: u32,
    rows: u32,
    tiles_present: usize,
}

fn inspect(config: &SliceMapConfig) -> anyhow::Result<()> {
    let store = DirectoryTileStore::new(config.store.clone());
    let mut levels = Vec::new();

    for level in ZoomLevel::ALL {
        let (width, height) = match store.map_dimensions(level) {
            Ok(dimensions) => dimensions,
            Err(e) => {
                log::warn!("skipping level {}: {}", level, e);
                continue;
            }
        };
        let grid = TileGrid::for_map(width, height, config.tile_size)?;
        let tiles_present = (0..grid.rows)
            .flat_map(|row| (0..grid.columns).map(move |column| (column, row)))
            .filter(|&(column, row)| {
                store
                    .tile_path(TileId::encode(column, row, level))
                    .is_file()
            })
            .count();

        levels.push(LevelSummary {
            level: level.number(),
            map_width: width,
            map_height: height,
            columns: grid.columns,
            rows: grid.rows,
            tiles_present,
        });
    }

    println!("{}", serde_json::to_string_pretty(&levels)?);
    Ok(())
}

#[derive(Serialize)]
struct FrameSummary {
    event: MapEvent,
    viewport: Option<ViewportState>,
    tiles: usize,
    loading: usize,
    draw_offset: (i32, i32),
    display_scale: f32,
}

#[derive(Serialize)]
struct ReplaySummary {
    frames: Vec<FrameSummary>,
    cache: CacheStats,
}

async fn replay(config: SliceMapConfig, script: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(script)
        .with_context(|| format!("reading script {}", script.display()))?;
    let events = MapEvent::script_from_json(&json)?;
    let mut view = SlicedMapView::open(config)?;

    let mut frames = Vec::with_capacity(events.len());
    for event in events {
        let list = view.handle_event(event)?;
        settle(&mut view).await?;
        frames.push(FrameSummary {
            event,
            viewport: view.viewport(),
            tiles: list.len(),
            loading: loading_count(&view.tiles()),
            draw_offset: view.draw_offset(),
            display_scale: view.display_scale(),
        });
    }

    let summary = ReplaySummary {
        frames,
        cache: view.cache_stats(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Pump redraws until no visible tile is still loading, or give up
async fn settle(view: &mut SlicedMapView) -> anyhow::Result<()> {
    for _ in 0..200 {
        view.poll_redraw()?;
        if loading_count(&view.tiles()) == 0 {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    log::warn!("tiles still loading after 2s, continuing");
    Ok(())
}

fn loading_count(list: &TileList) -> usize {
    list.iter()
        .filter(|tile| tile.state == TileLoadState::Loading)
        .count()
}
