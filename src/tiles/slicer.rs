//! Cutting a full-resolution level image into the on-disk tile layout.

use crate::core::config::StoreConfig;
use crate::core::geo::{TileGrid, TileId};
use crate::core::zoom::ZoomLevel;
use crate::Result;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceOptions {
    /// Leave out tiles whose pixels are all fully transparent, producing a
    /// sparse tile set
    pub skip_transparent: bool,
    /// Also write the full map to `<root>/<level>.<map_extension>`
    pub write_map: bool,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            skip_transparent: false,
            write_map: true,
        }
    }
}

/// What a slicing run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceReport {
    pub level: ZoomLevel,
    pub grid: TileGrid,
    pub written: usize,
    pub skipped: usize,
    pub map_path: Option<PathBuf>,
}

/// Slice `image` into `tile_size` tiles for `level` with default options
pub fn slice_level(
    store: &StoreConfig,
    level: ZoomLevel,
    image: &DynamicImage,
    tile_size: u32,
) -> Result<SliceReport> {
    slice_level_with(store, level, image, tile_size, &SliceOptions::default())
}

/// Slice `image` into `tile_size` tiles for `level`.
///
/// Edge tiles are padded with transparent pixels to the full tile size.
pub fn slice_level_with(
    store: &StoreConfig,
    level: ZoomLevel,
    image: &DynamicImage,
    tile_size: u32,
    options: &SliceOptions,
) -> Result<SliceReport> {
    let (width, height) = (image.width(), image.height());
    let grid = TileGrid::for_map(width, height, tile_size)?;
    std::fs::create_dir_all(store.level_dir(level))?;

    let map_path = if options.write_map {
        let path = store.map_path(level);
        save(image, &path)?;
        Some(path)
    } else {
        None
    };

    let mut written = 0;
    let mut skipped = 0;
    for row in 0..grid.rows {
        for column in 0..grid.columns {
            let x = column * tile_size;
            let y = row * tile_size;
            let piece = image
                .crop_imm(x, y, tile_size.min(width - x), tile_size.min(height - y))
                .to_rgba8();

            if options.skip_transparent && piece.pixels().all(|p| p[3] == 0) {
                skipped += 1;
                continue;
            }

            let mut tile = RgbaImage::new(tile_size, tile_size);
            image::imageops::replace(&mut tile, &piece, 0, 0);

            let id = TileId::encode(column, row, level);
            save(&DynamicImage::ImageRgba8(tile), &store.tile_path(id))?;
            written += 1;
        }
    }

    log::info!(
        "sliced level {} ({}x{} px) into {}x{} tiles: {} written, {} skipped",
        level,
        width,
        height,
        grid.columns,
        grid.rows,
        written,
        skipped
    );

    Ok(SliceReport {
        level,
        grid,
        written,
        skipped,
        map_path,
    })
}

/// Save in the format implied by the extension; JPEG has no alpha channel
fn save(image: &DynamicImage, path: &Path) -> Result<()> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgb8(image.to_rgb8()).save(path)?,
        _ => image.save(path)?,
    }
    Ok(())
}
