use crate::core::config::StoreConfig;
use crate::core::geo::TileId;
use crate::core::zoom::ZoomLevel;
use crate::prelude::HashMap;
use crate::{MapError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, PoisonError};

/// Decoded tile pixels, RGBA8 row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TileImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_dynamic(image: image::DynamicImage) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// Size of the pixel buffer in bytes
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Why a single tile could not be produced
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    #[error("tile {0} does not exist")]
    NotFound(PathBuf),

    #[error("tile {path} could not be decoded: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Anything that can describe a level's full map and hand out single tiles.
pub trait TileStore: Send + Sync {
    /// Pixel size of the full map at `level`, without decoding its pixels
    fn map_dimensions(&self, level: ZoomLevel) -> Result<(u32, u32)>;

    /// Where the tile lives, used for logging
    fn tile_path(&self, id: TileId) -> PathBuf;

    /// Decode one tile. May block; only called from background jobs.
    fn load_tile(&self, id: TileId) -> std::result::Result<TileImage, TileError>;
}

/// Tiles pre-sliced into a directory tree:
/// `<root>/<level>.<ext>` for full maps and
/// `<root>/<slices_dir>/<level>/<tileId>.<ext>` for tiles.
#[derive(Debug, Clone)]
pub struct DirectoryTileStore {
    config: StoreConfig,
}

impl DirectoryTileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl TileStore for DirectoryTileStore {
    fn map_dimensions(&self, level: ZoomLevel) -> Result<(u32, u32)> {
        let path = self.config.map_path(level);
        log::debug!("reading map dimensions from {}", path.display());
        image::image_dimensions(&path).map_err(|source| MapError::MapUnavailable {
            level: level.number(),
            source,
        })
    }

    fn tile_path(&self, id: TileId) -> PathBuf {
        self.config.tile_path(id)
    }

    fn load_tile(&self, id: TileId) -> std::result::Result<TileImage, TileError> {
        let path = self.tile_path(id);
        if !path.is_file() {
            return Err(TileError::NotFound(path));
        }

        match image::open(&path) {
            Ok(image) => Ok(TileImage::from_dynamic(image)),
            Err(e) => Err(TileError::Corrupt {
                path,
                source: Box::new(e),
            }),
        }
    }
}

/// Tile set held in memory, e.g. unpacked from an archive by the host
#[derive(Debug, Default)]
pub struct MemoryTileStore {
    maps: RwLock<HashMap<ZoomLevel, (u32, u32)>>,
    tiles: RwLock<HashMap<TileId, Arc<TileImage>>>,
    corrupt: RwLock<HashMap<TileId, String>>,
    loads: AtomicUsize,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_map_dimensions(&self, level: ZoomLevel, width: u32, height: u32) {
        self.maps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(level, (width, height));
    }

    pub fn insert_tile(&self, id: TileId, image: TileImage) {
        self.tiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(image));
    }

    /// Make `id` fail to decode with `reason`
    pub fn insert_corrupt(&self, id: TileId, reason: impl Into<String>) {
        self.corrupt
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, reason.into());
    }

    /// How many times [`TileStore::load_tile`] has been called
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl TileStore for MemoryTileStore {
    fn map_dimensions(&self, level: ZoomLevel) -> Result<(u32, u32)> {
        self.maps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&level)
            .copied()
            .ok_or_else(|| MapError::MapUnavailable {
                level: level.number(),
                source: image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no map registered for level",
                )),
            })
    }

    fn tile_path(&self, id: TileId) -> PathBuf {
        PathBuf::from(format!("memory/{}/{}", id.level(), id))
    }

    fn load_tile(&self, id: TileId) -> std::result::Result<TileImage, TileError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self
            .corrupt
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Err(TileError::Corrupt {
                path: self.tile_path(id),
                source: reason.clone().into(),
            });
        }

        self.tiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|image| TileImage::clone(image))
            .ok_or_else(|| TileError::NotFound(self.tile_path(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> DirectoryTileStore {
        DirectoryTileStore::new(StoreConfig {
            root: dir.path().to_path_buf(),
            map_extension: "png".to_string(),
            tile_extension: "png".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_tile_path_layout() {
        let store = DirectoryTileStore::new(StoreConfig {
            root: PathBuf::from("/maps"),
            ..Default::default()
        });
        let id = TileId::encode(1, 0, ZoomLevel::Low);
        assert_eq!(
            store.tile_path(id),
            PathBuf::from(format!("/maps/slices/22/{}.jpg", id.raw()))
        );
    }

    #[test]
    fn test_missing_and_corrupt_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = TileId::encode(0, 0, ZoomLevel::Medium);

        assert!(matches!(store.load_tile(id), Err(TileError::NotFound(_))));

        let path = store.tile_path(id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(store.load_tile(id), Err(TileError::Corrupt { .. })));
    }

    #[test]
    fn test_decode_tile_and_read_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = TileId::encode(2, 1, ZoomLevel::High);

        let path = store.tile_path(id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([9, 8, 7, 255]))
            .save(&path)
            .unwrap();
        let tile = store.load_tile(id).unwrap();
        assert_eq!((tile.width, tile.height), (4, 4));
        assert_eq!(&tile.pixels[..4], &[9, 8, 7, 255]);

        image::RgbaImage::new(700, 300)
            .save(store.config().map_path(ZoomLevel::High))
            .unwrap();
        assert_eq!(store.map_dimensions(ZoomLevel::High).unwrap(), (700, 300));
        assert!(matches!(
            store.map_dimensions(ZoomLevel::Low),
            Err(MapError::MapUnavailable { level: 22, .. })
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTileStore::new();
        store.set_map_dimensions(ZoomLevel::Low, 768, 512);
        let good = TileId::encode(0, 0, ZoomLevel::Low);
        let bad = TileId::encode(1, 0, ZoomLevel::Low);
        store.insert_tile(good, TileImage::from_rgba(1, 1, vec![1, 2, 3, 4]));
        store.insert_corrupt(bad, "truncated");

        assert_eq!(store.map_dimensions(ZoomLevel::Low).unwrap(), (768, 512));
        assert!(store.map_dimensions(ZoomLevel::High).is_err());
        assert_eq!(store.load_tile(good).unwrap().pixels, vec![1, 2, 3, 4]);
        assert!(matches!(store.load_tile(bad), Err(TileError::Corrupt { .. })));
        assert!(matches!(
            store.load_tile(TileId::encode(2, 0, ZoomLevel::Low)),
            Err(TileError::NotFound(_))
        ));
        assert_eq!(store.load_count(), 3);
    }
}
