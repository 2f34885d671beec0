//! Configuration for the tile store layout, the cache and the zoom levels
//!
//! Every field has a default, so a JSON file only needs to name what it
//! changes:
//!
//! ```json
//! { "store": { "root": "/data/mall-b1" }, "cache_capacity": 120 }
//! ```

use crate::constants::{DEFAULT_BASELINE_FACTORS, DEFAULT_CACHE_CAPACITY, TILE_SIZE};
use crate::core::geo::TileId;
use crate::core::zoom::{ZoomController, ZoomLevel};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceMapConfig {
    pub tile_size: u32,
    pub cache_capacity: usize,
    pub store: StoreConfig,
    pub zoom: ZoomConfig,
}

impl Default for SliceMapConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            store: StoreConfig::default(),
            zoom: ZoomConfig::default(),
        }
    }
}

/// Presets in the manner of the loader configurations
impl SliceMapConfig {
    /// Small cache for memory-constrained hosts
    pub fn low_memory() -> Self {
        Self {
            cache_capacity: 32,
            ..Default::default()
        }
    }

    /// Tiny tiles and cache, rooted at `root`, for fixtures
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        Self {
            tile_size: 16,
            cache_capacity: 8,
            store: StoreConfig {
                root: root.into(),
                map_extension: "png".to_string(),
                tile_extension: "png".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(MapError::InvalidConfig("tile_size must be positive".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(MapError::InvalidConfig(
                "cache_capacity must be positive".to_string(),
            ));
        }
        self.zoom.validate()
    }
}

/// Where and how tiles live on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
    /// Extension of the full-resolution map of each level
    pub map_extension: String,
    pub tile_extension: String,
    /// Directory under `root` holding one sub-directory of tiles per level
    pub slices_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("slice-demo"),
            map_extension: "jpg".to_string(),
            tile_extension: "jpg".to_string(),
            slices_dir: "slices".to_string(),
        }
    }
}

impl StoreConfig {
    /// `<root>/<level>.<map_extension>`
    pub fn map_path(&self, level: ZoomLevel) -> PathBuf {
        self.root
            .join(format!("{}.{}", level.number(), self.map_extension))
    }

    /// `<root>/<slices_dir>/<level>`
    pub fn level_dir(&self, level: ZoomLevel) -> PathBuf {
        self.root.join(&self.slices_dir).join(level.number().to_string())
    }

    /// `<root>/<slices_dir>/<level>/<tileId>.<tile_extension>`
    pub fn tile_path(&self, id: TileId) -> PathBuf {
        self.level_dir(id.level())
            .join(format!("{}.{}", id, self.tile_extension))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Baseline scale factors of the low, medium and high levels
    pub baselines: [f32; 3],
    pub initial_level: ZoomLevel,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            baselines: DEFAULT_BASELINE_FACTORS,
            initial_level: ZoomLevel::Medium,
        }
    }
}

impl ZoomConfig {
    pub fn validate(&self) -> Result<()> {
        let b = self.baselines;
        if b.iter().all(|f| f.is_finite() && *f > 0.0) && b[0] < b[1] && b[1] < b[2] {
            Ok(())
        } else {
            Err(MapError::InvalidConfig(format!(
                "zoom baselines must be positive and strictly increasing, got {:?}",
                b
            )))
        }
    }

    pub fn controller(&self) -> ZoomController {
        ZoomController::new(self.baselines)
    }
}
