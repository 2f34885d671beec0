//! Discrete zoom levels and the mapping between them and continuous pinch factors.

use crate::constants::{DEFAULT_BASELINE_FACTORS, LEVEL_HIGH, LEVEL_LOW, LEVEL_MEDIUM};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// One of the magnifications at which a separately sliced tile set exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ZoomLevel {
    Low,
    Medium,
    High,
}

impl ZoomLevel {
    /// All levels, lowest magnification first
    pub const ALL: [ZoomLevel; 3] = [ZoomLevel::Low, ZoomLevel::Medium, ZoomLevel::High];

    /// The level number used in tile ids and directory names
    pub fn number(self) -> u8 {
        match self {
            ZoomLevel::Low => LEVEL_LOW,
            ZoomLevel::Medium => LEVEL_MEDIUM,
            ZoomLevel::High => LEVEL_HIGH,
        }
    }

    /// Parse an on-disk level number
    pub fn from_number(number: u8) -> Result<Self> {
        match number {
            LEVEL_LOW => Ok(ZoomLevel::Low),
            LEVEL_MEDIUM => Ok(ZoomLevel::Medium),
            LEVEL_HIGH => Ok(ZoomLevel::High),
            other => Err(MapError::InvalidLevel(other)),
        }
    }

    fn index(self) -> usize {
        match self {
            ZoomLevel::Low => 0,
            ZoomLevel::Medium => 1,
            ZoomLevel::High => 2,
        }
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        ZoomLevel::Medium
    }
}

impl TryFrom<u8> for ZoomLevel {
    type Error = MapError;

    fn try_from(number: u8) -> Result<Self> {
        Self::from_number(number)
    }
}

impl From<ZoomLevel> for u8 {
    fn from(level: ZoomLevel) -> u8 {
        level.number()
    }
}

impl std::fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Maps continuous zoom factors to discrete levels and back.
///
/// The continuous range is cut at the midpoints between consecutive baseline
/// factors. A factor equal to a midpoint belongs to the higher level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomController {
    baselines: [f32; 3],
}

impl ZoomController {
    /// Create a controller from the low, medium and high baseline factors.
    ///
    /// Panics unless the baselines are finite and strictly increasing.
    pub fn new(baselines: [f32; 3]) -> Self {
        assert!(
            baselines.iter().all(|b| b.is_finite())
                && baselines[0] < baselines[1]
                && baselines[1] < baselines[2],
            "zoom baselines must be finite and strictly increasing: {:?}",
            baselines
        );
        Self { baselines }
    }

    /// Baseline scale factor of a level
    pub fn baseline_factor(&self, level: ZoomLevel) -> f32 {
        self.baselines[level.index()]
    }

    /// Baseline scale factor of a raw level number
    pub fn level_to_baseline_factor(&self, number: u8) -> Result<f32> {
        ZoomLevel::from_number(number).map(|level| self.baseline_factor(level))
    }

    /// Lower cut point: factors below it select [`ZoomLevel::Low`]
    pub fn lower_midpoint(&self) -> f32 {
        (self.baselines[0] + self.baselines[1]) / 2.0
    }

    /// Upper cut point: factors at or above it select [`ZoomLevel::High`]
    pub fn upper_midpoint(&self) -> f32 {
        (self.baselines[1] + self.baselines[2]) / 2.0
    }

    /// Level whose interval contains `factor`
    pub fn factor_to_level(&self, factor: f32) -> ZoomLevel {
        if factor.is_nan() {
            return ZoomLevel::Medium;
        }

        if factor >= self.upper_midpoint() {
            ZoomLevel::High
        } else if factor >= self.lower_midpoint() {
            ZoomLevel::Medium
        } else {
            ZoomLevel::Low
        }
    }
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_FACTORS)
    }
}
