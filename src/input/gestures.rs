use crate::core::zoom::{ZoomController, ZoomLevel};

/// Accumulates one pinch-zoom gesture and settles it on a discrete level.
///
/// While the gesture is active the accumulated factor is only a display
/// scale; the tile set keeps showing the level the gesture started on.
#[derive(Debug, Clone)]
pub struct ZoomGesture {
    controller: ZoomController,
    factor: f32,
    baseline: f32,
    active: bool,
}

impl ZoomGesture {
    pub fn new(controller: ZoomController) -> Self {
        Self {
            controller,
            factor: 1.0,
            baseline: controller.baseline_factor(ZoomLevel::default()),
            active: false,
        }
    }

    /// Start a gesture at `level`
    pub fn begin(&mut self, level: ZoomLevel) {
        self.factor = 1.0;
        self.baseline = self.controller.baseline_factor(level);
        self.active = true;
    }

    /// Apply an incremental scale factor. Ignored outside a gesture and for
    /// non-positive or non-finite factors.
    pub fn update(&mut self, factor: f32) {
        if !self.active || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.factor *= factor;
    }

    /// Finish the gesture and return the level it settles on.
    ///
    /// Returns `None` when no gesture was active.
    pub fn end(&mut self) -> Option<ZoomLevel> {
        if !self.active {
            return None;
        }
        let level = self.controller.factor_to_level(self.factor * self.baseline);
        log::debug!(
            "zoom gesture ended at x{:.3} of baseline {:.2}: level {}",
            self.factor,
            self.baseline,
            level
        );
        self.factor = 1.0;
        self.active = false;
        Some(level)
    }

    /// Scale to draw the current tile list with, 1.0 outside a gesture
    pub fn display_scale(&self) -> f32 {
        self.factor
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn controller(&self) -> &ZoomController {
        &self.controller
    }
}

impl Default for ZoomGesture {
    fn default() -> Self {
        Self::new(ZoomController::default())
    }
}
