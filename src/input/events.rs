use serde::{Deserialize, Serialize};

/// Input the host's UI layer feeds into a [`crate::SlicedMapView`].
///
/// Gesture recognition stays with the host; these are its already-interpreted
/// results. Serialized with a `type` tag so event scripts can be replayed:
///
/// ```json
/// [{ "type": "resize", "width": 400, "height": 300 },
///  { "type": "pan", "dx": 120, "dy": -40 }]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    /// Scroll the viewport by a pixel delta
    Pan { dx: i32, dy: i32 },
    /// Two-finger scale gesture started
    ZoomBegin,
    /// Incremental scale factor since the previous update
    ZoomUpdate { factor: f32 },
    /// Scale gesture released
    ZoomEnd,
    /// The drawing surface was measured or resized
    Resize { width: u32, height: u32 },
}

impl MapEvent {
    /// Checks if this event belongs to a zoom gesture
    pub fn is_zoom_event(&self) -> bool {
        matches!(
            self,
            MapEvent::ZoomBegin | MapEvent::ZoomUpdate { .. } | MapEvent::ZoomEnd
        )
    }

    /// Parse a JSON array of events
    pub fn script_from_json(json: &str) -> crate::Result<Vec<MapEvent>> {
        Ok(serde_json::from_str(json)?)
    }
}
