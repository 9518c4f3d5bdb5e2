use crate::core::{constants, geo::LatLng};
use serde::{Deserialize, Serialize};

/// The current view of the map: center and zoom
///
/// Mirrors the live map instance. It is written both by the map's move
/// listener (user pan/zoom) and by the location signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 22.0),
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }

    /// Sets the center of the viewport
    pub fn set_center(&mut self, center: LatLng) {
        self.center = center;
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }
}

impl Default for Viewport {
    fn default() -> Self {
        let (lng, lat) = constants::FALLBACK_CENTER;
        Self::new(LatLng::from_lng_lat(lng, lat), constants::INITIAL_ZOOM)
    }
}
