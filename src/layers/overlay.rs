use crate::{
    core::{constants, geo::LatLng},
    traits::MapHandle,
    Result,
};
use serde::Serialize;

/// GeoJSON source backing an overlay layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySource {
    pub id: String,
    pub data: serde_json::Value,
}

/// Circle layer paint properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleLayerStyle {
    pub id: String,
    pub radius: f64,
    pub color: String,
    pub opacity: Option<f64>,
}

impl CircleLayerStyle {
    /// Paint properties in the engine's style-spec naming
    pub fn paint(&self) -> serde_json::Value {
        let mut paint = serde_json::json!({
            "circle-radius": self.radius,
            "circle-color": self.color,
        });
        if let Some(opacity) = self.opacity {
            paint["circle-opacity"] = opacity.into();
        }
        paint
    }
}

/// Indicator drawn at the last known device location: a red orb inside a
/// translucent white halo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationOverlay {
    position: LatLng,
}

impl LocationOverlay {
    /// Draws the indicator at `position`, replacing any previous one
    pub fn draw<M>(map: &mut M, position: LatLng) -> Result<Self>
    where
        M: MapHandle + ?Sized,
    {
        let source = Self::source(position);
        for style in Self::layers() {
            map.add_overlay_layer(&source, &style)?;
        }
        log::debug!("location indicator drawn at {}", position);
        Ok(Self { position })
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn source(position: LatLng) -> OverlaySource {
        OverlaySource {
            id: constants::LOCATION_SOURCE_ID.to_string(),
            data: serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": position.to_lng_lat(),
                    },
                }],
            }),
        }
    }

    /// Orb and halo layers, drawn in this order
    pub fn layers() -> [CircleLayerStyle; 2] {
        let (orb_id, orb_radius, orb_color) = constants::LOCATION_ORB;
        let (halo_id, halo_radius, halo_color, halo_opacity) = constants::LOCATION_HALO;
        [
            CircleLayerStyle {
                id: orb_id.to_string(),
                radius: orb_radius,
                color: orb_color.to_string(),
                opacity: None,
            },
            CircleLayerStyle {
                id: halo_id.to_string(),
                radius: halo_radius,
                color: halo_color.to_string(),
                opacity: Some(halo_opacity),
            },
        ]
    }
}
