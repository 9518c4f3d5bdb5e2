use crate::{
    core::{constants, geo::LatLng},
    data::geojson::FeatureCollection,
    traits::{MapHandle, MarkerHandle},
    ui::popup::PopupContent,
    Result,
};
use serde::{Deserialize, Serialize};

/// Visual style of a marker pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: String,
    /// Rotation in degrees
    pub rotation: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: constants::MARKER_COLOR.to_string(),
            rotation: constants::MARKER_ROTATION,
        }
    }
}

struct RenderedMarker {
    /// Position of the source feature in its collection
    feature_index: usize,
    handle: Box<dyn MarkerHandle>,
}

/// Markers currently rendered for the latest feature collection
///
/// Features carry no stable id, so the set is rebuilt from scratch on every
/// collection change rather than diffed.
#[derive(Default)]
pub struct MarkerSet {
    markers: Vec<RenderedMarker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every rendered marker with one marker per feature that has
    /// usable coordinates. Returns the number of markers rendered.
    ///
    /// All old markers are removed before the first new one is added.
    /// Features without coordinates are skipped with a warning.
    pub fn reconcile<M>(
        &mut self,
        map: &mut M,
        collection: &FeatureCollection,
        style: &MarkerStyle,
        photos_url: Option<&str>,
    ) -> Result<usize>
    where
        M: MapHandle + ?Sized,
    {
        self.clear();

        let mut skipped = 0;
        for (feature_index, feature) in collection.features.iter().enumerate() {
            let Some(position) = feature.position() else {
                skipped += 1;
                continue;
            };

            let popup = PopupContent::for_feature(feature, photos_url);
            let handle = map.add_marker(position, &popup.to_html(), style)?;
            self.markers.push(RenderedMarker {
                feature_index,
                handle,
            });
        }

        if skipped > 0 {
            log::warn!(
                "skipped {} of {} transgressions without usable coordinates",
                skipped,
                collection.len()
            );
        }
        log::debug!("rendered {} markers", self.markers.len());
        Ok(self.markers.len())
    }

    /// Removes every marker from the map
    pub fn clear(&mut self) {
        for mut marker in self.markers.drain(..) {
            marker.handle.remove();
        }
    }

    /// Forgets the handles without removing them, for when the map that owns
    /// them is being destroyed anyway
    pub fn discard(&mut self) {
        self.markers.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Rendered positions in feature order
    pub fn positions(&self) -> Vec<LatLng> {
        self.markers.iter().map(|m| m.handle.position()).collect()
    }

    /// Collection indices of the rendered features
    pub fn feature_indices(&self) -> Vec<usize> {
        self.markers.iter().map(|m| m.feature_index).collect()
    }
}
