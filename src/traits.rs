//! Capability traits for the map rendering engine
//!
//! Tile loading, projection, input handling and the marker/popup primitives
//! belong to the engine. The controller only talks to it through these traits,
//! which keeps reconciliation testable against [`HeadlessEngine`].
//!
//! [`HeadlessEngine`]: crate::rendering::headless::HeadlessEngine

use crate::{
    core::geo::LatLng,
    layers::{
        marker::MarkerStyle,
        overlay::{CircleLayerStyle, OverlaySource},
    },
    Result,
};

/// Callback invoked by the engine whenever the user pans or zooms
pub type MoveListener = Box<dyn Fn(LatLng, f64) + Send + Sync>;

/// Identifies a registered move listener so it can be unregistered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Factory for map instances
pub trait MapEngine {
    /// Native element the map is rendered into
    type Container;
    /// Live map instance
    type Map: MapHandle;

    fn create_map(&self, container: &Self::Container, center: LatLng, zoom: f64) -> Result<Self::Map>;
}

/// A live map instance
pub trait MapHandle {
    /// Recenters the view without changing zoom
    fn set_center(&mut self, center: LatLng);

    fn on_move(&mut self, listener: MoveListener) -> ListenerId;

    fn off_move(&mut self, id: ListenerId);

    fn add_marker(
        &mut self,
        position: LatLng,
        popup_html: &str,
        style: &MarkerStyle,
    ) -> Result<Box<dyn MarkerHandle>>;

    /// Adds (or replaces, when the ids already exist) a GeoJSON source and a
    /// layer drawing it
    fn add_overlay_layer(&mut self, source: &OverlaySource, style: &CircleLayerStyle) -> Result<()>;

    /// Destroys the instance and every marker and layer attached to it
    fn remove(&mut self);
}

/// A marker attached to a map
pub trait MarkerHandle: Send {
    fn position(&self) -> LatLng;

    fn remove(&mut self);
}
