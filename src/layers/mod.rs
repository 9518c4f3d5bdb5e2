pub mod marker;
pub mod overlay;

pub use marker::{MarkerSet, MarkerStyle};
pub use overlay::{CircleLayerStyle, LocationOverlay, OverlaySource};
