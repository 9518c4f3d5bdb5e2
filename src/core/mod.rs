pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod sync;
pub mod viewport;

// Re-export the essential types
pub use config::{ConfigError, EndpointConfig, MapConfig};
pub use geo::LatLng;
pub use map::{MapViewController, MapViewHandle, MapViewOptions, ViewPhase};
pub use sync::{forward_locations, refresh};
pub use viewport::Viewport;
