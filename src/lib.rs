//! # transgression-map
//!
//! Keeps an interactive map in step with a remotely loaded set of
//! transgression reports and the device location.
//!
//! The pieces are deliberately independent: [`DataLoader`] fetches the
//! dataset with single-flight caching, [`MapViewController`] owns the map
//! instance and reconciles markers, the location indicator and the viewport,
//! and the helpers in [`core::sync`] connect the two through a
//! [`MapViewHandle`]. Rendering goes through the capability traits in
//! [`traits`], with [`HeadlessEngine`] as the in-memory implementation.

pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{ConfigError, EndpointConfig, MapConfig},
    geo::LatLng,
    map::{MapViewController, MapViewHandle, MapViewOptions, ViewPhase},
    sync::{forward_locations, refresh},
    viewport::Viewport,
};

pub use data::{
    geojson::{Feature, FeatureCollection},
    loader::{DataLoader, LoadError, LoadOptions},
};

pub use input::{events::ViewEvent, location::GeolocationState};

pub use layers::{marker::MarkerStyle, overlay::LocationOverlay};

pub use rendering::headless::HeadlessEngine;

pub use traits::{MapEngine, MapHandle, MarkerHandle};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No async runtime available; enable 'tokio-runtime' or call init_runtime")]
    NoRuntime,
}
