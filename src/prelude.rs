//! Prelude module for common transgression-map types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use transgression_map::prelude::*;`

pub use crate::core::{
    config::{ConfigError, EndpointConfig, MapConfig},
    geo::LatLng,
    map::{MapViewController, MapViewHandle, MapViewOptions, ViewPhase},
    sync::{forward_locations, refresh},
    viewport::Viewport,
};

pub use crate::data::{
    fetch::{FetchRequest, FetchResponse, HttpFetch, ReqwestFetch},
    geojson::{Feature, FeatureCollection},
    loader::{DataLoader, LoadError, LoadOptions},
};

pub use crate::input::{events::ViewEvent, location::GeolocationState};

pub use crate::layers::{marker::MarkerStyle, overlay::LocationOverlay};

pub use crate::rendering::headless::HeadlessEngine;

pub use crate::runtime::{
    init_runtime, spawn, spawn_location_forwarding, spawn_refresh, AsyncHandle, AsyncSpawner,
};

pub use crate::traits::{MapEngine, MapHandle, MarkerHandle};

pub use std::sync::Arc;

pub use fxhash::FxHashMap as HashMap;

pub use crate::{Error as MapError, Result};
