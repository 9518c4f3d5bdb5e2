use crate::data::geojson::FeatureCollection;
use crate::input::location::GeolocationState;
use std::sync::Arc;

/// Events delivered to the map view from asynchronous producers
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A new dataset replaced the previous one
    FeaturesReplaced(Arc<FeatureCollection>),
    /// The location signal produced a new value
    LocationUpdated(GeolocationState),
}

impl ViewEvent {
    /// Short name used in log output
    pub fn name(&self) -> &'static str {
        match self {
            ViewEvent::FeaturesReplaced(_) => "featuresreplaced",
            ViewEvent::LocationUpdated(_) => "locationupdated",
        }
    }
}
