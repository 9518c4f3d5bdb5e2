//! Async glue between the data and location sources and a map view
//!
//! Both helpers only post to a [`MapViewHandle`]. The owner of the controller
//! applies what arrived with [`MapViewController::process_events`].
//!
//! [`MapViewController::process_events`]: crate::core::map::MapViewController::process_events

use crate::{
    core::map::MapViewHandle,
    data::{
        geojson::FeatureCollection,
        loader::{DataLoader, LoadError, LoadOptions},
    },
    input::location::GeolocationState,
};
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Loads the dataset and forwards it to `handle`.
///
/// The collection is returned even if the view was torn down while the load
/// was in flight; it just never reaches the map. Failures leave the rendered
/// markers as they are.
pub async fn refresh(
    loader: &DataLoader,
    handle: &MapViewHandle,
    options: LoadOptions,
) -> Result<Arc<FeatureCollection>, LoadError> {
    let collection = loader.load(options).await.map_err(|e| {
        log::error!("failed to load transgressions: {}", e);
        e
    })?;

    if !handle.replace_features(Arc::clone(&collection)) {
        log::debug!("map view gone; {} loaded features not delivered", collection.len());
    }
    Ok(collection)
}

/// Forwards every location update from `updates` to `handle` until the
/// stream ends or the view is torn down. Returns the number delivered.
pub async fn forward_locations<S>(mut updates: S, handle: MapViewHandle) -> usize
where
    S: Stream<Item = GeolocationState> + Unpin,
{
    let mut delivered = 0;
    while let Some(location) = updates.next().await {
        if !handle.update_location(location) {
            log::debug!("map view gone; stopping location forwarding");
            break;
        }
        delivered += 1;
    }
    delivered
}
