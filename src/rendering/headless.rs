//! In-memory map engine
//!
//! Records every call made through the capability traits instead of drawing
//! anything. Used for running without a display and for asserting on what the
//! controller asked the engine to do.

use crate::{
    core::geo::LatLng,
    layers::{
        marker::MarkerStyle,
        overlay::{CircleLayerStyle, OverlaySource},
    },
    prelude::HashMap,
    traits::{ListenerId, MapEngine, MapHandle, MarkerHandle, MoveListener},
    Error, Result,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A marker as the engine sees it
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub position: LatLng,
    pub popup_html: String,
    pub style: MarkerStyle,
}

struct MapRecord {
    container: String,
    center: LatLng,
    zoom: f64,
    listeners: Vec<(ListenerId, MoveListener)>,
    markers: BTreeMap<u64, MarkerRecord>,
    sources: HashMap<String, serde_json::Value>,
    layers: Vec<CircleLayerStyle>,
}

#[derive(Default)]
struct EngineState {
    next_id: u64,
    maps: BTreeMap<u64, MapRecord>,
    created: usize,
    removed: usize,
    set_center_calls: usize,
    /// Calls made through a handle whose map was already removed
    stale_calls: usize,
}

impl EngineState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn latest(&self) -> Option<&MapRecord> {
        self.maps.values().next_back()
    }
}

/// Engine that keeps every map in memory
#[derive(Clone, Default)]
pub struct HeadlessEngine {
    state: Arc<Mutex<EngineState>>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maps that have been created and not yet removed
    pub fn live_maps(&self) -> usize {
        self.lock().maps.len()
    }

    pub fn maps_created(&self) -> usize {
        self.lock().created
    }

    pub fn maps_removed(&self) -> usize {
        self.lock().removed
    }

    pub fn set_center_calls(&self) -> usize {
        self.lock().set_center_calls
    }

    pub fn stale_calls(&self) -> usize {
        self.lock().stale_calls
    }

    /// Container of the most recently created live map
    pub fn container(&self) -> Option<String> {
        self.lock().latest().map(|m| m.container.clone())
    }

    /// Center of the most recently created live map
    pub fn center(&self) -> Option<LatLng> {
        self.lock().latest().map(|m| m.center)
    }

    pub fn zoom(&self) -> Option<f64> {
        self.lock().latest().map(|m| m.zoom)
    }

    pub fn listener_count(&self) -> usize {
        self.lock().latest().map_or(0, |m| m.listeners.len())
    }

    /// Markers on the most recently created live map, in insertion order
    pub fn markers(&self) -> Vec<MarkerRecord> {
        self.lock()
            .latest()
            .map(|m| m.markers.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn marker_positions(&self) -> Vec<LatLng> {
        self.markers().into_iter().map(|m| m.position).collect()
    }

    /// Overlay layer ids on the most recently created live map
    pub fn overlay_layers(&self) -> Vec<String> {
        self.lock()
            .latest()
            .map(|m| m.layers.iter().map(|l| l.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn overlay_source(&self, id: &str) -> Option<serde_json::Value> {
        self.lock().latest().and_then(|m| m.sources.get(id).cloned())
    }

    /// Simulates the user panning or zooming the most recently created map
    pub fn pan_to(&self, center: LatLng, zoom: f64) {
        let mut state = self.lock();
        if let Some(map) = state.maps.values_mut().next_back() {
            map.center = center;
            map.zoom = zoom;
            for (_, listener) in &map.listeners {
                listener(center, zoom);
            }
        }
    }
}

impl MapEngine for HeadlessEngine {
    type Container = String;
    type Map = HeadlessMap;

    fn create_map(&self, container: &String, center: LatLng, zoom: f64) -> Result<HeadlessMap> {
        if container.is_empty() {
            return Err(Error::Engine("container id must not be empty".to_string()));
        }

        let mut state = self.lock();
        let id = state.next_id();
        state.maps.insert(
            id,
            MapRecord {
                container: container.clone(),
                center,
                zoom,
                listeners: Vec::new(),
                markers: BTreeMap::new(),
                sources: HashMap::default(),
                layers: Vec::new(),
            },
        );
        state.created += 1;
        log::debug!("headless map {} created in '{}' at {} z{}", id, container, center, zoom);

        Ok(HeadlessMap {
            id,
            state: Arc::clone(&self.state),
        })
    }
}

/// Handle to a map created by [`HeadlessEngine`]
pub struct HeadlessMap {
    id: u64,
    state: Arc<Mutex<EngineState>>,
}

impl HeadlessMap {
    /// Runs `f` against this map's record, counting a stale call if the map
    /// has already been removed
    fn with_record<R>(&self, f: impl FnOnce(&mut MapRecord) -> R) -> Option<R> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.maps.get_mut(&self.id) {
            Some(record) => Some(f(record)),
            None => {
                state.stale_calls += 1;
                log::warn!("call on removed headless map {}", self.id);
                None
            }
        }
    }

    fn removed_error(&self) -> Error {
        Error::Engine(format!("map {} has been removed", self.id))
    }
}

impl MapHandle for HeadlessMap {
    fn set_center(&mut self, center: LatLng) {
        if self.with_record(|map| map.center = center).is_some() {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.set_center_calls += 1;
        }
    }

    fn on_move(&mut self, listener: MoveListener) -> ListenerId {
        let id = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            ListenerId(state.next_id())
        };
        self.with_record(|map| map.listeners.push((id, listener)));
        id
    }

    fn off_move(&mut self, id: ListenerId) {
        self.with_record(|map| map.listeners.retain(|(listener_id, _)| *listener_id != id));
    }

    fn add_marker(
        &mut self,
        position: LatLng,
        popup_html: &str,
        style: &MarkerStyle,
    ) -> Result<Box<dyn MarkerHandle>> {
        let marker_id = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.next_id()
        };
        let record = MarkerRecord {
            position,
            popup_html: popup_html.to_string(),
            style: style.clone(),
        };
        self.with_record(|map| map.markers.insert(marker_id, record))
            .ok_or_else(|| self.removed_error())?;

        Ok(Box::new(HeadlessMarker {
            map_id: self.id,
            marker_id,
            position,
            state: Arc::clone(&self.state),
        }))
    }

    fn add_overlay_layer(&mut self, source: &OverlaySource, style: &CircleLayerStyle) -> Result<()> {
        self.with_record(|map| {
            map.sources.insert(source.id.clone(), source.data.clone());
            match map.layers.iter_mut().find(|layer| layer.id == style.id) {
                Some(existing) => *existing = style.clone(),
                None => map.layers.push(style.clone()),
            }
        })
        .ok_or_else(|| self.removed_error())
    }

    fn remove(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.maps.remove(&self.id).is_some() {
            state.removed += 1;
            log::debug!("headless map {} removed", self.id);
        } else {
            state.stale_calls += 1;
        }
    }
}

struct HeadlessMarker {
    map_id: u64,
    marker_id: u64,
    position: LatLng,
    state: Arc<Mutex<EngineState>>,
}

impl MarkerHandle for HeadlessMarker {
    fn position(&self) -> LatLng {
        self.position
    }

    fn remove(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.maps.get_mut(&self.map_id) {
            Some(map) => {
                map.markers.remove(&self.marker_id);
            }
            None => state.stale_calls += 1,
        }
    }
}
