use crate::{
    core::{constants, geo::LatLng, viewport::Viewport},
    data::geojson::FeatureCollection,
    input::{events::ViewEvent, location::GeolocationState},
    layers::{marker::MarkerSet, marker::MarkerStyle, overlay::LocationOverlay},
    traits::{ListenerId, MapEngine, MapHandle},
    Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub struct MapViewOptions {
    /// Center used when no location fix is available at creation time
    pub fallback_center: LatLng,
    pub initial_zoom: f64,
    pub marker_style: MarkerStyle,
    /// Base URL photo ids are resolved against; placeholder image when unset
    pub photos_url: Option<String>,
}

impl Default for MapViewOptions {
    fn default() -> Self {
        let (lng, lat) = constants::FALLBACK_CENTER;
        Self {
            fallback_center: LatLng::from_lng_lat(lng, lat),
            initial_zoom: constants::INITIAL_ZOOM,
            marker_style: MarkerStyle::default(),
            photos_url: None,
        }
    }
}

/// Lifecycle phase of a [`MapViewController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Uninitialized,
    Active,
    TornDown,
}

/// A live map together with everything attached to it.
///
/// Dropping the session unregisters the move listener and destroys the map,
/// so a failure anywhere after creation still releases the instance.
struct MapSession<M: MapHandle> {
    map: M,
    move_listener: Option<ListenerId>,
    markers: MarkerSet,
    location_overlay: Option<LocationOverlay>,
}

impl<M: MapHandle> MapSession<M> {
    fn open<E>(
        engine: &E,
        container: &E::Container,
        center: LatLng,
        zoom: f64,
        viewport: &Arc<Mutex<Viewport>>,
    ) -> Result<Self>
    where
        E: MapEngine<Map = M>,
    {
        let mut map = engine.create_map(container, center, zoom)?;

        let sink = Arc::clone(viewport);
        let listener = map.on_move(Box::new(move |center, zoom| {
            let mut viewport = sink.lock().unwrap_or_else(PoisonError::into_inner);
            viewport.set_center(center);
            viewport.set_zoom(zoom);
        }));

        Ok(Self {
            map,
            move_listener: Some(listener),
            markers: MarkerSet::new(),
            location_overlay: None,
        })
    }
}

impl<M: MapHandle> Drop for MapSession<M> {
    fn drop(&mut self) {
        if let Some(listener) = self.move_listener.take() {
            self.map.off_move(listener);
        }
        // markers and overlay go away with the map
        self.markers.discard();
        self.location_overlay = None;
        self.map.remove();
    }
}

enum ViewState<M: MapHandle> {
    Uninitialized,
    Active(MapSession<M>),
    TornDown,
}

struct Envelope {
    generation: u64,
    event: ViewEvent,
}

/// Sender side of a controller's event inbox
///
/// Cloneable and `Send`, so async continuations (a finished load, a location
/// fix) can post to the controller without touching the map. A handle belongs
/// to one mount: after teardown it reports not live and drops what it is
/// given.
#[derive(Clone)]
pub struct MapViewHandle {
    sender: Sender<Envelope>,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl MapViewHandle {
    pub fn is_live(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    /// Queues `event`; returns false if the controller is gone or torn down
    pub fn send(&self, event: ViewEvent) -> bool {
        if !self.is_live() {
            log::debug!("dropping {} for a torn down map view", event.name());
            return false;
        }
        self.sender
            .send(Envelope {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn replace_features(&self, collection: Arc<FeatureCollection>) -> bool {
        self.send(ViewEvent::FeaturesReplaced(collection))
    }

    pub fn update_location(&self, location: GeolocationState) -> bool {
        self.send(ViewEvent::LocationUpdated(location))
    }
}

/// Owns one map instance and keeps it in step with the dataset and the
/// location signal
///
/// Data and location arrive independently and in any order. Whatever arrives
/// before the map exists is remembered and applied when the map is created.
pub struct MapViewController<E: MapEngine> {
    engine: E,
    options: MapViewOptions,
    viewport: Arc<Mutex<Viewport>>,
    state: ViewState<E::Map>,
    features: Option<Arc<FeatureCollection>>,
    location: GeolocationState,
    generation: Arc<AtomicU64>,
    sender: Sender<Envelope>,
    receiver: Receiver<Envelope>,
}

impl<E: MapEngine> MapViewController<E> {
    pub fn new(engine: E, options: MapViewOptions) -> Self {
        let viewport = Viewport::new(options.fallback_center, options.initial_zoom);
        let (sender, receiver) = unbounded();
        Self {
            engine,
            options,
            viewport: Arc::new(Mutex::new(viewport)),
            state: ViewState::Uninitialized,
            features: None,
            location: GeolocationState::default(),
            generation: Arc::new(AtomicU64::new(0)),
            sender,
            receiver,
        }
    }

    /// Handle for posting events to the current mount
    pub fn handle(&self) -> MapViewHandle {
        MapViewHandle {
            sender: self.sender.clone(),
            generation: self.generation.load(Ordering::SeqCst),
            current: Arc::clone(&self.generation),
        }
    }

    /// Creates the map in `container`.
    ///
    /// No-op returning `Ok(false)` while the container is unavailable or a map
    /// already exists. The map starts at the usable location fix if there is
    /// one, otherwise at the current viewport center. Features and location
    /// received earlier are applied straight away. If anything fails the map
    /// is destroyed again and the controller stays unmounted.
    pub fn mount(&mut self, container: Option<&E::Container>) -> Result<bool> {
        if matches!(self.state, ViewState::Active(_)) {
            log::debug!("map already mounted");
            return Ok(false);
        }
        let Some(container) = container else {
            log::debug!("map container not available yet");
            return Ok(false);
        };

        let (center, zoom) = {
            let mut viewport = self.lock_viewport();
            if let Some(coords) = self.location.usable_coords() {
                viewport.set_center(coords);
            }
            (viewport.center, viewport.zoom)
        };

        let mut session = MapSession::open(&self.engine, container, center, zoom, &self.viewport)?;

        if let Some(features) = &self.features {
            session.markers.reconcile(
                &mut session.map,
                features,
                &self.options.marker_style,
                self.options.photos_url.as_deref(),
            )?;
        }
        if let Some(coords) = self.location.usable_coords() {
            session.location_overlay = Some(LocationOverlay::draw(&mut session.map, coords)?);
        }

        log::info!(
            "map mounted at {} z{} with {} markers",
            center,
            zoom,
            session.markers.len()
        );
        self.state = ViewState::Active(session);
        Ok(true)
    }

    /// Replaces the dataset. Returns the number of markers now rendered, zero
    /// while the map is not mounted.
    pub fn replace_features(&mut self, collection: Arc<FeatureCollection>) -> Result<usize> {
        self.features = Some(Arc::clone(&collection));

        match &mut self.state {
            ViewState::Active(session) => session.markers.reconcile(
                &mut session.map,
                &collection,
                &self.options.marker_style,
                self.options.photos_url.as_deref(),
            ),
            _ => {
                log::debug!("map not mounted; {} features held for later", collection.len());
                Ok(0)
            }
        }
    }

    /// Applies a location update. Returns true if the live map was recentred.
    ///
    /// Markers and zoom are left alone. A signal without a usable fix changes
    /// nothing, and in particular keeps the last indicator on the map.
    pub fn update_location(&mut self, location: GeolocationState) -> Result<bool> {
        self.location = location;
        let Some(coords) = location.usable_coords() else {
            return Ok(false);
        };

        self.lock_viewport().set_center(coords);

        match &mut self.state {
            ViewState::Active(session) => {
                session.map.set_center(coords);
                session.location_overlay = Some(LocationOverlay::draw(&mut session.map, coords)?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Dispatches queued events from live handles, in arrival order.
    ///
    /// Stops at the first failing event and returns its error; events behind
    /// it stay queued. Returns the number of events applied.
    pub fn process_events(&mut self) -> Result<usize> {
        let mut applied = 0;
        while let Ok(envelope) = self.receiver.try_recv() {
            if envelope.generation != self.generation.load(Ordering::SeqCst) {
                log::debug!("discarding stale {}", envelope.event.name());
                continue;
            }
            match envelope.event {
                ViewEvent::FeaturesReplaced(collection) => {
                    self.replace_features(collection)?;
                }
                ViewEvent::LocationUpdated(location) => {
                    self.update_location(location)?;
                }
            }
            applied += 1;
        }
        Ok(applied)
    }

    /// Destroys the map and invalidates every handle given out so far.
    ///
    /// Returns true if a map was destroyed. A later [`mount`](Self::mount)
    /// starts a fresh instance.
    pub fn teardown(&mut self) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let destroyed = match std::mem::replace(&mut self.state, ViewState::TornDown) {
            ViewState::Active(session) => {
                drop(session);
                true
            }
            _ => false,
        };
        if destroyed {
            log::info!("map torn down");
        }
        destroyed
    }

    pub fn phase(&self) -> ViewPhase {
        match self.state {
            ViewState::Uninitialized => ViewPhase::Uninitialized,
            ViewState::Active(_) => ViewPhase::Active,
            ViewState::TornDown => ViewPhase::TornDown,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() == ViewPhase::Active
    }

    /// Snapshot of the viewport as last observed
    pub fn viewport(&self) -> Viewport {
        *self.lock_viewport()
    }

    pub fn options(&self) -> &MapViewOptions {
        &self.options
    }

    /// Latest dataset, whether or not it has been rendered yet
    pub fn features(&self) -> Option<&Arc<FeatureCollection>> {
        self.features.as_ref()
    }

    pub fn location(&self) -> GeolocationState {
        self.location
    }

    pub fn marker_count(&self) -> usize {
        match &self.state {
            ViewState::Active(session) => session.markers.len(),
            _ => 0,
        }
    }

    pub fn rendered_positions(&self) -> Vec<LatLng> {
        match &self.state {
            ViewState::Active(session) => session.markers.positions(),
            _ => Vec::new(),
        }
    }

    /// Position of the location indicator, if one is drawn
    pub fn location_overlay(&self) -> Option<LatLng> {
        match &self.state {
            ViewState::Active(session) => session.location_overlay.map(|o| o.position()),
            _ => None,
        }
    }

    pub fn has_location_overlay(&self) -> bool {
        self.location_overlay().is_some()
    }

    fn lock_viewport(&self) -> std::sync::MutexGuard<'_, Viewport> {
        self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: MapEngine> Drop for MapViewController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
