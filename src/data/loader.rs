//! Single-flight loader for the transgression dataset
//!
//! The loader holds at most one fetch at a time. Every caller that arrives
//! while an entry exists, pending or settled, is handed a clone of the same
//! [`Shared`] future, so one network request serves all of them and they all
//! observe the same value or the same error. `force` and [`DataLoader::clear_cache`]
//! are the only ways to start over.

use crate::core::config::{ConfigError, EndpointConfig};
use crate::core::constants::GEOJSON_MEDIA_TYPE;
use crate::data::fetch::{FetchRequest, HttpFetch, ReqwestFetch, TransportError};
use crate::data::geojson::FeatureCollection;
use crate::runtime;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of one fetch cycle
pub type LoadResult = Result<Arc<FeatureCollection>, LoadError>;

/// Future handed to every caller sharing a cache entry
pub type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Why a load failed. Cloneable so that every sharer receives the same error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("HTTP {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },

    #[error("invalid feature collection: {0}")]
    Decode(Arc<serde_json::Error>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Bypass the cached entry and start a new request
    pub force: bool,
}

impl LoadOptions {
    pub fn force() -> Self {
        Self { force: true }
    }
}

pub struct DataLoader {
    fetcher: Arc<dyn HttpFetch>,
    endpoint: EndpointConfig,
    entry: Mutex<Option<SharedLoad>>,
}

impl DataLoader {
    pub fn new(fetcher: Arc<dyn HttpFetch>, endpoint: EndpointConfig) -> Self {
        Self {
            fetcher,
            endpoint,
            entry: Mutex::new(None),
        }
    }

    /// Loader backed by the shared reqwest client
    pub fn with_reqwest(endpoint: EndpointConfig) -> Self {
        Self::new(Arc::new(ReqwestFetch::new()), endpoint)
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Returns the cached fetch, or starts a new one when the cache is empty
    /// or `options.force` is set.
    ///
    /// The new entry is stored before the request resolves, so callers that
    /// arrive while it is pending join it. The request is started on the
    /// registered runtime right away and keeps running even if every holder
    /// drops its future. Without a runtime it starts on first poll instead.
    pub fn load(&self, options: LoadOptions) -> SharedLoad {
        let mut entry = self.lock_entry();

        if !options.force {
            if let Some(existing) = entry.as_ref() {
                log::debug!("joining cached dataset load");
                return existing.clone();
            }
        }

        log::debug!("starting dataset load (force: {})", options.force);
        let shared = Self::fetch_collection(Arc::clone(&self.fetcher), self.endpoint.clone())
            .boxed()
            .shared();
        *entry = Some(shared.clone());
        drop(entry);

        let driver = shared.clone();
        if runtime::spawn(async move {
            let _ = driver.await;
        })
        .is_err()
        {
            log::debug!("no async runtime; dataset load starts on first poll");
        }
        shared
    }

    /// Drops the cached entry, pending or settled.
    ///
    /// A request that is already underway keeps running; its result is just
    /// never cached.
    pub fn clear_cache(&self) {
        if self.lock_entry().take().is_some() {
            log::debug!("dataset cache cleared");
        }
    }

    /// Whether a pending or settled entry is cached
    pub fn has_entry(&self) -> bool {
        self.lock_entry().is_some()
    }

    fn lock_entry(&self) -> MutexGuard<'_, Option<SharedLoad>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_collection(fetcher: Arc<dyn HttpFetch>, endpoint: EndpointConfig) -> LoadResult {
        let url = endpoint.resolve()?;
        let request = FetchRequest::get()
            .header("Content-Type", GEOJSON_MEDIA_TYPE)
            .header("Accept", GEOJSON_MEDIA_TYPE);

        let response = fetcher
            .fetch(url, &request)
            .await
            .map_err(LoadError::Transport)?;

        if !response.ok() {
            log::warn!("dataset request failed: HTTP {} {}", response.status, response.status_text);
            return Err(LoadError::HttpStatus {
                status: response.status,
                status_text: response.status_text,
            });
        }

        let collection: FeatureCollection = response
            .json()
            .map_err(|e| LoadError::Decode(Arc::new(e)))?;
        log::info!("loaded {} transgressions from {}", collection.len(), url);
        Ok(Arc::new(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fetch::FetchResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Answers every request with a one-feature collection describing the call
    /// number. When gated, each call waits for a permit before answering.
    struct CountingFetch {
        calls: AtomicUsize,
        status: u16,
        gate: Option<Arc<Semaphore>>,
        requests: Mutex<Vec<(String, FetchRequest)>>,
    }

    impl CountingFetch {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                status: 200,
                gate: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new()
            }
        }

        fn with_status(status: u16) -> Self {
            Self {
                status,
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpFetch for CountingFetch {
        async fn fetch(&self, url: &str, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), request.clone()));

            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }

            if self.status != 200 {
                return Ok(FetchResponse::new(self.status, "Service Unavailable", ""));
            }
            let body = serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [10.0, 20.0]},
                    "properties": {"description": format!("call {}", call)}
                }]
            });
            Ok(FetchResponse::new(200, "OK", body.to_string()))
        }
    }

    struct FailingFetch;

    #[async_trait]
    impl HttpFetch for FailingFetch {
        async fn fetch(&self, _url: &str, _request: &FetchRequest) -> Result<FetchResponse, TransportError> {
            let error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
            Err(Arc::new(error) as TransportError)
        }
    }

    fn endpoint() -> EndpointConfig {
        EndpointConfig::new(
            Some("https://prod.example/transgressions".to_string()),
            Some("http://localhost:3000".to_string()),
        )
    }

    fn first_description(collection: &FeatureCollection) -> String {
        collection.features[0].description().to_string()
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_request() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), endpoint());

        let loads: Vec<_> = (0..5).map(|_| loader.load(LoadOptions::default())).collect();
        let results = futures::future::join_all(loads).await;

        assert_eq!(fetch.calls(), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_settled_entry_is_reused() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), endpoint());

        let first = loader.load(LoadOptions::default()).await.unwrap();
        let second = loader.load(LoadOptions::default()).await.unwrap();

        assert_eq!(fetch.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_force_starts_new_request() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), endpoint());

        let first = loader.load(LoadOptions::default()).await.unwrap();
        let forced = loader.load(LoadOptions::force()).await.unwrap();
        let cached = loader.load(LoadOptions::default()).await.unwrap();

        assert_eq!(fetch.calls(), 2);
        assert_eq!(first_description(&first), "call 1");
        assert_eq!(first_description(&forced), "call 2");
        assert!(Arc::ptr_eq(&forced, &cached));
    }

    #[tokio::test]
    async fn test_clear_while_pending_does_not_leak_old_result() {
        let gate = Arc::new(Semaphore::new(0));
        let fetch = Arc::new(CountingFetch::gated(gate.clone()));
        let loader = DataLoader::new(fetch.clone(), endpoint());

        let stale = tokio::spawn(loader.load(LoadOptions::default()));
        while fetch.calls() < 1 {
            tokio::task::yield_now().await;
        }

        loader.clear_cache();
        assert!(!loader.has_entry());

        let fresh = tokio::spawn(loader.load(LoadOptions::default()));
        while fetch.calls() < 2 {
            tokio::task::yield_now().await;
        }
        gate.add_permits(2);

        let stale = stale.await.unwrap().unwrap();
        let fresh = fresh.await.unwrap().unwrap();
        assert_eq!(fetch.calls(), 2);
        assert_eq!(first_description(&stale), "call 1");
        assert_eq!(first_description(&fresh), "call 2");
    }

    #[tokio::test]
    async fn test_forced_load_starts_without_being_awaited() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), endpoint());
        loader.load(LoadOptions::default()).await.unwrap();
        assert_eq!(fetch.calls(), 1);

        let _ = loader.load(LoadOptions::force());
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(fetch.calls(), 2);

        let latest = loader.load(LoadOptions::force()).await.unwrap();
        assert_eq!(fetch.calls(), 3);
        assert_eq!(first_description(&latest), "call 3");
    }

    #[tokio::test]
    async fn test_dropped_load_still_completes() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), endpoint());

        drop(loader.load(LoadOptions::default()));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(fetch.calls(), 1);
        let cached = loader.load(LoadOptions::default()).now_or_never();
        assert!(matches!(cached, Some(Ok(_))));
        assert_eq!(fetch.calls(), 1);
    }

    #[test]
    fn test_load_without_runtime_starts_on_poll() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), endpoint());

        let pending = loader.load(LoadOptions::default());
        assert_eq!(fetch.calls(), 0);

        let collection = futures::executor::block_on(pending).unwrap();
        assert_eq!(fetch.calls(), 1);
        assert_eq!(first_description(&collection), "call 1");
    }

    #[tokio::test]
    async fn test_request_headers_and_endpoint() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), endpoint());
        loader.load(LoadOptions::default()).await.unwrap();

        let requests = fetch.requests.lock().unwrap();
        let (url, request) = &requests[0];
        assert_eq!(url, "https://prod.example/transgressions");
        assert_eq!(request.header_value("content-type"), Some("application/geo+json"));
        assert_eq!(request.header_value("accept"), Some("application/geo+json"));
    }

    #[tokio::test]
    async fn test_missing_endpoint_fails_without_request() {
        let fetch = Arc::new(CountingFetch::new());
        let loader = DataLoader::new(fetch.clone(), EndpointConfig::default());

        let result = loader.load(LoadOptions::default()).await;

        assert!(matches!(
            result,
            Err(LoadError::Configuration(ConfigError::MissingEndpoint))
        ));
        assert_eq!(fetch.calls(), 0);
    }

    #[tokio::test]
    async fn test_http_status_error_is_shared_and_not_retried() {
        let fetch = Arc::new(CountingFetch::with_status(503));
        let loader = DataLoader::new(fetch.clone(), endpoint());

        let (a, b) = futures::join!(
            loader.load(LoadOptions::default()),
            loader.load(LoadOptions::default())
        );
        for result in [a, b] {
            match result {
                Err(LoadError::HttpStatus { status, status_text }) => {
                    assert_eq!(status, 503);
                    assert_eq!(status_text, "Service Unavailable");
                }
                other => panic!("expected HTTP status error, got {:?}", other),
            }
        }

        let again = loader.load(LoadOptions::default()).await;
        assert!(matches!(again, Err(LoadError::HttpStatus { status: 503, .. })));
        assert_eq!(fetch.calls(), 1);

        let _ = loader.load(LoadOptions::force()).await;
        assert_eq!(fetch.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_surfaces() {
        let loader = DataLoader::new(Arc::new(FailingFetch), endpoint());
        let error = loader.load(LoadOptions::default()).await.unwrap_err();

        assert!(matches!(error, LoadError::Transport(_)));
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn test_http_status_display() {
        let error = LoadError::HttpStatus {
            status: 404,
            status_text: "Not Found".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 404: Not Found");
    }
}
