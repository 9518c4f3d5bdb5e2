//! Runtime abstraction layer for async operations
//!
//! The map view itself is synchronous; loads and location streams are driven
//! on whatever executor the host provides. With the `tokio-runtime` feature a
//! Tokio spawner is installed by default, otherwise the host registers one with
//! [`init_runtime`].

use crate::{
    core::{map::MapViewHandle, sync},
    data::loader::{DataLoader, LoadOptions},
    input::location::GeolocationState,
    Error, Result,
};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) -> Box<dyn AsyncHandle>;

    /// Whether tasks can be spawned from the calling thread
    fn is_available(&self) -> bool {
        true
    }
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    fn is_finished(&self) -> bool;

    fn cancel(&self);
}

/// Spawns `future` on the registered runtime
pub fn spawn<F>(future: F) -> Result<Box<dyn AsyncHandle>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let spawner = runtime()
        .filter(|spawner| spawner.is_available())
        .ok_or(Error::NoRuntime)?;
    Ok(spawner.spawn_boxed(Box::pin(future)))
}

/// Loads the dataset in the background and posts it to `handle`
pub fn spawn_refresh(
    loader: Arc<DataLoader>,
    handle: MapViewHandle,
    options: LoadOptions,
) -> Result<Box<dyn AsyncHandle>> {
    spawn(async move {
        // failures are logged by refresh; the view keeps its markers
        let _ = sync::refresh(&loader, &handle, options).await;
    })
}

/// Forwards a location stream to `handle` in the background
pub fn spawn_location_forwarding<S>(updates: S, handle: MapViewHandle) -> Result<Box<dyn AsyncHandle>>
where
    S: Stream<Item = GeolocationState> + Unpin + Send + 'static,
{
    spawn(async move {
        let delivered = sync::forward_locations(updates, handle).await;
        log::debug!("location stream finished after {} updates", delivered);
    })
}

/// Default spawner implementations
pub mod spawners {
    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::super::{AsyncHandle, AsyncSpawner};
        use ::tokio::task::JoinHandle;
        use std::future::Future;
        use std::pin::Pin;

        /// Tokio-based async spawner. Only available from within a Tokio runtime.
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Box<dyn AsyncHandle> {
                Box::new(TokioHandle(::tokio::spawn(future)))
            }

            fn is_available(&self) -> bool {
                ::tokio::runtime::Handle::try_current().is_ok()
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }
}

/// Global runtime instance
static RUNTIME: OnceLock<Box<dyn AsyncSpawner>> = OnceLock::new();

/// Registers the spawner used by [`spawn`]. Only the first call has an effect.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::warn!("async runtime already initialized");
    }
}

/// The registered spawner, falling back to Tokio when that feature is enabled
pub fn runtime() -> Option<&'static dyn AsyncSpawner> {
    #[cfg(feature = "tokio-runtime")]
    {
        Some(
            RUNTIME
                .get_or_init(|| Box::new(spawners::tokio_impl::TokioSpawner))
                .as_ref(),
        )
    }

    #[cfg(not(feature = "tokio-runtime"))]
    {
        RUNTIME.get().map(|spawner| spawner.as_ref())
    }
}
