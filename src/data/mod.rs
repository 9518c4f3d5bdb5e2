pub mod fetch;
pub mod geojson;
pub mod loader;

pub use fetch::{FetchRequest, FetchResponse, HttpFetch, ReqwestFetch, TransportError};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use loader::{DataLoader, LoadError, LoadOptions, LoadResult, SharedLoad};
