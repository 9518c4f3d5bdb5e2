//! Configuration for the dataset endpoint, map access and photo hosting
//!
//! Values come from the process environment. Empty variables count as unset,
//! so a blank `MAP_PROD=` in a `.env` file falls through to `MAP_DEV`.

use crate::core::map::MapViewOptions;
use serde::{Deserialize, Serialize};

/// Production dataset URL, preferred when set.
pub const ENV_MAP_PROD: &str = "MAP_PROD";
/// Development dataset URL.
pub const ENV_MAP_DEV: &str = "MAP_DEV";
/// Access token handed to the map engine.
pub const ENV_ACCESS_TOKEN: &str = "MAPBOX_ACCESS_TOKEN";
/// Base URL that photo IDs are resolved against.
pub const ENV_PHOTOS_URL: &str = "PHOTOS_URL";

/// Missing required configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API URL not configured. Please set MAP_PROD or MAP_DEV")]
    MissingEndpoint,

    #[error("map access token not configured. Please set MAPBOX_ACCESS_TOKEN")]
    MissingAccessToken,
}

/// Where the dataset is fetched from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub production: Option<String>,
    pub development: Option<String>,
}

impl EndpointConfig {
    pub fn new(production: Option<String>, development: Option<String>) -> Self {
        Self {
            production,
            development,
        }
    }

    /// Endpoint pointing at a single URL, e.g. a local test server
    pub fn single(url: impl Into<String>) -> Self {
        Self::new(Some(url.into()), None)
    }

    /// Production wins over development; blank values are ignored.
    pub fn resolve(&self) -> Result<&str, ConfigError> {
        non_blank(self.production.as_deref())
            .or_else(|| non_blank(self.development.as_deref()))
            .ok_or(ConfigError::MissingEndpoint)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub endpoint: EndpointConfig,
    pub access_token: Option<String>,
    pub photos_url: Option<String>,
}

impl MapConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            endpoint: EndpointConfig::new(get(ENV_MAP_PROD), get(ENV_MAP_DEV)),
            access_token: get(ENV_ACCESS_TOKEN),
            photos_url: get(ENV_PHOTOS_URL),
        }
    }

    /// Startup-time check of the values the map cannot run without.
    ///
    /// A missing endpoint is deliberately not reported here: it surfaces as
    /// the failure of the first load instead.
    pub fn validate(&self) -> crate::Result<()> {
        if non_blank(self.access_token.as_deref()).is_none() {
            return Err(ConfigError::MissingAccessToken.into());
        }
        Ok(())
    }

    /// View options derived from this configuration
    pub fn view_options(&self) -> MapViewOptions {
        MapViewOptions {
            photos_url: self.photos_url.clone(),
            ..MapViewOptions::default()
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_production_preferred() {
        let endpoint = EndpointConfig::new(
            Some("https://prod.example/api".to_string()),
            Some("http://localhost:3000".to_string()),
        );
        assert_eq!(endpoint.resolve(), Ok("https://prod.example/api"));
    }

    #[test]
    fn test_development_fallback() {
        let endpoint = EndpointConfig::new(Some(String::new()), Some("http://localhost:3000".to_string()));
        assert_eq!(endpoint.resolve(), Ok("http://localhost:3000"));
    }

    #[test]
    fn test_missing_endpoint() {
        assert_eq!(
            EndpointConfig::default().resolve(),
            Err(ConfigError::MissingEndpoint)
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = MapConfig::from_lookup(lookup(&[
            (ENV_MAP_DEV, "http://localhost:3000"),
            (ENV_ACCESS_TOKEN, "pk.test"),
            (ENV_PHOTOS_URL, ""),
        ]));

        assert_eq!(config.endpoint.resolve(), Ok("http://localhost:3000"));
        assert_eq!(config.access_token.as_deref(), Some("pk.test"));
        assert_eq!(config.photos_url, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_token() {
        let config = MapConfig::from_lookup(lookup(&[(ENV_MAP_PROD, "https://prod.example")]));
        assert!(matches!(
            config.validate(),
            Err(crate::Error::Config(ConfigError::MissingAccessToken))
        ));
    }

    #[test]
    fn test_view_options_carry_photos_url() {
        let config = MapConfig::from_lookup(lookup(&[(ENV_PHOTOS_URL, "https://photos.example")]));
        assert_eq!(
            config.view_options().photos_url.as_deref(),
            Some("https://photos.example")
        );
    }
}
