//! HTTP transport capability
//!
//! The loader only needs "GET this URL with these headers and hand me the
//! status and body". [`HttpFetch`] is that seam; [`ReqwestFetch`] is the
//! production implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Shared async HTTP client. Building the client once avoids the cost of TLS
/// and connection pool setup for every request.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("transgression-map/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

/// Connection-level failure: DNS, refused connection, timeout, broken body
pub type TransportError = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

/// Request description handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of the first header named `name` (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Fully received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// 2xx status
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Capability to perform HTTP requests
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, url: &str, request: &FetchRequest) -> Result<FetchResponse, TransportError>;
}

/// [`HttpFetch`] backed by the shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn fetch(&self, url: &str, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| Arc::new(e) as TransportError)?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| Arc::new(e) as TransportError)?;

        log::debug!("GET {} -> {} ({} bytes)", url, status.as_u16(), body.len());
        Ok(FetchResponse::new(status.as_u16(), status_text, body.to_vec()))
    }
}
