//! Transport: the layer that actually talks to the network.
//!
//! The engine only depends on the [`Transport`] trait. [`FetchClient`] is the
//! reqwest-backed implementation used by the host.
//!
//! - Non-2xx statuses are responses (`ok == false`), not errors
//! - Timeouts and connection errors are network failures
//! - Max redirects: 5
//! - Max body bytes: configurable, checked against Content-Length and the body

pub mod origin;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use origin::{OriginAllowList, OriginError};
pub use url::{UrlError, canonicalize};

use intercache_core::{AppConfig, Error};

use crate::request::InterceptRequest;
use crate::response::{Payload, Response};

/// Performs network fetches on behalf of the engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `request` from the network.
    ///
    /// Any HTTP status is a successful fetch; only a failure to obtain a
    /// response at all is an error.
    async fn fetch(&self, request: &InterceptRequest) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "intercache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 20MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "intercache/0.1".to_string(),
            max_bytes: 20 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed transport.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::NetworkFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Compared in u64 so a large Content-Length never wraps on 32-bit targets.
    fn exceeds_limit(&self, len: u64) -> bool {
        len > self.config.max_bytes as u64
    }

    fn too_large(&self, len: u64) -> Error {
        Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::NetworkFailure(format!("network error: {}", err))
    }
}

#[async_trait]
impl Transport for FetchClient {
    async fn fetch(&self, request: &InterceptRequest) -> Result<Response, Error> {
        let start = Instant::now();

        let mut builder = self.http.request(request.method().clone(), request.url().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();

        if let Some(len) = response.content_length()
            && self.exceeds_limit(len)
        {
            return Err(self.too_large(len));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(classify)?;

        if self.exceeds_limit(bytes.len() as u64) {
            return Err(self.too_large(bytes.len() as u64));
        }

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            status = status.as_u16(),
            bytes = bytes.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(Response::from_network(status.as_u16(), content_type, Payload::new(bytes)))
    }
}
