//! Intercepted requests.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use intercache_core::{Error, RequestKey};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::{UrlError, canonicalize};

/// What the requester intends to do with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Empty,
    Document,
    Script,
    Worker,
    Style,
    Image,
    Font,
    Other,
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" => Destination::Empty,
            "document" => Destination::Document,
            "script" => Destination::Script,
            "worker" => Destination::Worker,
            "style" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            _ => Destination::Other,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Destination::Empty => "",
            Destination::Document => "document",
            Destination::Script => "script",
            Destination::Worker => "worker",
            Destination::Style => "style",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Other => "other",
        };
        f.write_str(name)
    }
}

/// An outgoing request observed before it reaches the network.
#[derive(Debug, Clone)]
pub struct InterceptRequest {
    method: Method,
    url: Url,
    navigate: bool,
    destination: Destination,
    body: Option<Bytes>,
}

impl InterceptRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, navigate: false, destination: Destination::Empty, body: None }
    }

    /// Build a request from raw method and URL strings.
    ///
    /// URLs with a scheme the engine cannot route (`data:`, `blob:`, ...) are
    /// rejected as unroutable rather than invalid.
    pub fn parse(method: &str, url: &str) -> Result<Self, Error> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {method:?}: {e}")))?;
        let url = canonicalize(url).map_err(|e| match e {
            UrlError::UnsupportedScheme(_) => Error::UnroutableRequest(e.to_string()),
            _ => Error::InvalidUrl(e.to_string()),
        })?;
        Ok(Self::new(method, url))
    }

    /// Shorthand for a GET request.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::parse("GET", url)
    }

    /// Mark the request as a page navigation.
    pub fn navigation(mut self) -> Self {
        self.navigate = true;
        self.destination = Destination::Document;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Attach a body. Only forwarded on pass-through; never cached.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_navigation(&self) -> bool {
        self.navigate
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Serialized origin of the request URL, e.g. `https://localhost:8443`.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// The cache slot this request maps to.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), &self.url)
    }
}
