//! Responses and their single-consumption payloads.

use bytes::Bytes;
use intercache_core::CachedEntry;
use serde::{Deserialize, Serialize};

/// Response body with exactly one consumer.
///
/// `Payload` is deliberately not `Clone`. Code that both returns a body to the
/// caller and writes it to the store must call [`Payload::duplicate`] first.
#[derive(Debug)]
pub struct Payload(Bytes);

impl Payload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Split one consumer into two independent ones.
    pub fn duplicate(self) -> (Payload, Payload) {
        let copy = self.0.clone();
        (self, Payload(copy))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the payload.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
        }
    }
}

/// A response handed back to the caller of `intercept`.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub payload: Payload,
    pub source: ResponseSource,
}

impl Response {
    pub fn from_network(status: u16, content_type: Option<String>, payload: Payload) -> Self {
        Self { status, content_type, payload, source: ResponseSource::Network }
    }

    pub fn from_entry(entry: CachedEntry) -> Self {
        Self {
            status: entry.status,
            content_type: entry.content_type,
            payload: Payload(entry.body),
            source: ResponseSource::Cache,
        }
    }

    /// Status in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Duplicate the payload and snapshot one copy as a cache entry.
    ///
    /// The returned response keeps the other copy for the caller.
    pub fn tee(self) -> (Response, CachedEntry) {
        let (kept, stored) = self.payload.duplicate();
        let entry = CachedEntry::new(self.status, self.content_type.clone(), stored.into_bytes());
        (Response { payload: kept, ..self }, entry)
    }
}
