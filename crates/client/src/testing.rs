//! Test doubles for the transport and store seams.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use intercache_core::{CacheDb, CacheStorage, CachedEntry, Error, RequestKey};

use crate::fetch::Transport;
use crate::request::InterceptRequest;
use crate::response::{Payload, Response};

/// Transport that answers from a fixed route table.
///
/// Unknown URLs get a 404. Every call counts, including ones made while
/// offline.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, (u16, Bytes)>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &'static [u8]) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, Bytes::from_static(body)));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &InterceptRequest) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NetworkFailure(format!("offline: {}", request.url())));
        }
        let route = self.routes.lock().unwrap().get(request.url().as_str()).cloned();
        let (status, body) = route.unwrap_or((404, Bytes::from_static(b"not found")));
        Ok(Response::from_network(status, Some("application/octet-stream".into()), Payload::new(body)))
    }
}

/// Wraps a real store and counts entry reads and writes.
pub(crate) struct CountingStore {
    pub(crate) inner: CacheDb,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingStore {
    pub(crate) async fn new() -> Self {
        Self { inner: CacheDb::open_in_memory().await.unwrap(), reads: AtomicUsize::new(0), writes: AtomicUsize::new(0) }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStorage for CountingStore {
    async fn open_generation(&self, generation: &str) -> Result<(), Error> {
        self.inner.ensure_generation(generation).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.inner.list_generations().await
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        self.inner.delete_generation(generation).await
    }

    async fn get(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_entry(generation, key).await
    }

    async fn put(&self, generation: &str, key: &RequestKey, entry: &CachedEntry) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put_entry(generation, key, entry).await
    }
}

/// Real store whose writes take `delay` to land.
pub(crate) struct SlowStore {
    pub(crate) inner: CacheDb,
    delay: Duration,
}

impl SlowStore {
    pub(crate) async fn new(delay: Duration) -> Self {
        Self { inner: CacheDb::open_in_memory().await.unwrap(), delay }
    }
}

#[async_trait]
impl CacheStorage for SlowStore {
    async fn open_generation(&self, generation: &str) -> Result<(), Error> {
        self.inner.ensure_generation(generation).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.inner.list_generations().await
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        self.inner.delete_generation(generation).await
    }

    async fn get(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        self.inner.get_entry(generation, key).await
    }

    async fn put(&self, generation: &str, key: &RequestKey, entry: &CachedEntry) -> Result<(), Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.put_entry(generation, key, entry).await
    }
}

/// Store whose entry operations always fail, as if the quota were exhausted.
pub(crate) struct BrokenStore;

#[async_trait]
impl CacheStorage for BrokenStore {
    async fn open_generation(&self, _generation: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        Err(Error::StoreFailure("store unavailable".into()))
    }

    async fn delete_generation(&self, _generation: &str) -> Result<bool, Error> {
        Err(Error::StoreFailure("store unavailable".into()))
    }

    async fn get(&self, _generation: &str, _key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        Err(Error::StoreFailure("store unavailable".into()))
    }

    async fn put(&self, _generation: &str, _key: &RequestKey, _entry: &CachedEntry) -> Result<(), Error> {
        Err(Error::StoreFailure("quota exceeded".into()))
    }
}
