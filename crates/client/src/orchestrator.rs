//! Per-request coordination between policy, store, transport and verifier.
//!
//! Store writes are spawned and never awaited on the response path. Dropping
//! an `intercept` future does not cancel a write it already spawned. Writes
//! are full-entry replaces, so concurrent intercepts for the same key simply
//! race and the last successful write wins.

use std::sync::{Arc, Mutex, PoisonError};

use intercache_core::{CachedEntry, Error, RequestKey, StoreHandle};
use tokio::task::JoinHandle;

use crate::fetch::Transport;
use crate::integrity::{ExpectedDigest, IntegrityVerifier};
use crate::policy::{PolicyResolver, RoutingPolicy};
use crate::request::InterceptRequest;
use crate::response::Response;

/// Decides the fate of each intercepted request.
pub struct CacheOrchestrator {
    resolver: PolicyResolver,
    store: StoreHandle,
    transport: Arc<dyn Transport>,
    verifier: IntegrityVerifier,
    verify_refetched: bool,
    writes: Mutex<Vec<JoinHandle<()>>>,
}

impl CacheOrchestrator {
    pub fn new(resolver: PolicyResolver, store: StoreHandle, transport: Arc<dyn Transport>) -> Self {
        Self {
            resolver,
            store,
            transport,
            verifier: IntegrityVerifier,
            verify_refetched: true,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Whether a refetched pinned resource must pass verification before it
    /// is stored. When off, the fresh copy is trusted as fetched.
    pub fn verify_refetched(mut self, verify: bool) -> Self {
        self.verify_refetched = verify;
        self
    }

    pub fn resolver(&self) -> &PolicyResolver {
        &self.resolver
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Resolve a policy for `request` and run it.
    ///
    /// # Errors
    ///
    /// Only transport failures surface, and only when no stored copy can
    /// stand in. Store failures never reach the caller.
    pub async fn intercept(&self, request: &InterceptRequest) -> Result<Response, Error> {
        let policy = self.resolver.resolve(request);
        tracing::debug!(%policy, method = %request.method(), url = %request.url(), "intercept");

        match policy {
            RoutingPolicy::Bypass => self.transport.fetch(request).await,
            RoutingPolicy::Navigation => self.network_first(request).await,
            RoutingPolicy::VerifiedBinary => self.verified(request).await,
            RoutingPolicy::CacheFirst | RoutingPolicy::NetworkFirst => self.read_through(request).await,
        }
    }

    /// Wait for every spawned store write to finish.
    pub async fn settle(&self) {
        let pending = std::mem::take(&mut *self.writes.lock().unwrap_or_else(PoisonError::into_inner));
        for write in pending {
            if let Err(e) = write.await {
                tracing::warn!(error = %e, "cache write task failed");
            }
        }
    }

    async fn network_first(&self, request: &InterceptRequest) -> Result<Response, Error> {
        let key = request.key();
        match self.transport.fetch(request).await {
            Ok(response) => Ok(self.store_if_ok(key, response)),
            Err(err) => match self.lookup(&key).await {
                Some(entry) => {
                    tracing::debug!(%key, error = %err, "network failed; serving stored copy");
                    Ok(Response::from_entry(entry))
                }
                None => Err(err),
            },
        }
    }

    async fn read_through(&self, request: &InterceptRequest) -> Result<Response, Error> {
        let key = request.key();
        if let Some(entry) = self.lookup(&key).await {
            tracing::debug!(%key, "cache hit");
            return Ok(Response::from_entry(entry));
        }

        tracing::debug!(%key, "cache miss");
        let response = self.transport.fetch(request).await?;
        Ok(self.store_if_ok(key, response))
    }

    async fn verified(&self, request: &InterceptRequest) -> Result<Response, Error> {
        let key = request.key();
        let expected = self
            .resolver
            .pinned()
            .expected_for(request.url())
            .cloned()
            .unwrap_or(ExpectedDigest::Unpinned);

        if let Some(entry) = self.lookup(&key).await {
            let verdict = self.verifier.verify(entry.body.clone(), &expected).await;
            if verdict.is_valid() {
                tracing::debug!(%key, "verified cache hit");
                return Ok(Response::from_entry(entry));
            }
            tracing::warn!(%key, ?verdict, "stored copy failed verification; refetching");
        }

        let response = self.transport.fetch(request).await?;
        if !response.ok() {
            return Ok(response);
        }

        if !self.verify_refetched {
            tracing::warn!(%key, "storing refetched copy without verification");
            return Ok(self.store_if_ok(key, response));
        }

        let (response, entry) = response.tee();
        let verdict = self.verifier.verify(entry.body.clone(), &expected).await;
        if verdict.is_valid() {
            self.spawn_write(key, entry);
        } else {
            tracing::warn!(%key, ?verdict, "refetched copy failed verification; not storing");
        }
        Ok(response)
    }

    /// Stored entry for `key`. A failed read counts as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<CachedEntry> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache read failed; treating as miss");
                None
            }
        }
    }

    fn store_if_ok(&self, key: RequestKey, response: Response) -> Response {
        if !response.ok() {
            tracing::debug!(%key, status = response.status, "not storing unsuccessful response");
            return response;
        }
        let (response, entry) = response.tee();
        self.spawn_write(key, entry);
        response
    }

    fn spawn_write(&self, key: RequestKey, entry: CachedEntry) {
        let store = self.store.clone();
        let write = tokio::spawn(async move {
            match store.put(&key, &entry).await {
                Ok(()) => tracing::debug!(%key, generation = store.generation(), "stored response"),
                Err(e) => tracing::warn!(%key, error = %e, "cache write failed"),
            }
        });

        let mut writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        writes.retain(|w| !w.is_finished());
        writes.push(write);
    }
}
