//! Cache generation lifecycle.
//!
//! A build embeds one generation id (prefix + version tag). Activation deletes
//! every other generation so nothing is ever served from a superseded
//! deployment.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use intercache_core::{CacheStorage, Error, StoreHandle};

/// Owns the current generation id and garbage-collects the rest.
pub struct CacheVersionManager {
    current: String,
    storage: Arc<dyn CacheStorage>,
    ready: AtomicBool,
}

impl CacheVersionManager {
    pub fn new(storage: Arc<dyn CacheStorage>, current: impl Into<String>) -> Self {
        Self { current: current.into(), storage, ready: AtomicBool::new(false) }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Whether `activate` has run to completion.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Open the store for the current generation.
    pub async fn open_current(&self) -> Result<StoreHandle, Error> {
        StoreHandle::open(Arc::clone(&self.storage), &self.current).await
    }

    /// All stored generation ids, current included.
    pub async fn generations(&self) -> Result<Vec<String>, Error> {
        self.storage.list_generations().await
    }

    /// Delete every generation except the current one.
    ///
    /// Individual delete failures are logged and skipped; a generation that
    /// could not be deleted is retried on the next activation. Returns the
    /// ids that were deleted.
    ///
    /// # Errors
    ///
    /// Fails only if the generations cannot be listed.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let generations = self.storage.list_generations().await?;
        let mut deleted = Vec::new();

        for stale in generations.into_iter().filter(|id| id != &self.current) {
            match self.storage.delete_generation(&stale).await {
                Ok(_) => {
                    tracing::info!(generation = %stale, "deleted stale cache generation");
                    deleted.push(stale);
                }
                Err(e) => tracing::warn!(generation = %stale, error = %e, "failed to delete stale cache generation"),
            }
        }

        self.ready.store(true, Ordering::Release);
        tracing::info!(current = %self.current, deleted = deleted.len(), "cache generation activated");

        Ok(deleted)
    }
}
