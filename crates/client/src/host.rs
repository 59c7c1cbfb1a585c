//! Host integration: the lifecycle hooks a runtime calls into.
//!
//! The host owns the only process-wide state: a small state machine
//! `Uninitialized -> Installing -> Active`. Installing wires up the engine for
//! the current generation and takes effect immediately. Activating garbage
//! collects stale generations and then claims every later request. Until the
//! host is active, intercepted requests go straight to the transport.

use std::sync::Arc;

use intercache_core::{AppConfig, CacheStorage, Error};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::fetch::{OriginAllowList, Transport};
use crate::integrity::PinnedSet;
use crate::orchestrator::CacheOrchestrator;
use crate::policy::PolicyResolver;
use crate::request::InterceptRequest;
use crate::response::Response;
use crate::version::CacheVersionManager;

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Uninitialized,
    Installing,
    Active,
}

enum Phase {
    Uninitialized,
    Installing(Arc<CacheOrchestrator>),
    Active(Arc<CacheOrchestrator>),
}

impl Phase {
    fn state(&self) -> LifecycleState {
        match self {
            Phase::Uninitialized => LifecycleState::Uninitialized,
            Phase::Installing(_) => LifecycleState::Installing,
            Phase::Active(_) => LifecycleState::Active,
        }
    }
}

/// Binds configuration, store and transport to the lifecycle hooks.
pub struct ServiceHost {
    config: AppConfig,
    transport: Arc<dyn Transport>,
    versions: CacheVersionManager,
    phase: RwLock<Phase>,
}

impl ServiceHost {
    pub fn new(config: AppConfig, storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>) -> Self {
        let versions = CacheVersionManager::new(storage, config.generation_id());
        Self { config, transport, versions, phase: RwLock::new(Phase::Uninitialized) }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn versions(&self) -> &CacheVersionManager {
        &self.versions
    }

    pub async fn state(&self) -> LifecycleState {
        self.phase.read().await.state()
    }

    /// Prepare the engine for the current generation.
    ///
    /// # Errors
    ///
    /// Fails on a second install, on an invalid origin or pinned pattern, or
    /// if the current generation's store cannot be opened.
    pub async fn on_install(&self) -> Result<(), Error> {
        let mut phase = self.phase.write().await;
        if !matches!(*phase, Phase::Uninitialized) {
            return Err(Error::Lifecycle(format!("install called while {:?}", phase.state())));
        }

        let origins = OriginAllowList::new(self.config.allowed_origins())
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        if origins.is_empty() {
            tracing::warn!("no allowed origins configured; every request will bypass the cache");
        }
        let origin_count = origins.len();
        let pinned = Arc::new(PinnedSet::from_config(&self.config.pinned)?);
        let store = self.versions.open_current().await?;

        let orchestrator = CacheOrchestrator::new(PolicyResolver::new(origins, pinned), store, Arc::clone(&self.transport))
            .verify_refetched(self.config.verify_refetched);

        *phase = Phase::Installing(Arc::new(orchestrator));
        tracing::info!(generation = self.versions.current(), origins = origin_count, "installed");
        Ok(())
    }

    /// Drop stale generations, then claim all subsequent requests.
    ///
    /// A store failure during cleanup is logged and does not prevent the
    /// claim; leftovers are collected on the next activation. Returns the
    /// generations that were deleted.
    ///
    /// # Errors
    ///
    /// Fails if the host has not been installed or is already active.
    pub async fn on_activate(&self) -> Result<Vec<String>, Error> {
        let orchestrator = match &*self.phase.read().await {
            Phase::Installing(orchestrator) => Arc::clone(orchestrator),
            other => return Err(Error::Lifecycle(format!("activate called while {:?}", other.state()))),
        };

        let deleted = match self.versions.activate().await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(error = %e, "stale generation cleanup failed; claiming anyway");
                Vec::new()
            }
        };

        let mut phase = self.phase.write().await;
        if let Phase::Installing(_) = *phase {
            *phase = Phase::Active(orchestrator);
            tracing::info!(generation = self.versions.current(), "active; claiming requests");
        }
        Ok(deleted)
    }

    /// Handle one intercepted request.
    pub async fn on_intercept(&self, request: &InterceptRequest) -> Result<Response, Error> {
        match self.orchestrator().await {
            Some(orchestrator) => orchestrator.intercept(request).await,
            None => {
                tracing::debug!(url = %request.url(), "not yet active; passing through");
                self.transport.fetch(request).await
            }
        }
    }

    /// The engine, once the host is active.
    pub async fn orchestrator(&self) -> Option<Arc<CacheOrchestrator>> {
        match &*self.phase.read().await {
            Phase::Active(orchestrator) => Some(Arc::clone(orchestrator)),
            _ => None,
        }
    }

    /// Wait for outstanding store writes.
    pub async fn settle(&self) {
        if let Some(orchestrator) = self.orchestrator().await {
            orchestrator.settle().await;
        }
    }
}
