//! Request classification.
//!
//! Each intercepted request is mapped to exactly one [`RoutingPolicy`] once,
//! up front; the orchestrator then matches on the variant and never
//! re-evaluates the request shape mid-flight.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::fetch::OriginAllowList;
use crate::integrity::PinnedSet;
use crate::request::{Destination, InterceptRequest};

/// Caching strategy for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Not eligible for caching. Passed to the transport untouched.
    Bypass,
    /// Page navigation: network first, stored copy when offline.
    Navigation,
    /// Pinned artifact: served from the store only after digest verification.
    VerifiedBinary,
    /// Scripts and workers: once stored, never revalidated.
    CacheFirst,
    /// The default route. Serves a stored copy when present and otherwise
    /// fetches and fills the store, same read-through shape as `CacheFirst`.
    NetworkFirst,
}

impl RoutingPolicy {
    pub fn is_bypass(&self) -> bool {
        matches!(self, RoutingPolicy::Bypass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingPolicy::Bypass => "bypass",
            RoutingPolicy::Navigation => "navigation",
            RoutingPolicy::VerifiedBinary => "verified_binary",
            RoutingPolicy::CacheFirst => "cache_first",
            RoutingPolicy::NetworkFirst => "network_first",
        }
    }
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure classifier from request shape to policy.
#[derive(Debug, Clone)]
pub struct PolicyResolver {
    origins: OriginAllowList,
    pinned: Arc<PinnedSet>,
}

impl PolicyResolver {
    pub fn new(origins: OriginAllowList, pinned: Arc<PinnedSet>) -> Self {
        Self { origins, pinned }
    }

    /// Classify `request`. First matching rule wins.
    pub fn resolve(&self, request: &InterceptRequest) -> RoutingPolicy {
        if *request.method() != Method::GET || !self.origins.allows(request.url()) {
            return RoutingPolicy::Bypass;
        }

        if request.is_navigation() {
            return RoutingPolicy::Navigation;
        }

        if self.pinned.matches(request.url()) {
            return RoutingPolicy::VerifiedBinary;
        }

        match request.destination() {
            Destination::Script | Destination::Worker => RoutingPolicy::CacheFirst,
            _ => RoutingPolicy::NetworkFirst,
        }
    }

    pub fn pinned(&self) -> &PinnedSet {
        &self.pinned
    }
}
