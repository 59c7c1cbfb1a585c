//! Interception engine for intercache.
//!
//! This crate provides the request classification, the per-policy
//! read/fetch/write sequences, integrity verification of pinned artifacts,
//! generation cleanup, and the host lifecycle that ties them together. The
//! reqwest-backed transport lives here as well.

pub mod fetch;
pub mod host;
pub mod integrity;
pub mod orchestrator;
pub mod policy;
pub mod request;
pub mod response;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchClient, FetchConfig, OriginAllowList, Transport};
pub use host::{LifecycleState, ServiceHost};
pub use integrity::{ExpectedDigest, IntegrityVerifier, PinnedSet, Verdict};
pub use orchestrator::CacheOrchestrator;
pub use policy::{PolicyResolver, RoutingPolicy};
pub use request::{Destination, InterceptRequest};
pub use response::{Payload, Response, ResponseSource};
pub use version::CacheVersionManager;
