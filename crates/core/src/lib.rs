//! Core types and shared functionality for intercache.
//!
//! This crate provides:
//! - Generation-scoped response store with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheStorage, CachedEntry, RequestKey, StoreHandle};
pub use config::{AppConfig, PinnedResource};
pub use error::Error;
