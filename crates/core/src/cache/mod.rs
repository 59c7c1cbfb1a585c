//! SQLite-backed, generation-scoped response store.
//!
//! Every cached response lives inside a named generation (a deployment epoch).
//! The interception engine only ever talks to one generation at a time through
//! a [`StoreHandle`]; stale generations are dropped wholesale on activation.
//!
//! - Request keys hashed with SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Full-entry UPSERT, never partial updates

pub mod connection;
pub mod entries;
pub mod generations;
pub mod key;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use key::RequestKey;
pub use store::{CacheStorage, StoreHandle};
