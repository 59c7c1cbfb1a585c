//! Storage abstraction used by the interception engine.
//!
//! The engine never sees SQL. It opens a [`StoreHandle`] bound to one
//! generation and performs atomic per-key get/put through it. Generation
//! housekeeping (list, delete) goes through [`CacheStorage`] directly.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::CachedEntry;
use super::key::RequestKey;
use crate::Error;

/// Persistent key-value blob store partitioned by generation.
///
/// Implementations must make `put` a full-entry replace and `get`/`put`
/// atomic per key. No multi-key transactions are required.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Make sure `generation` exists so entries can be written into it.
    async fn open_generation(&self, generation: &str) -> Result<(), Error>;

    async fn list_generations(&self) -> Result<Vec<String>, Error>;

    /// Returns whether the generation existed.
    async fn delete_generation(&self, generation: &str) -> Result<bool, Error>;

    async fn get(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error>;

    async fn put(&self, generation: &str, key: &RequestKey, entry: &CachedEntry) -> Result<(), Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open_generation(&self, generation: &str) -> Result<(), Error> {
        self.ensure_generation(generation).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        CacheDb::list_generations(self).await
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        CacheDb::delete_generation(self, generation).await
    }

    async fn get(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        self.get_entry(generation, key).await
    }

    async fn put(&self, generation: &str, key: &RequestKey, entry: &CachedEntry) -> Result<(), Error> {
        self.put_entry(generation, key, entry).await
    }
}

/// A store bound to a single generation.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct StoreHandle {
    generation: Arc<str>,
    backend: Arc<dyn CacheStorage>,
}

impl StoreHandle {
    /// Open (creating if needed) the store for `generation`.
    pub async fn open(backend: Arc<dyn CacheStorage>, generation: &str) -> Result<Self, Error> {
        backend.open_generation(generation).await?;
        Ok(Self { generation: Arc::from(generation), backend })
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub async fn get(&self, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        self.backend.get(&self.generation, key).await
    }

    pub async fn put(&self, key: &RequestKey, entry: &CachedEntry) -> Result<(), Error> {
        self.backend.put(&self.generation, key, entry).await
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle").field("generation", &self.generation).finish_non_exhaustive()
    }
}
