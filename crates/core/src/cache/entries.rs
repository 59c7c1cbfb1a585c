//! Cached entry reads and writes.
//!
//! Entries are immutable snapshots of a response. A write replaces the whole
//! row for its (generation, key) slot; nothing ever patches a stored entry.

use super::connection::CacheDb;
use super::key::RequestKey;
use crate::Error;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Immutable snapshot of a response: status metadata plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    /// RFC 3339 timestamp of when the snapshot was taken.
    pub stored_at: String,
}

impl CachedEntry {
    pub fn new(status: u16, content_type: Option<String>, body: Bytes) -> Self {
        Self { status, content_type, body, stored_at: chrono::Utc::now().to_rfc3339() }
    }
}

impl CacheDb {
    /// Insert or replace the entry stored under `key` in `generation`.
    ///
    /// The generation must exist; writes into a deleted generation fail with a
    /// foreign key violation instead of resurrecting it.
    pub async fn put_entry(&self, generation: &str, key: &RequestKey, entry: &CachedEntry) -> Result<(), Error> {
        let generation = generation.to_string();
        let key_hash = key.hash();
        let method = key.method().to_string();
        let url = key.url().to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let body: &[u8] = &entry.body;
                conn.execute(
                    "INSERT INTO entries (
                    generation, key_hash, method, url, status, content_type, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(generation, key_hash) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status = excluded.status,
                    content_type = excluded.content_type,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &generation,
                        &key_hash,
                        &method,
                        &url,
                        i64::from(entry.status),
                        &entry.content_type,
                        body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry stored under `key` in `generation`.
    ///
    /// Returns None if the slot is empty.
    pub async fn get_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, content_type, body, stored_at
                FROM entries WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok(CachedEntry {
                        status: row.get(0)?,
                        content_type: row.get(1)?,
                        body: Bytes::from(row.get::<_, Vec<u8>>(2)?),
                        stored_at: row.get(3)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries held by `generation`.
    pub async fn count_entries(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
