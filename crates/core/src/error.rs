//! Unified error types for intercache.
//!
//! The first four families (network, store, integrity, routing) are the ones the
//! interception engine reasons about; the rest describe bad input or misuse.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the intercache engine and host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport could not complete the request.
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),

    /// The transport gave up waiting for a response.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Database operation failed.
    #[error("STORE_FAILURE: {0}")]
    Database(tokio_rusqlite::Error),

    /// Store backend rejected the operation for a non-database reason.
    #[error("STORE_FAILURE: {0}")]
    StoreFailure(String),

    /// Migration failed to apply.
    #[error("STORE_FAILURE: migration failed: {0}")]
    MigrationFailed(String),

    /// Digest mismatch or verifier failure.
    #[error("INTEGRITY_FAILURE: {0}")]
    IntegrityFailure(String),

    /// A request reached the engine without a route.
    #[error("UNROUTABLE_REQUEST: {0}")]
    UnroutableRequest(String),

    /// No cache entry for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Host lifecycle hook called out of order.
    #[error("LIFECYCLE: {0}")]
    Lifecycle(String),
}

impl Error {
    /// True for failures that originate in the transport.
    ///
    /// These are the only failures a caller of `intercept` can observe.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::NetworkFailure(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32602, msg.clone()),
            Error::NetworkFailure(msg) => (-32001, msg.clone()),
            Error::FetchTimeout(msg) => (-32002, msg.clone()),
            Error::FetchTooLarge(msg) => (-32003, msg.clone()),
            Error::Database(e) => (-32004, e.to_string()),
            Error::StoreFailure(msg) => (-32004, msg.clone()),
            Error::MigrationFailed(msg) => (-32004, msg.clone()),
            Error::IntegrityFailure(msg) => (-32005, msg.clone()),
            Error::UnroutableRequest(msg) => (-32006, msg.clone()),
            Error::CacheMiss(msg) => (-32007, msg.clone()),
            Error::Lifecycle(msg) => (-32008, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
