//! Unified error types for readthrough.
//!
//! Every message carries a stable code prefix so hosts can match on it
//! without depending on the variant layout.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error type for the worker, its stores and its network client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., duplicate assets, unknown method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL or asset identifier.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Lifecycle event dispatched in the wrong phase.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// No cache entry found for the given request.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded back into a response.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Network-level failure (connection refused, TLS, broken body...).
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// One asset of the install batch could not be fetched or stored.
    #[error("PREFETCH_FAILED: {asset}: {reason}")]
    PrefetchFailed { asset: String, reason: String },
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
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::PrefetchFailed { .. } => (-32013, err.to_string()),
            Error::InvalidState(msg) => (-32014, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("https://example.com/app.js".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("app.js"));
    }

    #[test]
    fn test_prefetch_failed_names_asset() {
        let err = Error::PrefetchFailed { asset: "./missing.html".to_string(), reason: "status 404".to_string() };
        assert_eq!(err.to_string(), "PREFETCH_FAILED: ./missing.html: status 404");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let mcp_err: McpError = Error::CacheMiss("abc".to_string()).into();
        assert_eq!(mcp_err.code.0, -32001);

        let mcp_err: McpError = Error::InvalidState("already active".to_string()).into();
        assert_eq!(mcp_err.code.0, -32014);
    }
}
