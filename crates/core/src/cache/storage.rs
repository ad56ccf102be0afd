//! The named-store interface shared by the install and fetch handlers.

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::message::{Request, Response};

/// Summary of one stored entry, without the body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedEntry {
    pub cache_name: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body_len: usize,
    pub fetched_at: String,
}

/// A collection of named request → response stores.
///
/// Each name is one cache generation. Stores are created on first `open`
/// (or first insert) and are never removed by the worker.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the named store, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Names of all stores, oldest first.
    async fn cache_names(&self) -> Result<Vec<String>, Error>;

    /// Insert every pair into the named store as one unit.
    ///
    /// Entries with an existing key are replaced. Only `GET` requests may be
    /// stored.
    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), Error>;

    /// Look up the response stored for `request`.
    ///
    /// Returns `None` when the store does not exist, the key is absent, or
    /// the request is not a `GET`.
    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// List the entries of the named store in insertion order.
    async fn entries(&self, name: &str) -> Result<Vec<CachedEntry>, Error>;
}

pub(crate) fn ensure_storable(entries: &[(Request, Response)]) -> Result<(), Error> {
    if let Some((request, _)) = entries.iter().find(|(request, _)| !request.is_get()) {
        return Err(Error::InvalidInput(format!(
            "only GET requests can be cached, got {} {}",
            request.method, request.url
        )));
    }
    Ok(())
}
