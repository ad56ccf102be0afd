//! In-memory cache storage.
//!
//! Same semantics as the SQLite store, minus persistence. Used by tests and
//! by hosts that do not need entries to outlive the process.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::storage::{CacheStorage, CachedEntry, ensure_storable};
use crate::Error;
use crate::message::{Request, Response};

struct StoredEntry {
    key_hash: String,
    method: String,
    url: String,
    response: Response,
    fetched_at: String,
}

#[derive(Default)]
struct NamedStore {
    /// Insertion order of keys.
    order: Vec<String>,
    entries: HashMap<String, StoredEntry>,
}

#[derive(Default)]
struct Inner {
    /// Creation order of store names.
    names: Vec<String>,
    stores: HashMap<String, NamedStore>,
}

impl Inner {
    fn store_mut(&mut self, name: &str) -> &mut NamedStore {
        if !self.stores.contains_key(name) {
            self.names.push(name.to_string());
        }
        self.stores.entry(name.to_string()).or_default()
    }
}

/// Process-local `CacheStorage` backed by a `HashMap` behind a tokio RwLock.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        inner.store_mut(name);
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.inner.read().await.names.clone())
    }

    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        ensure_storable(&entries)?;

        let now = chrono::Utc::now().to_rfc3339();
        let mut inner = self.inner.write().await;
        let store = inner.store_mut(name);

        for (request, response) in entries {
            let key_hash = request.cache_key();
            if !store.entries.contains_key(&key_hash) {
                store.order.push(key_hash.clone());
            }
            store.entries.insert(
                key_hash.clone(),
                StoredEntry {
                    key_hash,
                    method: request.method.clone(),
                    url: request.cache_url().to_string(),
                    response,
                    fetched_at: now.clone(),
                },
            );
        }

        Ok(())
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let inner = self.inner.read().await;
        Ok(inner
            .stores
            .get(name)
            .and_then(|store| store.entries.get(&request.cache_key()))
            .map(|entry| entry.response.clone()))
    }

    async fn entries(&self, name: &str) -> Result<Vec<CachedEntry>, Error> {
        let inner = self.inner.read().await;
        let Some(store) = inner.stores.get(name) else {
            return Ok(Vec::new());
        };

        Ok(store
            .order
            .iter()
            .filter_map(|key| store.entries.get(key))
            .map(|entry| CachedEntry {
                cache_name: name.to_string(),
                key_hash: entry.key_hash.clone(),
                method: entry.method.clone(),
                url: entry.url.clone(),
                status: entry.response.status,
                content_type: entry.response.content_type().map(str::to_string),
                body_len: entry.response.body.len(),
                fetched_at: entry.fetched_at.clone(),
            })
            .collect())
    }
}
