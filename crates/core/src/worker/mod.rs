//! The cache worker: install-time prefetch and read-through interception.
//!
//! `Worker` implements `LifecycleHandler` on top of an injected
//! `CacheStorage` and `Network`. `WorkerHost` drives it through the
//! install → active lifecycle the way a browser host would.

pub mod host;
pub mod install;
pub mod intercept;

use std::sync::Arc;

use url::Url;

use crate::Error;
use crate::cache::CacheStorage;
use crate::config::AppConfig;
use crate::message::Request;
use crate::network::Network;
use crate::url::canonicalize;

pub use host::{WorkerHost, WorkerPhase};
pub use install::{InstallReport, prefetch, resolve_assets};
pub use intercept::{Intercepted, intercept};

/// The two constants a worker is built from, plus fetch tuning.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Cache generation name.
    pub cache_name: String,
    /// Base URL relative assets resolve against.
    pub scope: Url,
    /// Asset identifiers cached on install.
    pub assets: Vec<String>,
    /// Asset fetches in flight during install.
    pub prefetch_concurrency: usize,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = canonicalize(&config.scope_url).map_err(|e| Error::InvalidUrl(format!("scope_url: {e}")))?;
        Ok(Self {
            cache_name: config.cache_name.clone(),
            scope,
            assets: config.assets.clone(),
            prefetch_concurrency: config.prefetch_concurrency,
        })
    }
}

/// Host-facing contract of a worker script.
///
/// The returned future is the completion token: the host awaits it before
/// finishing the install transition, and takes the fetch response from it.
#[async_trait::async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Handle the one-shot install event.
    async fn on_install(&self) -> Result<InstallReport, Error>;

    /// Handle one intercepted request.
    async fn on_fetch(&self, request: Request) -> Result<Intercepted, Error>;
}

/// Read-through cache worker over injected storage and network.
pub struct Worker {
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl Worker {
    pub fn new(config: WorkerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self { config, storage, network }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl LifecycleHandler for Worker {
    async fn on_install(&self) -> Result<InstallReport, Error> {
        prefetch(&self.config, &self.storage, &self.network).await
    }

    async fn on_fetch(&self, request: Request) -> Result<Intercepted, Error> {
        intercept(&self.config.cache_name, self.storage.as_ref(), self.network.as_ref(), request).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use bytes::Bytes;
    use url::Url;

    use crate::Error;
    use crate::message::{Request, Response};
    use crate::network::Network;

    /// Canned network: answers from a URL table and records every call.
    #[derive(Default)]
    pub struct StubNetwork {
        routes: Mutex<HashMap<String, Result<(u16, &'static str), String>>>,
        calls: Mutex<Vec<String>>,
    }

    impl StubNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, url: &str, status: u16, body: &'static str) -> Self {
            self.routes.lock().unwrap().insert(url.to_string(), Ok((status, body)));
            self
        }

        pub fn fail(self, url: &str, reason: &str) -> Self {
            self.routes.lock().unwrap().insert(url.to_string(), Err(reason.to_string()));
            self
        }

        pub fn set(&self, url: &str, status: u16, body: &'static str) {
            self.routes.lock().unwrap().insert(url.to_string(), Ok((status, body)));
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Network for StubNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            let url = request.url.to_string();
            self.calls.lock().unwrap().push(url.clone());
            let route = self.routes.lock().unwrap().get(&url).cloned();
            match route {
                Some(Ok((status, body))) => Ok(Response {
                    status,
                    status_text: String::new(),
                    url: Url::parse(&url).unwrap(),
                    headers: vec![("Content-Type".to_string(), "text/html".to_string())],
                    body: Bytes::from_static(body.as_bytes()),
                }),
                Some(Err(reason)) => Err(Error::HttpError(reason)),
                None => Err(Error::HttpError(format!("no route for {url}"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::message::ResponseSource;
    use test_support::StubNetwork;

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig { scope_url: "https://App.example.com/shell/#x".into(), ..Default::default() };
        let config = WorkerConfig::from_app_config(&app).unwrap();
        assert_eq!(config.scope.as_str(), "https://app.example.com/shell/");
        assert_eq!(config.cache_name, "trustbureau-v1");
        assert_eq!(config.assets.len(), 5);
    }

    #[tokio::test]
    async fn test_worker_install_then_fetch() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(StubNetwork::new().respond("https://app.example.com/a.html", 200, "a"));
        let config = WorkerConfig {
            cache_name: "v1".into(),
            scope: Url::parse("https://app.example.com/").unwrap(),
            assets: vec!["./a.html".into()],
            prefetch_concurrency: 2,
        };
        let worker = Worker::new(config, storage, network.clone());
        assert_eq!(worker.config().cache_name, "v1");
        assert_eq!(worker.config().assets, vec!["./a.html".to_string()]);

        worker.on_install().await.unwrap();
        let request = Request::get(Url::parse("https://app.example.com/a.html").unwrap());
        let intercepted = worker.on_fetch(request).await.unwrap();

        assert_eq!(intercepted.source, ResponseSource::Cache);
        assert_eq!(network.calls().len(), 1);
    }
}
