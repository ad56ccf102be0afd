//! Lifecycle host: owns the worker phase and routes events.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::{InstallReport, Intercepted, LifecycleHandler};
use crate::Error;
use crate::message::{Request, ResponseSource};
use crate::network::Network;

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPhase {
    /// Registered, install not yet dispatched.
    Parsed,
    Installing,
    /// Install succeeded; fetches are intercepted.
    Active,
    /// Install failed; fetches bypass the worker.
    Redundant,
}

/// Drives a `LifecycleHandler` the way a browser drives a worker script.
///
/// Fetch events reach the handler only while the worker is `Active`. In every
/// other phase requests go straight to the network, as if nothing were
/// installed.
pub struct WorkerHost {
    handler: Arc<dyn LifecycleHandler>,
    network: Arc<dyn Network>,
    phase: Arc<Mutex<WorkerPhase>>,
}

/// Marks the worker redundant if an install is dropped before it finishes.
struct InstallGuard {
    phase: Arc<Mutex<WorkerPhase>>,
    armed: bool,
}

impl InstallGuard {
    fn finish(mut self, next: WorkerPhase) {
        set_phase(&self.phase, next);
        self.armed = false;
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("install abandoned before completion; worker is redundant");
            set_phase(&self.phase, WorkerPhase::Redundant);
        }
    }
}

fn set_phase(phase: &Mutex<WorkerPhase>, next: WorkerPhase) {
    *phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

impl WorkerHost {
    pub fn new(handler: Arc<dyn LifecycleHandler>, network: Arc<dyn Network>) -> Self {
        Self { handler, network, phase: Arc::new(Mutex::new(WorkerPhase::Parsed)) }
    }

    pub fn phase(&self) -> WorkerPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch the install event and wait for it to settle.
    ///
    /// Allowed from `Parsed`, and from `Redundant` (a fresh registration
    /// retrying a failed install). On success the worker becomes `Active`;
    /// on failure it becomes `Redundant` and the error is returned unchanged.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let guard = {
            let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
            match *phase {
                WorkerPhase::Parsed | WorkerPhase::Redundant => *phase = WorkerPhase::Installing,
                WorkerPhase::Installing => {
                    return Err(Error::InvalidState("install already in progress".into()));
                }
                WorkerPhase::Active => return Err(Error::InvalidState("worker is already active".into())),
            }
            InstallGuard { phase: Arc::clone(&self.phase), armed: true }
        };

        tracing::info!("dispatching install event");
        let result = self.handler.on_install().await;

        match &result {
            Ok(report) => {
                guard.finish(WorkerPhase::Active);
                tracing::info!(
                    cache_name = %report.cache_name,
                    assets = report.cached.len(),
                    elapsed_ms = report.elapsed_ms,
                    "install complete; worker is active"
                );
            }
            Err(e) => {
                guard.finish(WorkerPhase::Redundant);
                tracing::warn!(error = %e, "install failed; worker is redundant");
            }
        }

        result
    }

    /// Dispatch a fetch event for `request`.
    pub async fn fetch(&self, request: Request) -> Result<Intercepted, Error> {
        let phase = self.phase();
        if phase == WorkerPhase::Active {
            return self.handler.on_fetch(request).await;
        }

        tracing::debug!(url = %request.url, ?phase, "worker not active, fetching directly");
        let response = self.network.fetch(&request).await?;
        Ok(Intercepted { response, source: ResponseSource::Network })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStorage, MemoryStorage};
    use crate::worker::test_support::StubNetwork;
    use crate::worker::{Worker, WorkerConfig};
    use url::Url;

    const A: &str = "https://app.example.com/a.html";
    const MISSING: &str = "https://app.example.com/missing.html";

    fn host(assets: &[&str], network: Arc<StubNetwork>) -> WorkerHost {
        let config = WorkerConfig {
            cache_name: "v1".into(),
            scope: Url::parse("https://app.example.com/").unwrap(),
            assets: assets.iter().map(|s| s.to_string()).collect(),
            prefetch_concurrency: 2,
        };
        let storage: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new());
        let worker = Worker::new(config, storage, network.clone());
        WorkerHost::new(Arc::new(worker), network)
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_install_activates_worker() {
        let network = Arc::new(StubNetwork::new().respond(A, 200, "a"));
        let host = host(&["./a.html"], network.clone());
        assert_eq!(host.phase(), WorkerPhase::Parsed);

        host.install().await.unwrap();
        assert_eq!(host.phase(), WorkerPhase::Active);

        let result = host.fetch(get(A)).await.unwrap();
        assert_eq!(result.source, ResponseSource::Cache);
        assert_eq!(network.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_before_install_bypasses_worker() {
        let network = Arc::new(StubNetwork::new().respond(A, 200, "a"));
        let host = host(&["./a.html"], network.clone());

        let result = host.fetch(get(A)).await.unwrap();
        assert_eq!(result.source, ResponseSource::Network);
    }

    #[tokio::test]
    async fn test_failed_install_makes_worker_redundant() {
        let network = Arc::new(StubNetwork::new().respond(A, 200, "a").respond(MISSING, 404, "gone"));
        let host = host(&["./a.html", "./missing.html"], network.clone());

        let result = host.install().await;
        assert!(matches!(result, Err(Error::PrefetchFailed { .. })));
        assert_eq!(host.phase(), WorkerPhase::Redundant);

        let result = host.fetch(get(A)).await.unwrap();
        assert_eq!(result.source, ResponseSource::Network);
    }

    #[tokio::test]
    async fn test_redundant_worker_can_retry_install() {
        let network = Arc::new(StubNetwork::new().respond(A, 500, "down"));
        let host = host(&["./a.html"], network.clone());

        assert!(host.install().await.is_err());
        network.set(A, 200, "up");
        host.install().await.unwrap();
        assert_eq!(host.phase(), WorkerPhase::Active);
    }

    #[tokio::test]
    async fn test_second_install_rejected_when_active() {
        let network = Arc::new(StubNetwork::new().respond(A, 200, "a"));
        let host = host(&["./a.html"], network);

        host.install().await.unwrap();
        let result = host.install().await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert_eq!(host.phase(), WorkerPhase::Active);
    }
}
