//! Install-time prefetch.
//!
//! Resolves the asset list, fetches every asset with bounded concurrency and
//! stores the whole batch in one write. Any failed or unmatchable fetch
//! fails the batch and nothing from it is stored.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use super::WorkerConfig;
use crate::Error;
use crate::cache::CacheStorage;
use crate::message::{Request, Response};
use crate::network::Network;
use crate::url::resolve;

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    /// Generation the assets were written to.
    pub cache_name: String,
    /// Resolved asset URLs, in asset-list order.
    pub cached: Vec<String>,
    pub elapsed_ms: u64,
}

/// Resolve asset identifiers against `scope` into `GET` requests.
///
/// Returns `(identifier, request)` pairs in list order. Fails on the first
/// identifier that does not resolve to an http(s) URL, and on two
/// identifiers resolving to the same URL.
pub fn resolve_assets(scope: &Url, assets: &[String]) -> Result<Vec<(String, Request)>, Error> {
    let mut seen = HashSet::with_capacity(assets.len());
    let mut resolved = Vec::with_capacity(assets.len());

    for asset in assets {
        let url = resolve(scope, asset).map_err(|e| Error::InvalidUrl(format!("{asset}: {e}")))?;
        if !seen.insert(url.clone()) {
            return Err(Error::InvalidInput(format!("duplicate asset {asset} (resolves to {url})")));
        }
        resolved.push((asset.clone(), Request::get(url)));
    }

    Ok(resolved)
}

fn check_matchable(asset: &str, response: &Response) -> Result<(), Error> {
    if !response.is_ok() {
        return Err(Error::PrefetchFailed { asset: asset.to_string(), reason: format!("status {}", response.status) });
    }
    if response.varies_on_everything() {
        return Err(Error::PrefetchFailed { asset: asset.to_string(), reason: "response has Vary: *".to_string() });
    }
    Ok(())
}

/// Populate the generation named in `config` with every configured asset.
pub async fn prefetch(
    config: &WorkerConfig, storage: &Arc<dyn CacheStorage>, network: &Arc<dyn Network>,
) -> Result<InstallReport, Error> {
    let start = Instant::now();
    let assets = resolve_assets(&config.scope, &config.assets)?;
    let total = assets.len();

    storage.open(&config.cache_name).await?;

    let semaphore = Arc::new(Semaphore::new(config.prefetch_concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (index, (asset, request)) in assets.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let network = Arc::clone(network);

        join_set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => network.fetch(&request).await,
                Err(e) => Err(Error::InvalidState(e.to_string())),
            };
            (index, asset, request, result)
        });
    }

    let mut fetched: Vec<Option<(Request, Response)>> = (0..total).map(|_| None).collect();

    // Returning early drops the JoinSet, which aborts the fetches still running.
    while let Some(joined) = join_set.join_next().await {
        let (index, asset, request, result) = joined.map_err(|e| Error::PrefetchFailed {
            asset: "<install task>".to_string(),
            reason: e.to_string(),
        })?;

        let response =
            result.map_err(|e| Error::PrefetchFailed { asset: asset.clone(), reason: e.to_string() })?;
        check_matchable(&asset, &response)?;

        tracing::debug!(asset = %asset, url = %request.url, bytes = response.body.len(), "prefetched asset");
        fetched[index] = Some((request, response));
    }

    let entries: Vec<(Request, Response)> = fetched.into_iter().flatten().collect();
    let cached = entries.iter().map(|(request, _)| request.url.to_string()).collect();

    storage.put_all(&config.cache_name, entries).await?;

    Ok(InstallReport { cache_name: config.cache_name.clone(), cached, elapsed_ms: start.elapsed().as_millis() as u64 })
}
