//! Read-through interception of outgoing requests.

use crate::Error;
use crate::cache::CacheStorage;
use crate::message::{Request, Response, ResponseSource};
use crate::network::Network;

/// A response handed back to the requester, tagged with its origin.
#[derive(Debug, Clone)]
pub struct Intercepted {
    pub response: Response,
    pub source: ResponseSource,
}

/// Answer `request` from the `cache_name` store, or from the network on a miss.
///
/// The lookup always completes before the network is touched. A failed
/// lookup counts as a miss. Network responses are returned as-is and never
/// written back to the store.
pub async fn intercept(
    cache_name: &str, storage: &dyn CacheStorage, network: &dyn Network, request: Request,
) -> Result<Intercepted, Error> {
    match storage.lookup(cache_name, &request).await {
        Ok(Some(response)) => {
            tracing::debug!(url = %request.url, cache_name, "cache hit");
            return Ok(Intercepted { response, source: ResponseSource::Cache });
        }
        Ok(None) => {
            tracing::debug!(url = %request.url, method = %request.method, cache_name, "cache miss");
        }
        Err(e) => {
            tracing::warn!(url = %request.url, cache_name, error = %e, "cache lookup failed, using network");
        }
    }

    let response = network.fetch(&request).await?;
    Ok(Intercepted { response, source: ResponseSource::Network })
}
