//! cache_match tool implementation.
//!
//! Looks a URL up in a cache generation without touching the network.

use readthrough_core::url::resolve;
use readthrough_core::{CacheStorage, Error, Request, WorkerConfig};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::worker_fetch::ResponseOutput;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// URL to look up. Relative URLs resolve against the worker scope.
    pub url: String,

    /// Generation to search (default: the worker's current generation).
    #[serde(default)]
    pub cache_name: Option<String>,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(
    storage: &dyn CacheStorage, config: &WorkerConfig, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    let url = resolve(&config.scope, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let cache_name = params.cache_name.as_deref().unwrap_or(&config.cache_name);

    let response = storage
        .lookup(cache_name, &Request::get(url.clone()))
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{url} in {cache_name}")))?;

    let output = ResponseOutput::new(response, None);
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize response: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{A_HTML, output_text, setup};

    #[tokio::test]
    async fn test_match_missing() {
        let fixture = setup(&["./a.html"]).await;
        let params = CacheMatchParams { url: "./a.html".to_string(), cache_name: None };

        let err = match_impl(fixture.storage.as_ref(), &fixture.config, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_match_found_after_install() {
        let fixture = setup(&["./a.html"]).await;
        fixture.host.install().await.unwrap();
        let params = CacheMatchParams { url: "https://app.example.com/a.html".to_string(), cache_name: None };

        let result = match_impl(fixture.storage.as_ref(), &fixture.config, params).await.unwrap();
        let output: ResponseOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output.body.as_deref(), Some(A_HTML));
        assert!(output.source.is_none());
    }

    #[tokio::test]
    async fn test_match_other_generation() {
        let fixture = setup(&["./a.html"]).await;
        fixture.host.install().await.unwrap();
        let params = CacheMatchParams { url: "./a.html".to_string(), cache_name: Some("v0".to_string()) };

        let result = match_impl(fixture.storage.as_ref(), &fixture.config, params).await;
        assert!(result.is_err());
    }
}
