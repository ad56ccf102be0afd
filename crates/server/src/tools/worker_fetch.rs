//! worker_fetch tool implementation.
//!
//! Dispatches a fetch event through the worker host, the way a controlled
//! page's request would reach it.

use std::collections::BTreeMap;

use readthrough_core::url::resolve;
use readthrough_core::{Error, Request, Response, ResponseSource, WorkerHost};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// URL to request. Relative URLs resolve against the worker scope.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests can be served from cache.
    #[serde(default = "default_method")]
    pub method: String,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

/// A response as shown to the MCP client.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseOutput {
    /// Where the response came from, when it went through the worker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
    pub status: u16,
    pub status_text: String,
    /// Final URL of the response.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body_len: usize,
    /// Body as text; absent when it is not valid UTF-8.
    pub body: Option<String>,
}

impl ResponseOutput {
    pub fn new(response: Response, source: Option<ResponseSource>) -> Self {
        let body = String::from_utf8(response.body.to_vec()).ok();
        Self {
            source,
            status: response.status,
            status_text: response.status_text,
            url: response.url.to_string(),
            headers: response.headers,
            body_len: response.body.len(),
            body,
        }
    }
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(host: &WorkerHost, scope: &Url, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = resolve(scope, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = Request::new(&params.method, url);
    for (name, value) in params.headers {
        request = request.with_header(name, value);
    }

    let intercepted = host.fetch(request).await?;
    let output = ResponseOutput::new(intercepted.response, Some(intercepted.source));

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize response: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{A_HTML, output_text, setup};

    fn params(url: &str) -> WorkerFetchParams {
        WorkerFetchParams { url: url.to_string(), method: default_method(), headers: BTreeMap::new() }
    }

    #[tokio::test]
    async fn test_fetch_from_cache_after_install() {
        let fixture = setup(&["./a.html"]).await;
        fixture.host.install().await.unwrap();

        let result = fetch_impl(&fixture.host, &fixture.config.scope, params("./a.html")).await.unwrap();
        let output: ResponseOutput = serde_json::from_str(&output_text(&result)).unwrap();

        assert_eq!(output.source, Some(ResponseSource::Cache));
        assert_eq!(output.body.as_deref(), Some(A_HTML));
        assert_eq!(fixture.network.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_miss_uses_network() {
        let fixture = setup(&[]).await;
        fixture.host.install().await.unwrap();

        let result = fetch_impl(&fixture.host, &fixture.config.scope, params("./a.html")).await.unwrap();
        let output: ResponseOutput = serde_json::from_str(&output_text(&result)).unwrap();

        assert_eq!(output.source, Some(ResponseSource::Network));
        assert_eq!(output.status, 200);
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let fixture = setup(&[]).await;
        let result = fetch_impl(&fixture.host, &fixture.config.scope, params("  ")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_unsupported_scheme() {
        let fixture = setup(&[]).await;
        let result = fetch_impl(&fixture.host, &fixture.config.scope, params("file:///etc/hosts")).await;
        assert_eq!(result.unwrap_err().code.0, -32003);
    }
}
