//! cache_list tool implementation.
//!
//! Lists cache generations and the entries of one of them.

use readthrough_core::{CacheStorage, CachedEntry, Error, WorkerConfig};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Generation whose entries to list (default: the worker's current generation).
    #[serde(default)]
    pub cache_name: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    /// Generation the worker reads from.
    pub active_cache: String,
    /// All generations in storage, oldest first.
    pub caches: Vec<String>,
    /// Entries of the requested generation, in insertion order.
    pub entries: Vec<CachedEntry>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(
    storage: &dyn CacheStorage, config: &WorkerConfig, params: CacheListParams,
) -> Result<CallToolResult, McpError> {
    let cache_name = params.cache_name.unwrap_or_else(|| config.cache_name.clone());
    if cache_name.trim().is_empty() {
        return Err(Error::InvalidInput("cache_name cannot be empty".into()).into());
    }

    let caches = storage.cache_names().await?;
    let entries = storage.entries(&cache_name).await?;

    let output = CacheListOutput { active_cache: config.cache_name.clone(), caches, entries };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
