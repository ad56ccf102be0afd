//! worker_install tool implementation.
//!
//! Dispatches the install event and reports the resulting phase.

use readthrough_core::{Error, InstallReport, WorkerHost, WorkerPhase};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerInstallOutput {
    /// Worker phase after the install settled.
    pub phase: WorkerPhase,
    pub report: InstallReport,
}

/// Implementation of the worker_install tool.
pub async fn install_impl(host: &WorkerHost) -> Result<CallToolResult, McpError> {
    let report = host.install().await?;

    let output = WorkerInstallOutput { phase: host.phase(), report };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
