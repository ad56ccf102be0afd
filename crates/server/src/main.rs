//! readthrough host entry point.
//!
//! Loads configuration, registers the cache worker, dispatches install and
//! serves the worker over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use readthrough_client::{FetchClient, FetchConfig};
use readthrough_core::{AppConfig, CacheDb, CacheStorage, Network, Worker, WorkerConfig, WorkerHost};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(cache_name = %config.cache_name, scope = %config.scope_url, "Starting readthrough host on stdio transport");

    let storage: Arc<dyn CacheStorage> = Arc::new(CacheDb::open(&config.db_path).await?);
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker_config = WorkerConfig::from_app_config(&config)?;

    let worker = Arc::new(Worker::new(worker_config, Arc::clone(&storage), Arc::clone(&network)));
    let worker_config = Arc::new(worker.config().clone());
    let host = Arc::new(WorkerHost::new(worker, network));

    if config.install_on_start
        && let Err(e) = host.install().await
    {
        tracing::error!(error = %e, "install on start failed; serving with a redundant worker");
    }

    let handler = handler::ReadthroughServer::new(host, storage, worker_config);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
