//! MCP tool implementations.
//!
//! This module contains all tools exposed by the readthrough host.

pub mod cache;
pub mod worker_fetch;
pub mod worker_install;

pub use worker_fetch::{WorkerFetchParams, fetch_impl};
pub use worker_install::install_impl;
