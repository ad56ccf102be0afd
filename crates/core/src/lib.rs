//! Core types and shared functionality for readthrough.
//!
//! This crate provides:
//! - Named response stores (SQLite and in-memory) behind `CacheStorage`
//! - The `Network` seam and request/response descriptors
//! - The worker: install-time prefetch, read-through interception, lifecycle host
//! - Unified error types and layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod message;
pub mod network;
pub mod url;
pub mod worker;

pub use cache::{CacheDb, CacheStorage, CachedEntry, MemoryStorage};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use message::{Request, Response, ResponseSource};
pub use network::Network;
pub use worker::{InstallReport, Intercepted, LifecycleHandler, Worker, WorkerConfig, WorkerHost, WorkerPhase};
