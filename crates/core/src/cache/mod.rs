//! Named response stores.
//!
//! A store maps request keys to responses and is identified by its cache
//! generation name. Two backends implement `CacheStorage`:
//!
//! - `CacheDb`: SQLite via tokio-rusqlite, WAL mode, versioned migrations
//! - `MemoryStorage`: process-local, for tests and ephemeral hosts

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use storage::{CacheStorage, CachedEntry};
