//! Cache-related MCP tools.
//!
//! Read-only views of the named stores; the worker is the only writer.

pub mod get;
pub mod list;

pub use get::{CacheMatchParams, match_impl};
pub use list::{CacheListParams, list_impl};
