//! Client code for readthrough.
//!
//! This crate provides the HTTP implementation of the worker's `Network`
//! seam, shared by the host binary and integration tests.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};
