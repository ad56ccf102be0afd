//! The network seam used by the worker.

use crate::Error;
use crate::message::{Request, Response};

/// Performs a request over the network.
///
/// Any HTTP status is a successful `Response`; `Err` is reserved for
/// transport failures (connection, timeout, size limit).
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
