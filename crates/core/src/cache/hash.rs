//! Request key generation for store entries.

use sha2::{Digest, Sha256};

/// Compute the store key for a request.
///
/// `url` is expected to be resolved and fragment-free already.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
