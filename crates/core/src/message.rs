//! Request and response descriptors shared by the stores, the network
//! client and the worker.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_request_key;

/// Ordered header list. Names keep the casing they arrived with.
pub type HeaderList = Vec<(String, String)>;

/// An outbound resource fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-case HTTP method.
    pub method: String,
    pub url: Url,
    pub headers: HeaderList,
}

impl Request {
    /// Create a request with the given method. The method is upper-cased.
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.to_ascii_uppercase(), url, headers: Vec::new() }
    }

    /// Create a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Add a header, returning the request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only `GET` requests are stored or matched.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// URL used for cache matching: the request URL without its fragment.
    pub fn cache_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }

    /// Store key for this request (method + fragment-less URL).
    pub fn cache_key(&self) -> String {
        compute_request_key(&self.method, self.cache_url().as_str())
    }
}

/// The result of a fetch, from the network or from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    /// Final URL after redirects.
    pub url: Url,
    pub headers: HeaderList,
    pub body: Bytes,
}

impl Response {
    /// `true` for statuses in 200..=299.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// First value of the named header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether any `Vary` header lists `*`. Such responses can never be
    /// matched again and are refused by the install batch.
    pub fn varies_on_everything(&self) -> bool {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("vary"))
            .any(|(_, v)| v.split(',').any(|token| token.trim() == "*"))
    }
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
}
