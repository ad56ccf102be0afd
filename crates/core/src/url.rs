//! URL canonicalization and asset identifier resolution.
//!
//! Cache keys are built from the resolved URL, so every identifier that
//! reaches the store goes through one of these functions first.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an absolute URL string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    finish(parsed)
}

/// Resolve an asset identifier against the worker scope.
///
/// Relative identifiers (`./`, `./app.js`, `/style.css`) are joined onto
/// `scope`; absolute ones replace it. The result follows the same rules as
/// [`canonicalize`], so `./index.html#top` and `./index.html` share a key.
pub fn resolve(scope: &Url, identifier: &str) -> Result<Url, UrlError> {
    let trimmed = identifier.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = scope.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    finish(joined)
}

fn finish(mut parsed: Url) -> Result<Url, UrlError> {
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("https://app.example.com/shell/").unwrap()
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment_keep_query() {
        let url = canonicalize("https://example.com/path?a=1&b=2#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_whitespace_only() {
        let result = canonicalize("   ");
        assert!(matches!(result, Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_scope_root() {
        let url = resolve(&scope(), "./").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/shell/");
    }

    #[test]
    fn test_resolve_relative_file() {
        let url = resolve(&scope(), "./calculator.html").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/shell/calculator.html");
    }

    #[test]
    fn test_resolve_root_relative() {
        let url = resolve(&scope(), "/manifest.json").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/manifest.json");
    }

    #[test]
    fn test_resolve_absolute_replaces_scope() {
        let url = resolve(&scope(), "https://CDN.tailwindcss.com").unwrap();
        assert_eq!(url.as_str(), "https://cdn.tailwindcss.com/");
    }

    #[test]
    fn test_resolve_strips_fragment() {
        let a = resolve(&scope(), "./index.html#top").unwrap();
        let b = resolve(&scope(), "./index.html").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_rejects_other_schemes() {
        let result = resolve(&scope(), "data:text/plain,hello");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(s)) if s == "data"));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&scope(), ""), Err(UrlError::Empty)));
    }
}
