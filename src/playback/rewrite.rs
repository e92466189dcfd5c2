//! Media URL rewriting through the proxy

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Path prefix of the proxy's HLS endpoint
pub const PROXY_HLS_PREFIX: &str = "/api/hls/";

static BACKEND_HLS_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/hls/(.*)$").ok());

/// Route a playlist or subtitle URL through the proxy.
///
/// - already proxied (`/api/hls/...`): unchanged
/// - contains a backend `/hls/<rest>` path: becomes `/api/hls/<rest>`
/// - anything else: unchanged
pub fn to_proxy_hls_url(url: &str) -> Cow<'_, str> {
    if url.starts_with(PROXY_HLS_PREFIX) {
        return Cow::Borrowed(url);
    }
    let rest = BACKEND_HLS_PATH
        .as_ref()
        .and_then(|re| re.captures(url))
        .and_then(|c| c.get(1));
    match rest {
        Some(rest) => Cow::Owned(format!("{}{}", PROXY_HLS_PREFIX, rest.as_str())),
        None => Cow::Borrowed(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_root_relative() {
        assert_eq!(
            to_proxy_hls_url("/hls/v1/index.m3u8"),
            "/api/hls/v1/index.m3u8"
        );
    }

    #[test]
    fn test_rewrites_absolute_backend_url() {
        assert_eq!(
            to_proxy_hls_url("http://localhost:5000/hls/v1/subs/fr.vtt"),
            "/api/hls/v1/subs/fr.vtt"
        );
    }

    #[test]
    fn test_idempotent() {
        let once = to_proxy_hls_url("/hls/v1/index.m3u8").into_owned();
        assert_eq!(to_proxy_hls_url(&once), once);
        assert!(matches!(to_proxy_hls_url(&once), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unrelated_unchanged() {
        assert_eq!(
            to_proxy_hls_url("https://cdn.example.com/v1/index.m3u8"),
            "https://cdn.example.com/v1/index.m3u8"
        );
        assert_eq!(to_proxy_hls_url(""), "");
    }
}
