use std::path::PathBuf;

use crate::config::trim_base;

/// Shared state for the proxy handlers.
///
/// Nothing here is mutated after construction; every request re-fetches
/// upstream.
#[derive(Debug, Clone)]
pub struct ProxyState {
    /// Backend base URL without trailing slash
    backend_url: String,

    /// Pooled client for upstream requests
    client: reqwest::Client,

    /// Directory served by the local catalog endpoint
    local_catalog: Option<PathBuf>,
}

impl ProxyState {
    /// Create proxy state for a backend.
    ///
    /// # Arguments
    /// * `backend_url` - Backend base URL (e.g., http://localhost:5000)
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: trim_base(backend_url),
            client: reqwest::Client::new(),
            local_catalog: None,
        }
    }

    /// Serve `/api/videos/local` from this directory.
    pub fn with_local_catalog(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_catalog = Some(dir.into());
        self
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn local_catalog(&self) -> Option<&PathBuf> {
        self.local_catalog.as_ref()
    }

    /// Backend catalog endpoint.
    pub fn videos_url(&self) -> String {
        format!("{}/videos", self.backend_url)
    }

    /// Backend endpoint for a single video.
    pub fn video_url(&self, id: &str) -> String {
        format!("{}/videos/{}", self.backend_url, urlencoding::encode(id))
    }

    /// Backend URL for an HLS resource, keeping the raw query if any.
    ///
    /// `path` arrives percent-decoded, so each segment is encoded again.
    pub fn hls_url(&self, path: &str, query: Option<&str>) -> String {
        let path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment))
            .collect::<Vec<_>>()
            .join("/");
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}/hls/{}?{}", self.backend_url, path, q),
            None => format!("{}/hls/{}", self.backend_url, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let state = ProxyState::new("http://localhost:5000/");
        assert_eq!(state.backend_url(), "http://localhost:5000");
        assert_eq!(state.videos_url(), "http://localhost:5000/videos");
        assert_eq!(state.video_url("a b"), "http://localhost:5000/videos/a%20b");
        assert_eq!(
            state.hls_url("v1/index.m3u8", None),
            "http://localhost:5000/hls/v1/index.m3u8"
        );
        assert_eq!(
            state.hls_url("v1/seg0.ts", Some("token=abc")),
            "http://localhost:5000/hls/v1/seg0.ts?token=abc"
        );
        assert_eq!(
            state.hls_url("v1/seg0.ts", Some("")),
            "http://localhost:5000/hls/v1/seg0.ts"
        );
    }

    #[test]
    fn test_hls_url_reencodes_segments() {
        let state = ProxyState::new("http://localhost:5000");
        assert_eq!(
            state.hls_url("v1/a?b.ts", None),
            "http://localhost:5000/hls/v1/a%3Fb.ts"
        );
        assert_eq!(
            state.hls_url("my show/c#d.ts", Some("t=1")),
            "http://localhost:5000/hls/my%20show/c%23d.ts?t=1"
        );
    }
}
