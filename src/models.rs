//! Data structures shared by the proxy, the catalog client and playback
//!
//! - **Catalog**: videos as served by the backend
//! - **Subtitles**: explicit tracks and the auto-generated VTT track
//! - **Errors**: JSON error body returned by the proxy

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Catalog Models
// =============================================================================

/// A video entry from the backend catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Opaque identifier, unique within one catalog response
    pub id: String,
    pub title: String,
    /// Playlist location, absolute or root-relative
    pub hls_url: String,
    /// Thumbnail path; `None` renders a placeholder
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Explicit subtitle tracks, in display order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<Vec<SubtitleTrack>>,
    /// Whether the backend generated a VTT track for this video
    #[serde(default)]
    pub has_vtt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hls_vtt: Option<VttRef>,
}

impl Video {
    /// Create a video with only the required fields set
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        hls_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            hls_url: hls_url.into(),
            preview_url: None,
            subtitles: None,
            has_vtt: false,
            hls_vtt: None,
        }
    }

    /// URL of the auto-generated VTT track, if the backend produced one
    ///
    /// Requires both `has_vtt` and a non-empty `hls_vtt.url`.
    pub fn auto_vtt_url(&self) -> Option<&str> {
        if !self.has_vtt {
            return None;
        }
        self.hls_vtt
            .as_ref()
            .map(|vtt| vtt.url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Explicit subtitle tracks (empty slice when absent)
    pub fn subtitle_tracks(&self) -> &[SubtitleTrack] {
        self.subtitles.as_deref().unwrap_or(&[])
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.id)
    }
}

/// Explicit subtitle track descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub src: String,
    pub label: String,
    pub lang: String,
}

/// Reference to the backend's auto-generated VTT file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VttRef {
    pub url: String,
}

// =============================================================================
// Error Models
// =============================================================================

/// JSON body of every error response produced by the proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_minimal_json() {
        let json = r#"{"id":"v1","title":"Intro","hls_url":"/hls/v1/index.m3u8","preview_url":null}"#;
        let video: Video = serde_json::from_str(json).unwrap();
        assert_eq!(video.id, "v1");
        assert!(!video.has_vtt);
        assert!(video.subtitles.is_none());
        assert!(video.auto_vtt_url().is_none());
    }

    #[test]
    fn test_auto_vtt_requires_flag_and_url() {
        let mut video = Video::new("v1", "Intro", "/hls/v1/index.m3u8");
        video.hls_vtt = Some(VttRef {
            url: "/hls/v1/subs.vtt".into(),
        });
        assert!(video.auto_vtt_url().is_none());

        video.has_vtt = true;
        assert_eq!(video.auto_vtt_url(), Some("/hls/v1/subs.vtt"));

        video.hls_vtt = Some(VttRef { url: String::new() });
        assert!(video.auto_vtt_url().is_none());
    }

    #[test]
    fn test_video_display() {
        let video = Video::new("v1", "Intro", "/hls/v1/index.m3u8");
        assert_eq!(video.to_string(), "Intro [v1]");
    }
}
