//! Subtitle track resolution

use serde::Serialize;

use crate::models::Video;
use crate::playback::rewrite::to_proxy_hls_url;

/// Label of the backend's auto-generated track
pub const AUTO_VTT_LABEL: &str = "VTT";

/// Language of the backend's auto-generated track
pub const AUTO_VTT_LANG: &str = "fr";

/// A subtitle track as handed to the media element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextTrack {
    pub src: String,
    pub label: String,
    pub lang: String,
    pub default: bool,
}

/// Tracks to render for `video`, in order.
///
/// An auto-generated VTT track comes first and is the only default;
/// otherwise the first explicit subtitle is the default.
pub fn text_tracks(video: &Video) -> Vec<TextTrack> {
    let mut tracks = Vec::new();
    let auto = video.auto_vtt_url();

    if let Some(url) = auto {
        tracks.push(TextTrack {
            src: to_proxy_hls_url(url).into_owned(),
            label: AUTO_VTT_LABEL.to_string(),
            lang: AUTO_VTT_LANG.to_string(),
            default: true,
        });
    }

    tracks.extend(
        video
            .subtitle_tracks()
            .iter()
            .enumerate()
            .map(|(i, sub)| TextTrack {
                src: sub.src.clone(),
                label: sub.label.clone(),
                lang: sub.lang.clone(),
                default: i == 0 && auto.is_none(),
            }),
    );

    tracks
}

/// The track marked default, if any
pub fn default_track(tracks: &[TextTrack]) -> Option<&TextTrack> {
    tracks.iter().find(|t| t.default)
}
