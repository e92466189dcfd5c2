//! Local catalog source
//!
//! Builds a catalog from an HLS output directory laid out as
//! `<dir>/<video id>/<playlist>.m3u8`, with optional preview image and
//! VTT file next to the playlist.

use std::path::Path;

use crate::models::{Video, VttRef};

/// File names recognised as a video preview, in priority order
const PREVIEW_NAMES: &[&str] = &["preview.jpg", "preview.png", "thumbnail.jpg"];

/// Playlist names preferred over any other `.m3u8` in a video directory
const PLAYLIST_NAMES: &[&str] = &["index.m3u8", "master.m3u8", "playlist.m3u8"];

/// Scan `dir` for video directories, sorted by id.
pub async fn scan(dir: &Path) -> std::io::Result<Vec<Video>> {
    let mut videos = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let Some(id) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if let Some(video) = scan_video(&entry.path(), &id).await? {
            videos.push(video);
        }
    }

    videos.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::debug!("Local catalog {}: {} videos", dir.display(), videos.len());
    Ok(videos)
}

/// Build a video from one directory, or `None` if it holds no playlist.
async fn scan_video(dir: &Path, id: &str) -> std::io::Result<Option<Video>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                files.push(name.to_string());
            }
        }
    }
    files.sort();

    let playlist = PLAYLIST_NAMES
        .iter()
        .find(|name| files.iter().any(|f| f == *name))
        .map(|name| name.to_string())
        .or_else(|| files.iter().find(|f| f.ends_with(".m3u8")).cloned());

    let Some(playlist) = playlist else {
        return Ok(None);
    };

    let mut video = Video::new(id, id, format!("/hls/{}/{}", id, playlist));

    video.preview_url = PREVIEW_NAMES
        .iter()
        .find(|name| files.iter().any(|f| f == *name))
        .map(|name| format!("/hls/{}/{}", id, name));

    if let Some(vtt) = files.iter().find(|f| f.ends_with(".vtt")) {
        video.has_vtt = true;
        video.hls_vtt = Some(VttRef {
            url: format!("/hls/{}/{}", id, vtt),
        });
    }

    Ok(Some(video))
}
