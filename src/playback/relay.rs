//! HLS segment relay
//!
//! The streaming engine used when the player cannot fetch HLS on its own:
//! the session loads the playlist, follows a master playlist to its
//! highest-bandwidth variant and pushes every media segment, in order,
//! into the player's stdin, preceded by its fMP4 initialization section
//! when the playlist declares one. Live playlists are re-polled every target
//! duration until `#EXT-X-ENDLIST` appears.

use bytes::Bytes;
use m3u8_rs::{Key, MediaPlaylist, Playlist};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::playback::controller::{
    EngineError, EngineSession, Generation, MediaElement, PlaybackEvent, StreamingEngine,
};
use crate::playback::player::{PlayerElement, STDIN_SOURCE};

/// Segments buffered ahead of the player
pub const RELAY_BUFFER: usize = 4;

const NETWORK_ERROR: &str = "networkError";

/// Engine creating one relay task per session
pub struct SegmentRelay {
    client: reqwest::Client,
    origin: Url,
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

impl SegmentRelay {
    /// `origin` resolves root-relative sources (the proxy URL)
    pub fn new(origin: Url, events: mpsc::UnboundedSender<PlaybackEvent>) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin,
            events,
        }
    }
}

impl StreamingEngine<PlayerElement> for SegmentRelay {
    type Session = RelaySession;

    fn is_supported(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    fn create(&mut self, generation: Generation) -> RelaySession {
        RelaySession {
            client: self.client.clone(),
            origin: self.origin.clone(),
            events: self.events.clone(),
            generation,
            source: None,
            task: None,
        }
    }
}

/// A relay bound to one source and one player
pub struct RelaySession {
    client: reqwest::Client,
    origin: Url,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    generation: Generation,
    source: Option<Url>,
    task: Option<JoinHandle<()>>,
}

impl RelaySession {
    fn report(&self, error: EngineError) {
        tracing::warn!("Relay error: {}", error.describe());
        let _ = self.events.send(PlaybackEvent::Engine {
            generation: self.generation,
            error,
        });
    }
}

impl EngineSession<PlayerElement> for RelaySession {
    fn load_source(&mut self, url: &str) {
        match self.origin.join(url) {
            Ok(source) => self.source = Some(source),
            Err(e) => {
                tracing::debug!("Unusable source {}: {}", url, e);
                self.report(EngineError::fatal(NETWORK_ERROR, "manifestLoadError"));
            }
        }
    }

    fn attach_media(&mut self, media: &mut PlayerElement) {
        let (tx, rx) = mpsc::channel(RELAY_BUFFER);
        media.set_source(STDIN_SOURCE);
        media.set_input(rx);

        let Some(source) = self.source.clone() else {
            return;
        };
        let client = self.client.clone();
        let events = self.events.clone();
        let generation = self.generation;

        self.task = Some(tokio::spawn(async move {
            if let Err(error) = relay(&client, source, tx).await {
                tracing::warn!("Relay stopped: {}", error.describe());
                let _ = events.send(PlaybackEvent::Engine { generation, error });
            }
        }));
    }

    fn destroy(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Forward all segments of `source` into `tx`.
///
/// An `#EXT-X-MAP` initialization section is sent ahead of the first
/// segment it applies to, and again whenever it changes. Encrypted
/// segments are not forwarded.
///
/// Returns early without error when the receiving player goes away.
async fn relay(
    client: &reqwest::Client,
    source: Url,
    tx: mpsc::Sender<Bytes>,
) -> Result<(), EngineError> {
    let (playlist_url, mut playlist) = load_media_playlist(client, source).await?;
    let mut next_sequence = playlist.media_sequence;
    let mut current_map: Option<(Url, Option<String>)> = None;
    let mut range_end: Option<(Url, u64)> = None;
    let mut encrypted = false;

    loop {
        for (i, segment) in playlist.segments.iter().enumerate() {
            // A key applies to every segment after it until the next key
            if let Some(key) = &segment.key {
                encrypted = is_encrypted(key);
            }
            let sequence = playlist.media_sequence + i as u64;
            if sequence < next_sequence {
                continue;
            }
            if encrypted {
                return Err(EngineError::fatal(NETWORK_ERROR, "keyLoadError"));
            }

            if let Some(map) = &segment.map {
                let url = playlist_url
                    .join(&map.uri)
                    .map_err(|_| EngineError::fatal(NETWORK_ERROR, "fragLoadError"))?;
                let range = map
                    .byte_range
                    .as_ref()
                    .map(|r| range_header(r.offset.unwrap_or(0), r.length));
                let init = (url, range);
                if current_map.as_ref() != Some(&init) {
                    let data = fetch(client, &init.0, init.1.as_deref())
                        .await
                        .map_err(|_| EngineError::fatal(NETWORK_ERROR, "fragLoadError"))?;
                    if tx.send(data).await.is_err() {
                        return Ok(());
                    }
                    current_map = Some(init);
                }
            }

            let url = playlist_url
                .join(&segment.uri)
                .map_err(|_| EngineError::fatal(NETWORK_ERROR, "fragLoadError"))?;
            let range = match &segment.byte_range {
                Some(r) => {
                    // Without an offset the range continues the previous one
                    let start = r.offset.unwrap_or(match &range_end {
                        Some((prev, end)) if *prev == url => *end,
                        _ => 0,
                    });
                    range_end = Some((url.clone(), start + r.length));
                    Some(range_header(start, r.length))
                }
                None => None,
            };
            let data = fetch(client, &url, range.as_deref())
                .await
                .map_err(|_| EngineError::fatal(NETWORK_ERROR, "fragLoadError"))?;
            if tx.send(data).await.is_err() {
                return Ok(());
            }
            next_sequence = sequence + 1;
        }

        if playlist.end_list {
            return Ok(());
        }

        tokio::time::sleep(poll_interval(&playlist)).await;
        let data = fetch(client, &playlist_url, None)
            .await
            .map_err(|_| EngineError::fatal(NETWORK_ERROR, "levelLoadError"))?;
        playlist = m3u8_rs::parse_media_playlist_res(&data)
            .map_err(|_| EngineError::fatal(NETWORK_ERROR, "levelLoadError"))?;
    }
}

/// Any method other than `NONE` means the payload is ciphertext
fn is_encrypted(key: &Key) -> bool {
    key.method.to_string() != "NONE"
}

/// HTTP `Range` value for `length` bytes starting at `start`
fn range_header(start: u64, length: u64) -> String {
    format!("bytes={}-{}", start, start + length.saturating_sub(1))
}

/// Load `source`, following a master playlist to its best variant.
pub async fn load_media_playlist(
    client: &reqwest::Client,
    source: Url,
) -> Result<(Url, MediaPlaylist), EngineError> {
    let data = fetch(client, &source, None)
        .await
        .map_err(|_| EngineError::fatal(NETWORK_ERROR, "manifestLoadError"))?;

    match m3u8_rs::parse_playlist_res(&data) {
        Ok(Playlist::MediaPlaylist(playlist)) => Ok((source, playlist)),
        Ok(Playlist::MasterPlaylist(master)) => {
            let variant = master
                .variants
                .iter()
                .filter(|v| !v.is_i_frame)
                .max_by_key(|v| v.bandwidth)
                .ok_or_else(|| EngineError::fatal(NETWORK_ERROR, "manifestParsingError"))?;
            let level_url = source
                .join(&variant.uri)
                .map_err(|_| EngineError::fatal(NETWORK_ERROR, "levelLoadError"))?;
            tracing::debug!("Selected variant {} ({} bps)", level_url, variant.bandwidth);

            let data = fetch(client, &level_url, None)
                .await
                .map_err(|_| EngineError::fatal(NETWORK_ERROR, "levelLoadError"))?;
            let playlist = m3u8_rs::parse_media_playlist_res(&data)
                .map_err(|_| EngineError::fatal(NETWORK_ERROR, "levelLoadError"))?;
            Ok((level_url, playlist))
        }
        Err(_) => Err(EngineError::fatal(NETWORK_ERROR, "manifestParsingError")),
    }
}

/// Wait between live playlist reloads
fn poll_interval(playlist: &MediaPlaylist) -> Duration {
    let secs = playlist.target_duration as f64;
    Duration::from_secs_f64(secs.clamp(1.0, 30.0))
}

async fn fetch(
    client: &reqwest::Client,
    url: &Url,
    range: Option<&str>,
) -> Result<Bytes, reqwest::Error> {
    let mut request = client.get(url.clone());
    if let Some(range) = range {
        request = request.header(reqwest::header::RANGE, range);
    }
    request
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::player::PlayerType;
    use mockito::Server;

    const MEDIA: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:4\n\
                         #EXT-X-MEDIA-SEQUENCE:0\n#EXTINF:4.0,\nseg0.ts\n\
                         #EXTINF:4.0,\nseg1.ts\n#EXT-X-ENDLIST\n";

    const MASTER: &str = "#EXTM3U\n\
                          #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\nlow/index.m3u8\n\
                          #EXT-X-STREAM-INF:BANDWIDTH=2400000,RESOLUTION=1280x720\nhigh/index.m3u8\n";

    #[tokio::test]
    async fn test_master_playlist_picks_highest_bandwidth() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/hls/v1/master.m3u8")
            .with_body(MASTER)
            .create_async()
            .await;
        let high = server
            .mock("GET", "/api/hls/v1/high/index.m3u8")
            .with_body(MEDIA)
            .create_async()
            .await;

        let source = Url::parse(&format!("{}/api/hls/v1/master.m3u8", server.url())).unwrap();
        let (url, playlist) = load_media_playlist(&reqwest::Client::new(), source)
            .await
            .unwrap();

        high.assert_async().await;
        assert!(url.path().ends_with("/high/index.m3u8"));
        assert_eq!(playlist.segments.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_manifest() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/hls/v9/index.m3u8")
            .with_status(404)
            .create_async()
            .await;

        let source = Url::parse(&format!("{}/api/hls/v9/index.m3u8", server.url())).unwrap();
        let err = load_media_playlist(&reqwest::Client::new(), source)
            .await
            .unwrap_err();

        assert!(err.fatal);
        assert_eq!(err.describe(), "manifestLoadError");
    }

    #[tokio::test]
    async fn test_relay_forwards_segments_in_order() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/hls/v1/index.m3u8")
            .with_body(MEDIA)
            .create_async()
            .await;
        server
            .mock("GET", "/api/hls/v1/seg0.ts")
            .with_body("first")
            .create_async()
            .await;
        server
            .mock("GET", "/api/hls/v1/seg1.ts")
            .with_body("second")
            .create_async()
            .await;

        let source = Url::parse(&format!("{}/api/hls/v1/index.m3u8", server.url())).unwrap();
        let (tx, mut rx) = mpsc::channel(RELAY_BUFFER);
        relay(&reqwest::Client::new(), source, tx).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Bytes::from("first"));
        assert_eq!(rx.recv().await.unwrap(), Bytes::from("second"));
        assert!(rx.recv().await.is_none());
    }

    async fn drain(mut rx: mpsc::Receiver<Bytes>) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_relay_sends_init_section_once() {
        let mut server = Server::new_async().await;
        let playlist = "#EXTM3U\n#EXT-X-VERSION:7\n#EXT-X-TARGETDURATION:4\n\
                        #EXT-X-KEY:METHOD=NONE\n#EXT-X-MAP:URI=\"init.mp4\"\n\
                        #EXTINF:4.0,\nseg0.m4s\n#EXTINF:4.0,\nseg1.m4s\n#EXT-X-ENDLIST\n";
        server
            .mock("GET", "/api/hls/v1/index.m3u8")
            .with_body(playlist)
            .create_async()
            .await;
        let init = server
            .mock("GET", "/api/hls/v1/init.mp4")
            .with_body("INIT")
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/api/hls/v1/seg0.m4s")
            .with_body("SEG0")
            .create_async()
            .await;
        server
            .mock("GET", "/api/hls/v1/seg1.m4s")
            .with_body("SEG1")
            .create_async()
            .await;

        let source = Url::parse(&format!("{}/api/hls/v1/index.m3u8", server.url())).unwrap();
        let (tx, rx) = mpsc::channel(RELAY_BUFFER);
        relay(&reqwest::Client::new(), source, tx).await.unwrap();

        init.assert_async().await;
        assert_eq!(
            drain(rx).await,
            vec![
                Bytes::from("INIT"),
                Bytes::from("SEG0"),
                Bytes::from("SEG1")
            ]
        );
    }

    #[tokio::test]
    async fn test_relay_byte_ranges() {
        let mut server = Server::new_async().await;
        let playlist = "#EXTM3U\n#EXT-X-VERSION:7\n#EXT-X-TARGETDURATION:4\n\
                        #EXT-X-MAP:URI=\"main.mp4\",BYTERANGE=\"720@0\"\n\
                        #EXTINF:4.0,\n#EXT-X-BYTERANGE:1000@720\nmain.mp4\n\
                        #EXTINF:4.0,\n#EXT-X-BYTERANGE:500\nmain.mp4\n#EXT-X-ENDLIST\n";
        server
            .mock("GET", "/api/hls/v1/index.m3u8")
            .with_body(playlist)
            .create_async()
            .await;
        for (range, body) in [
            ("bytes=0-719", "INIT"),
            ("bytes=720-1719", "PART0"),
            ("bytes=1720-2219", "PART1"),
        ] {
            server
                .mock("GET", "/api/hls/v1/main.mp4")
                .match_header("range", range)
                .with_status(206)
                .with_body(body)
                .create_async()
                .await;
        }

        let source = Url::parse(&format!("{}/api/hls/v1/index.m3u8", server.url())).unwrap();
        let (tx, rx) = mpsc::channel(RELAY_BUFFER);
        relay(&reqwest::Client::new(), source, tx).await.unwrap();

        assert_eq!(
            drain(rx).await,
            vec![
                Bytes::from("INIT"),
                Bytes::from("PART0"),
                Bytes::from("PART1")
            ]
        );
    }

    #[tokio::test]
    async fn test_encrypted_segments_are_not_forwarded() {
        let mut server = Server::new_async().await;
        let playlist = "#EXTM3U\n#EXT-X-TARGETDURATION:4\n\
                        #EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\"\n\
                        #EXTINF:4.0,\nseg0.ts\n#EXT-X-ENDLIST\n";
        server
            .mock("GET", "/api/hls/v1/index.m3u8")
            .with_body(playlist)
            .create_async()
            .await;
        let segment = server
            .mock("GET", "/api/hls/v1/seg0.ts")
            .expect(0)
            .create_async()
            .await;

        let source = Url::parse(&format!("{}/api/hls/v1/index.m3u8", server.url())).unwrap();
        let (tx, rx) = mpsc::channel(RELAY_BUFFER);
        let err = relay(&reqwest::Client::new(), source, tx)
            .await
            .unwrap_err();

        segment.assert_async().await;
        assert!(err.fatal);
        assert_eq!(err.describe(), "keyLoadError");
        assert!(drain(rx).await.is_empty());
    }

    #[test]
    fn test_range_header() {
        assert_eq!(range_header(0, 720), "bytes=0-719");
        assert_eq!(range_header(720, 1), "bytes=720-720");
    }

    #[tokio::test]
    async fn test_attach_switches_player_to_stdin() {
        let origin = Url::parse("http://127.0.0.1:1").unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = SegmentRelay::new(origin.clone(), tx.clone());
        let mut player = PlayerElement::new(PlayerType::Mpv, origin, tx);

        assert!(engine.is_supported());
        let mut session = engine.create(1);
        session.load_source("/api/hls/v1/index.m3u8");
        session.attach_media(&mut player);

        assert_eq!(player.source(), Some(STDIN_SOURCE));
        assert!(player.can_play_type("video/mp2t"));
        session.destroy();
    }

    #[test]
    fn test_engine_needs_runtime() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = SegmentRelay::new(Url::parse("http://127.0.0.1:1").unwrap(), tx);
        assert!(!engine.is_supported());
    }
}
