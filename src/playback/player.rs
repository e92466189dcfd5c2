//! Local Player - VLC/mpv as the media element
//!
//! Plays proxied HLS sources in an external player process. Root-relative
//! sources are resolved against the proxy origin, the same way a browser
//! resolves them against the page.

use bytes::Bytes;
use std::collections::HashMap;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::playback::controller::{
    Generation, ListenerId, MediaElement, MediaEventKind, PlaybackEvent, HLS_MIME,
};
use crate::playback::tracks::{default_track, TextTrack};

/// Source value telling the player to read media from stdin
pub const STDIN_SOURCE: &str = "-";

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerType {
    /// mpv media player (default)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl PlayerType {
    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle - check for it
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }

    /// Parse a config value ("mpv", "vlc")
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mpv" => Some(PlayerType::Mpv),
            "vlc" => Some(PlayerType::Vlc),
            _ => None,
        }
    }

    /// Build the argument list for a source and an optional subtitle URL
    pub fn args(&self, source: &str, subtitle: Option<&str>) -> Vec<String> {
        let mut args = vec![source.to_string()];
        match self {
            PlayerType::Vlc => {
                if let Some(sub) = subtitle {
                    args.push("--sub-file".to_string());
                    args.push(sub.to_string());
                }
                args.push("--no-video-title-show".to_string());
            }
            PlayerType::Mpv => {
                if let Some(sub) = subtitle {
                    args.push(format!("--sub-file={}", sub));
                }
                args.push("--force-window=immediate".to_string());
                args.push("--no-terminal".to_string());
            }
        }
        args
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
    #[error("No source set")]
    NoSource,
    #[error("Invalid source URL: {0}")]
    InvalidSource(String),
}

/// An external player process driven as a media element
pub struct PlayerElement {
    player_type: PlayerType,
    /// Base for resolving root-relative sources (the proxy URL)
    origin: Url,
    /// Whether the player is trusted to fetch HLS itself
    native_hls: bool,
    source: Option<String>,
    tracks: Vec<TextTrack>,
    /// Media bytes fed to stdin when the source is [`STDIN_SOURCE`]
    input: Option<mpsc::Receiver<Bytes>>,
    listeners: HashMap<ListenerId, (MediaEventKind, Generation)>,
    next_listener: u64,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl PlayerElement {
    pub fn new(
        player_type: PlayerType,
        origin: Url,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Self {
        Self {
            player_type,
            origin,
            native_hls: true,
            source: None,
            tracks: Vec::new(),
            input: None,
            listeners: HashMap::new(),
            next_listener: 0,
            events,
            tasks: Vec::new(),
        }
    }

    /// Report no native HLS support so playback goes through the relay
    pub fn without_native_hls(mut self) -> Self {
        self.native_hls = false;
        self
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn tracks(&self) -> &[TextTrack] {
        &self.tracks
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Feed media from `rx` to the player's stdin
    pub fn set_input(&mut self, rx: mpsc::Receiver<Bytes>) {
        self.input = Some(rx);
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        // If it's a full path (macOS app bundle), check if it exists
        if cmd.starts_with('/') {
            return std::path::Path::new(cmd).exists();
        }

        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Resolve a source against the proxy origin
    pub fn resolve(&self, source: &str) -> Result<String, PlayerError> {
        if source == STDIN_SOURCE {
            return Ok(source.to_string());
        }
        self.origin
            .join(source)
            .map(String::from)
            .map_err(|e| PlayerError::InvalidSource(format!("{}: {}", source, e)))
    }

    fn listening(&self, kind: MediaEventKind) -> Option<Generation> {
        self.listeners
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, generation)| *generation)
            .max()
    }

    /// Stop the running player process, if any
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn spawn(&mut self) -> Result<(), PlayerError> {
        let source = self.source.clone().ok_or(PlayerError::NoSource)?;
        let source = self.resolve(&source)?;
        let subtitle = default_track(&self.tracks)
            .map(|t| self.resolve(&t.src))
            .transpose()?;

        self.stop();

        let input = if source == STDIN_SOURCE {
            self.input.take()
        } else {
            None
        };
        let mut cmd = player_command(
            self.player_type.command(),
            &self.player_type.args(&source, subtitle.as_deref()),
            input.is_some(),
        );

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(self.player_type.command().to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })?;
        tracing::info!("Started {} for {}", self.player_type, source);

        if let (Some(mut rx), Some(mut stdin)) = (input, child.stdin.take()) {
            self.tasks.push(tokio::spawn(async move {
                while let Some(chunk) = rx.recv().await {
                    if let Err(e) = stdin.write_all(&chunk).await {
                        tracing::debug!("Player stdin closed: {}", e);
                        break;
                    }
                }
            }));
        }

        if let Some(generation) = self.listening(MediaEventKind::LoadedMetadata) {
            let _ = self.events.send(PlaybackEvent::MetadataLoaded {
                generation,
                text_tracks: self.tracks.len(),
            });
        }

        let error_generation = self.listening(MediaEventKind::Error);
        let ended_generation = error_generation.or(self.listening(MediaEventKind::LoadedMetadata));
        let events = self.events.clone();
        self.tasks.push(tokio::spawn(async move {
            let status = child.wait().await;
            let event = match status {
                Ok(s) if s.success() => ended_generation.map(|generation| PlaybackEvent::Ended { generation }),
                Ok(s) => {
                    tracing::warn!("Player exited with {}", s);
                    error_generation.map(|generation| PlaybackEvent::MediaError { generation })
                }
                Err(e) => {
                    tracing::warn!("Failed to wait for player: {}", e);
                    error_generation.map(|generation| PlaybackEvent::MediaError { generation })
                }
            };
            if let Some(event) = event {
                let _ = events.send(event);
            }
        }));

        Ok(())
    }
}

impl MediaElement for PlayerElement {
    fn can_play_type(&self, mime: &str) -> bool {
        mime != HLS_MIME || self.native_hls
    }

    fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        if url != STDIN_SOURCE {
            self.input = None;
        }
    }

    fn set_text_tracks(&mut self, tracks: Vec<TextTrack>) {
        self.tracks = tracks;
    }

    fn add_listener(&mut self, kind: MediaEventKind, generation: Generation) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, (kind, generation));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
        if self.listeners.is_empty() {
            self.stop();
        }
    }

    fn play(&mut self) -> Result<(), String> {
        self.spawn().map_err(|e| e.to_string())
    }
}

impl Drop for PlayerElement {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Player process that never reads the TUI's terminal.
///
/// Stdin is a pipe when segments are relayed into it, otherwise null.
fn player_command(program: &str, args: &[String], relay_input: bool) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(if relay_input {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element() -> PlayerElement {
        let (tx, _rx) = mpsc::unbounded_channel();
        PlayerElement::new(
            PlayerType::Mpv,
            Url::parse("http://127.0.0.1:3000").unwrap(),
            tx,
        )
    }

    #[test]
    fn test_player_type_command() {
        let vlc_cmd = PlayerType::Vlc.command();
        assert!(vlc_cmd == "vlc" || vlc_cmd == "/Applications/VLC.app/Contents/MacOS/VLC");
        assert_eq!(PlayerType::Mpv.command(), "mpv");
    }

    #[test]
    fn test_player_type_display() {
        assert_eq!(PlayerType::Vlc.to_string(), "VLC");
        assert_eq!(PlayerType::Mpv.to_string(), "mpv");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(PlayerType::from_name("VLC"), Some(PlayerType::Vlc));
        assert_eq!(PlayerType::from_name(" mpv "), Some(PlayerType::Mpv));
        assert_eq!(PlayerType::from_name("quicktime"), None);
    }

    #[test]
    fn test_args() {
        let args = PlayerType::Mpv.args("http://h/api/hls/v1/index.m3u8", Some("http://h/s.vtt"));
        assert_eq!(args[0], "http://h/api/hls/v1/index.m3u8");
        assert!(args.contains(&"--sub-file=http://h/s.vtt".to_string()));
        assert!(args.contains(&"--no-terminal".to_string()));

        let args = PlayerType::Vlc.args("-", None);
        assert_eq!(args, vec!["-", "--no-video-title-show"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_player_without_relay_gets_no_terminal_input() {
        // `cat` ends at once on a null stdin, but would block on a terminal
        let mut child = player_command("cat", &[], false).spawn().unwrap();
        assert!(child.stdin.is_none());
        let status = tokio::time::timeout(std::time::Duration::from_secs(5), child.wait())
            .await
            .unwrap()
            .unwrap();
        assert!(status.success());

        let mut child = player_command("cat", &[], true).spawn().unwrap();
        assert!(child.stdin.is_some());
        drop(child.stdin.take());
        child.wait().await.unwrap();
    }

    #[test]
    fn test_resolve_against_origin() {
        let el = element();
        assert_eq!(
            el.resolve("/api/hls/v1/index.m3u8").unwrap(),
            "http://127.0.0.1:3000/api/hls/v1/index.m3u8"
        );
        assert_eq!(
            el.resolve("https://cdn.example.com/a.m3u8").unwrap(),
            "https://cdn.example.com/a.m3u8"
        );
        assert_eq!(el.resolve(STDIN_SOURCE).unwrap(), "-");
    }

    #[test]
    fn test_native_hls_toggle() {
        let el = element();
        assert!(el.can_play_type(HLS_MIME));
        let el = el.without_native_hls();
        assert!(!el.can_play_type(HLS_MIME));
        assert!(el.can_play_type("video/mp4"));
    }

    #[test]
    fn test_play_without_source_fails() {
        let mut el = element();
        assert_eq!(el.play().unwrap_err(), "No source set");
    }

    #[test]
    fn test_listeners() {
        let mut el = element();
        let a = el.add_listener(MediaEventKind::Error, 1);
        let _b = el.add_listener(MediaEventKind::LoadedMetadata, 1);
        assert_eq!(el.listener_count(), 2);
        assert_eq!(el.listening(MediaEventKind::Error), Some(1));
        el.remove_listener(a);
        assert_eq!(el.listening(MediaEventKind::Error), None);
    }
}
