//! Playback controller
//!
//! Owns the media element and at most one streaming engine session for the
//! currently selected video. Every change of the selected playlist URL
//! tears the previous setup down before anything new is created.
//!
//! ```text
//! Idle ──select──▶ Attaching ──play ok──▶ Playing
//!                     │                      │
//!                     └──error──▶ Errored ◀──┘
//! (any state) ──select other──▶ teardown ──▶ Attaching | Idle
//! ```

use thiserror::Error;

use crate::models::Video;
use crate::playback::rewrite::to_proxy_hls_url;
use crate::playback::tracks::{text_tracks, TextTrack};

/// MIME type probed for native HLS support
pub const HLS_MIME: &str = "application/vnd.apple.mpegurl";

/// Counter identifying one setup of the controller
pub type Generation = u64;

/// Handle returned by [`MediaElement::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Media element events the controller subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEventKind {
    Error,
    LoadedMetadata,
}

/// The element that renders video (a browser `<video>`, a player process...)
pub trait MediaElement {
    /// Whether the element plays `mime` without help
    fn can_play_type(&self, mime: &str) -> bool;

    /// Set the media source
    fn set_source(&mut self, url: &str);

    /// Replace the element's subtitle tracks
    fn set_text_tracks(&mut self, tracks: Vec<TextTrack>);

    /// Subscribe to an event; deliveries are tagged with `generation`
    fn add_listener(&mut self, kind: MediaEventKind, generation: Generation) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    /// Try to start playback
    fn play(&mut self) -> Result<(), String>;
}

/// Factory for adaptive-streaming sessions
pub trait StreamingEngine<M: MediaElement> {
    type Session: EngineSession<M>;

    /// Whether the engine can run in this environment
    fn is_supported(&self) -> bool;

    /// Create a session whose events carry `generation`
    fn create(&mut self, generation: Generation) -> Self::Session;
}

/// One adaptive-streaming instance bound to a media element
pub trait EngineSession<M: MediaElement> {
    fn load_source(&mut self, url: &str);

    fn attach_media(&mut self, media: &mut M);

    /// Release everything the session holds
    fn destroy(self);
}

/// Error reported by a streaming engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    /// Error category (e.g. `networkError`)
    pub kind: Option<String>,
    /// Specific code (e.g. `manifestLoadError`)
    pub details: Option<String>,
    /// Fatal errors stop playback
    pub fatal: bool,
}

impl EngineError {
    pub fn fatal(kind: &str, details: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            details: Some(details.to_string()),
            fatal: true,
        }
    }

    /// Most specific description available
    pub fn describe(&self) -> &str {
        self.details
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("unknown")
    }
}

/// Events delivered to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The media element failed (format or network)
    MediaError { generation: Generation },
    /// The element accepted its source
    MetadataLoaded {
        generation: Generation,
        text_tracks: usize,
    },
    /// The element finished or was closed without error
    Ended { generation: Generation },
    /// Error from a streaming engine session
    Engine {
        generation: Generation,
        error: EngineError,
    },
}

impl PlaybackEvent {
    pub fn generation(&self) -> Generation {
        match self {
            PlaybackEvent::MediaError { generation }
            | PlaybackEvent::MetadataLoaded { generation, .. }
            | PlaybackEvent::Ended { generation }
            | PlaybackEvent::Engine { generation, .. } => *generation,
        }
    }
}

/// Errors surfaced next to the player
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("HLS playback is not supported by this player")]
    FormatUnsupported,

    #[error("Video playback error (format or network)")]
    Media,

    #[error("HLS error: {0}")]
    Engine(String),
}

/// Controller state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Attaching,
    Playing,
    Errored(PlaybackError),
}

impl PlaybackState {
    pub fn error(&self) -> Option<&PlaybackError> {
        match self {
            PlaybackState::Errored(e) => Some(e),
            _ => None,
        }
    }
}

/// How the current source is being played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Native,
    Engine,
}

/// Drives one media element for the selected video
pub struct PlaybackController<M: MediaElement, E: StreamingEngine<M>> {
    media: M,
    engine: E,
    state: PlaybackState,
    strategy: Option<Strategy>,
    /// Playlist URL of the current selection, as given by the catalog
    current_url: Option<String>,
    generation: Generation,
    session: Option<E::Session>,
    listeners: Vec<ListenerId>,
}

impl<M: MediaElement, E: StreamingEngine<M>> PlaybackController<M, E> {
    pub fn new(media: M, engine: E) -> Self {
        Self {
            media,
            engine,
            state: PlaybackState::Idle,
            strategy: None,
            current_url: None,
            generation: 0,
            session: None,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Follow a selection change.
    ///
    /// Returns `false` when the playlist URL is unchanged and nothing was
    /// done.
    pub fn select(&mut self, video: Option<&Video>) -> bool {
        let url = video.map(|v| v.hls_url.as_str());
        if url == self.current_url.as_deref() {
            return false;
        }
        self.reset(video);
        true
    }

    /// Tear down and set up again for `video`, even if already selected.
    pub fn restart(&mut self, video: &Video) {
        self.reset(Some(video));
    }

    /// Release the engine session and listeners; back to `Idle`.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.current_url = None;
        self.generation += 1;
        self.state = PlaybackState::Idle;
    }

    fn reset(&mut self, video: Option<&Video>) {
        self.teardown();
        self.generation += 1;
        self.state = PlaybackState::Idle;
        self.current_url = video.map(|v| v.hls_url.clone());

        if let Some(video) = video {
            self.setup(video);
        }
    }

    fn setup(&mut self, video: &Video) {
        self.state = PlaybackState::Attaching;
        let generation = self.generation;
        let source = to_proxy_hls_url(&video.hls_url).into_owned();

        self.media.set_text_tracks(text_tracks(video));
        self.listeners
            .push(self.media.add_listener(MediaEventKind::Error, generation));
        self.listeners
            .push(self.media.add_listener(MediaEventKind::LoadedMetadata, generation));

        if self.media.can_play_type(HLS_MIME) {
            tracing::debug!("Native HLS playback for {}", source);
            self.media.set_source(&source);
            self.strategy = Some(Strategy::Native);
        } else if self.engine.is_supported() {
            tracing::debug!("Engine-assisted playback for {}", source);
            let mut session = self.engine.create(generation);
            session.load_source(&source);
            session.attach_media(&mut self.media);
            self.session = Some(session);
            self.strategy = Some(Strategy::Engine);
        } else {
            tracing::warn!("No HLS playback path for {}", source);
            self.state = PlaybackState::Errored(PlaybackError::FormatUnsupported);
            return;
        }

        match self.media.play() {
            Ok(()) => {
                if self.state == PlaybackState::Attaching {
                    self.state = PlaybackState::Playing;
                }
            }
            Err(e) => tracing::debug!("Playback did not start: {}", e),
        }
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.destroy();
        }
        for id in self.listeners.drain(..) {
            self.media.remove_listener(id);
        }
        self.strategy = None;
    }

    /// Apply an event from the media element or the engine.
    ///
    /// Events from an earlier generation are dropped.
    pub fn handle_event(&mut self, event: PlaybackEvent) {
        if event.generation() != self.generation || self.current_url.is_none() {
            tracing::trace!("Dropping stale event {:?}", event);
            return;
        }

        match event {
            PlaybackEvent::MediaError { .. } => {
                self.state = PlaybackState::Errored(PlaybackError::Media);
            }
            PlaybackEvent::MetadataLoaded { text_tracks, .. } => {
                tracing::debug!("Metadata loaded, {} text tracks", text_tracks);
                if self.state == PlaybackState::Attaching {
                    self.state = PlaybackState::Playing;
                }
            }
            PlaybackEvent::Ended { .. } => {
                if self.state.error().is_none() {
                    self.state = PlaybackState::Idle;
                }
            }
            PlaybackEvent::Engine { error, .. } => {
                if error.fatal {
                    self.state = PlaybackState::Errored(PlaybackError::Engine(
                        error.describe().to_string(),
                    ));
                } else {
                    tracing::debug!("Non-fatal engine error: {}", error.describe());
                }
            }
        }
    }
}

impl<M: MediaElement, E: StreamingEngine<M>> Drop for PlaybackController<M, E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
