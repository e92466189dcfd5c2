//! Playback
//!
//! - rewrite: route media URLs through the proxy
//! - tracks: subtitle track selection
//! - controller: selection-driven lifecycle of the player and engine
//! - player: mpv/VLC process as the media element
//! - relay: in-process HLS segment relay as the streaming engine

pub mod controller;
pub mod player;
pub mod relay;
pub mod rewrite;
pub mod tracks;

pub use controller::{
    EngineError, EngineSession, MediaElement, PlaybackController, PlaybackError, PlaybackEvent,
    PlaybackState, StreamingEngine, Strategy,
};
pub use player::{PlayerElement, PlayerError, PlayerType};
pub use relay::SegmentRelay;
pub use rewrite::to_proxy_hls_url;
pub use tracks::{text_tracks, TextTrack};

/// Controller wired to a local player and the segment relay
pub type LocalController = PlaybackController<PlayerElement, SegmentRelay>;
