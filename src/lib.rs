//! hlsdeck - video catalog browser with HLS playback
//!
//! # Modules
//!
//! - `models` - catalog entries and subtitle descriptors
//! - `config` - config file and URL resolution
//! - `proxy` - HTTP proxy in front of the video backend
//! - `api` - catalog client
//! - `playback` - URL rewrite, subtitle priority, playback controller
//! - `app` - catalog state and TUI navigation
//! - `cli` / `commands` - scriptable command surface
//! - `ui` - TUI components

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod playback;
pub mod proxy;
pub mod ui;

// Re-export commonly used types
pub use api::{CatalogClient, CatalogError};
pub use app::{App, CatalogState};
pub use config::Config;
pub use models::{SubtitleTrack, Video, VttRef};
pub use playback::{
    to_proxy_hls_url, text_tracks, PlaybackController, PlaybackError, PlaybackState, TextTrack,
};
pub use proxy::{router, ProxyError, ProxyState};
