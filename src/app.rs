//! App state and core application logic
//!
//! `CatalogState` is the immutable record behind the catalog view: it only
//! changes through a finished fetch or an explicit selection. `App` adds
//! the TUI cursor and the playback panel on top of it.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::{CatalogClient, CatalogError};
use crate::models::Video;
use crate::playback::PlaybackState;

// =============================================================================
// Loading State
// =============================================================================

/// Loading state for async operations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    /// Idle - no loading in progress
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    /// Error with message
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }
}

// =============================================================================
// Catalog State
// =============================================================================

pub const LOADING_MESSAGE: &str = "Loading videos...";
pub const EMPTY_MESSAGE: &str = "No videos found";

/// Videos, selection and load status
///
/// The selection is an index into `videos`, so it can only ever point at
/// an entry of the last successful fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogState {
    videos: Vec<Video>,
    selected: Option<usize>,
    loading: LoadingState,
}

impl CatalogState {
    /// State while the initial fetch is in flight
    pub fn loading() -> Self {
        Self {
            videos: Vec::new(),
            selected: None,
            loading: LoadingState::Loading(Some(LOADING_MESSAGE.to_string())),
        }
    }

    /// Apply the outcome of a fetch
    pub fn finish(self, result: Result<Vec<Video>, CatalogError>) -> Self {
        match result {
            Ok(videos) => self.loaded(videos),
            Err(e) => self.failed(e.to_string()),
        }
    }

    /// Successful fetch: keep the list, select its first entry
    pub fn loaded(self, videos: Vec<Video>) -> Self {
        let selected = if videos.is_empty() { None } else { Some(0) };
        Self {
            videos,
            selected,
            loading: LoadingState::Idle,
        }
    }

    /// Failed fetch: clear list and selection, keep the message
    pub fn failed(self, message: impl Into<String>) -> Self {
        Self {
            videos: Vec::new(),
            selected: None,
            loading: LoadingState::Error(message.into()),
        }
    }

    /// Select the entry with `id`; unknown ids leave the state as is
    pub fn select(self, id: &str) -> Self {
        match self.videos.iter().position(|v| v.id == id) {
            Some(index) => Self {
                selected: Some(index),
                ..self
            },
            None => self,
        }
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn selected(&self) -> Option<&Video> {
        self.selected.and_then(|i| self.videos.get(i))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.loading {
            LoadingState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Page-level message: loading, error, or empty catalog
    pub fn status_message(&self) -> Option<&str> {
        match &self.loading {
            LoadingState::Loading(msg) => Some(msg.as_deref().unwrap_or(LOADING_MESSAGE)),
            LoadingState::Error(msg) => Some(msg),
            LoadingState::Idle if self.videos.is_empty() => Some(EMPTY_MESSAGE),
            LoadingState::Idle => None,
        }
    }

    /// Fetch the catalog once
    pub async fn load(client: &CatalogClient) -> Self {
        let result = client.videos().await;
        match &result {
            Ok(videos) => tracing::info!("Loaded {} videos", videos.len()),
            Err(e) => tracing::warn!("Catalog load failed: {}", e),
        }
        Self::loading().finish(result)
    }
}

// =============================================================================
// Selection State (cursor)
// =============================================================================

/// Cursor state for list views
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Currently highlighted index
    pub selected: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    /// Move selection up
    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    /// Move selection down
    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    /// Jump to first item
    pub fn first(&mut self) {
        self.selected = 0;
    }

    /// Jump to last item
    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update length (e.g., when new results come in)
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// App
// =============================================================================

/// What the event loop must do after a key press
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    None,
    /// The selection changed (or was re-confirmed) to this video
    Play(Video),
    /// Fetch the catalog again
    Reload,
    Quit,
}

/// Main application state for the TUI
#[derive(Debug, Default)]
pub struct App {
    pub running: bool,
    pub catalog: CatalogState,
    pub list: ListState,
    /// Last known controller state, for the player panel
    pub playback: PlaybackState,
    /// Title of the video handed to the controller
    pub now_playing: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            running: true,
            catalog: CatalogState::loading(),
            ..Default::default()
        }
    }

    /// Replace the catalog; the cursor follows the selection
    pub fn set_catalog(&mut self, catalog: CatalogState) {
        self.list.set_len(catalog.videos().len());
        if let Some(index) = catalog.selected_index() {
            self.list.selected = index;
        }
        self.catalog = catalog;
    }

    /// Select the video under the cursor
    pub fn select_under_cursor(&mut self) -> AppAction {
        let Some(id) = self
            .catalog
            .videos()
            .get(self.list.selected)
            .map(|v| v.id.clone())
        else {
            return AppAction::None;
        };
        let catalog = std::mem::take(&mut self.catalog);
        self.catalog = catalog.select(&id);
        match self.catalog.selected() {
            Some(video) => AppAction::Play(video.clone()),
            None => AppAction::None,
        }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return AppAction::Quit;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                AppAction::Quit
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.list.up();
                AppAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list.down();
                AppAction::None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.list.first();
                AppAction::None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.list.last();
                AppAction::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.select_under_cursor(),
            KeyCode::Char('r') if !self.catalog.is_loading() => {
                self.catalog = CatalogState::loading();
                self.list.set_len(0);
                AppAction::Reload
            }
            _ => AppAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_state() {
        assert!(LoadingState::Loading(None).is_loading());
        assert!(!LoadingState::Error("boom".into()).is_loading());
        assert!(!LoadingState::Idle.is_loading());
    }

    #[test]
    fn test_list_state_bounds() {
        let mut list = ListState {
            selected: 0,
            len: 2,
        };
        list.up();
        assert_eq!(list.selected, 0);
        list.down();
        list.down();
        assert_eq!(list.selected, 1);
        list.set_len(0);
        assert_eq!(list.selected, 0);
    }
}
