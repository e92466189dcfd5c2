//! Player panel
//!
//! Shows what the controller is doing for the selected video and any
//! playback error inline.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::playback::{text_tracks, to_proxy_hls_url, PlaybackState};
use crate::ui::Theme;

/// Placeholder when nothing is selected after a successful load
pub const NOTHING_SELECTED: &str = "No video available";

/// Short label for a controller state
pub fn state_label(state: &PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "stopped",
        PlaybackState::Attaching => "starting",
        PlaybackState::Playing => "playing",
        PlaybackState::Errored(_) => "error",
    }
}

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let focused = matches!(app.playback, PlaybackState::Playing);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        })
        .title(Span::styled(" PLAYER ", Theme::title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Page-level errors and loading are shown in the catalog pane
    if app.catalog.is_loading() || app.catalog.error().is_some() {
        return;
    }

    let Some(video) = app.catalog.selected() else {
        let para = Paragraph::new(NOTHING_SELECTED)
            .style(Theme::dimmed())
            .alignment(Alignment::Center);
        frame.render_widget(para, inner);
        return;
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(video.title.as_str(), Theme::title())),
        Line::from(Span::styled(video.id.as_str(), Theme::dimmed())),
        Line::from(""),
        Line::from(vec![
            Span::styled("source   ", Theme::dimmed()),
            Span::styled(to_proxy_hls_url(&video.hls_url).into_owned(), Theme::text()),
        ]),
    ];

    for track in text_tracks(video) {
        let marker = if track.default { " (default)" } else { "" };
        lines.push(Line::from(vec![
            Span::styled("subtitle ", Theme::dimmed()),
            Span::styled(
                format!("{} [{}]{}", track.label, track.lang, marker),
                Theme::text(),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("status   ", Theme::dimmed()),
        Span::styled(
            state_label(&app.playback),
            match app.playback {
                PlaybackState::Playing => Theme::success(),
                PlaybackState::Errored(_) => Theme::error(),
                _ => Theme::loading(),
            },
        ),
    ]));

    if let Some(error) = app.playback.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.to_string(), Theme::error())));
    }

    let para = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(para, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackError;

    #[test]
    fn test_state_label() {
        assert_eq!(state_label(&PlaybackState::Idle), "stopped");
        assert_eq!(
            state_label(&PlaybackState::Errored(PlaybackError::Media)),
            "error"
        );
    }
}
