//! Terminal UI components
//!
//! Player panel on the left, catalog on the right, status bar below.

pub mod catalog;
pub mod player;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Draw the whole screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Theme::text()), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(44)])
        .split(rows[0]);

    player::render(frame, columns[0], app);
    catalog::render(frame, columns[1], app);
    render_status_bar(frame, rows[1], app);
}

fn render_status_bar(frame: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" {} videos ", app.catalog.videos().len()),
        Theme::status_bar(),
    )];

    for (key, action) in [("↑↓", "navigate"), ("↵", "play"), ("r", "reload"), ("q", "quit")] {
        spans.push(Span::styled(format!(" {}", key), Theme::keybind()));
        spans.push(Span::styled(format!(":{} ", action), Theme::status_bar()));
    }

    if let Some(title) = &app.now_playing {
        spans.push(Span::styled(format!("│ ▶ {} ", title), Theme::status_bar()));
    }

    let status = Paragraph::new(Line::from(spans)).style(Theme::status_bar());
    frame.render_widget(status, area);
}
