//! Catalog list
//!
//! Shows loading, error and empty states in place of the list.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::Video;
use crate::ui::Theme;

/// Placeholder shown when a video has no preview image
pub const NO_PREVIEW: &str = "No image";

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" VIDEOS ", Theme::title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(message) = app.catalog.status_message() {
        let style = if app.catalog.is_loading() {
            Theme::loading()
        } else if app.catalog.error().is_some() {
            Theme::error()
        } else {
            Theme::dimmed()
        };
        let para = Paragraph::new(message)
            .style(style)
            .alignment(Alignment::Center);
        frame.render_widget(para, inner);
        return;
    }

    let selected_id = app.catalog.selected().map(|v| v.id.as_str());
    let items: Vec<ListItem> = app
        .catalog
        .videos()
        .iter()
        .enumerate()
        .map(|(i, video)| {
            let under_cursor = i == app.list.selected;
            let is_selected = selected_id == Some(video.id.as_str());
            ListItem::new(entry_lines(video, under_cursor, is_selected))
        })
        .collect();

    frame.render_widget(List::new(items).style(Theme::text()), inner);
}

/// Two lines per entry: title, then id and preview status
fn entry_lines(video: &Video, under_cursor: bool, is_selected: bool) -> Vec<Line<'_>> {
    let marker = match (under_cursor, is_selected) {
        (_, true) => Span::styled("▶ ", Theme::success()),
        (true, false) => Span::styled("▸ ", Theme::accent()),
        _ => Span::raw("  "),
    };
    let title_style = if under_cursor {
        Theme::highlighted()
    } else {
        Theme::text()
    };
    let preview = if video.preview_url.is_some() {
        "preview"
    } else {
        NO_PREVIEW
    };

    vec![
        Line::from(vec![marker, Span::styled(video.title.as_str(), title_style)]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(video.id.as_str(), Theme::dimmed()),
            Span::styled(format!(" · {}", preview), Theme::dimmed()),
        ]),
    ]
}
