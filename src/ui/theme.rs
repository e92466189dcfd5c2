//! Color palette and style helpers for the TUI

use ratatui::style::{Color, Modifier, Style};

/// Palette shared by every view
pub struct Theme;

impl Theme {
    /// Background: #101418
    pub const BACKGROUND: Color = Color::Rgb(0x10, 0x14, 0x18);

    /// Primary: #4fc3f7 (light blue)
    pub const PRIMARY: Color = Color::Rgb(0x4f, 0xc3, 0xf7);

    /// Accent: #ffd54f (amber)
    pub const ACCENT: Color = Color::Rgb(0xff, 0xd5, 0x4f);

    /// Text: #e6e6e6
    pub const TEXT: Color = Color::Rgb(0xe6, 0xe6, 0xe6);

    /// Dim: #5c6670
    pub const DIM: Color = Color::Rgb(0x5c, 0x66, 0x70);

    /// Success: #81c784
    pub const SUCCESS: Color = Color::Rgb(0x81, 0xc7, 0x84);

    /// Error: #ef5350
    pub const ERROR: Color = Color::Rgb(0xef, 0x53, 0x50);

    /// Border color (muted blue)
    pub const BORDER: Color = Color::Rgb(0x2c, 0x4a, 0x5c);

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND)
    }

    /// Selected list entry
    pub fn highlighted() -> Style {
        Style::default()
            .fg(Self::BACKGROUND)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR).add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    pub fn keybind() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn loading() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BORDER)
    }
}
