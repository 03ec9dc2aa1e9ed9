use ratatui::style::{Color, Modifier, Style};

use logtint_types::Severity;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // Severity styles
    /// Gutter marker in the severity accent
    pub fn severity_marker(severity: Severity) -> Style {
        Style::default().fg(severity.color())
    }

    /// Line body; errors are bold like their markup counterpart
    pub fn severity_text(severity: Severity) -> Style {
        let style = match severity {
            Severity::Info => Style::default().fg(Self::FG),
            other => Style::default().fg(other.color()),
        };
        if severity.is_emphasized() {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    pub fn severity_label(severity: Severity) -> Style {
        Style::default()
            .fg(severity.color())
            .add_modifier(Modifier::BOLD)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_message() -> Style {
        Style::default()
            .fg(Self::FG)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }
}
