use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use logtint_types::Severity;

use crate::ui::{Layout, Theme};

/// Help overlay showing keybindings and the severity legend
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 50, 28);
        frame.render_widget(Clear, popup_area);

        let mut help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Navigation"),
            Self::key_line("j/↓", "Scroll down"),
            Self::key_line("k/↑", "Scroll up"),
            Self::key_line("Ctrl+d", "Page down"),
            Self::key_line("Ctrl+u", "Page up"),
            Self::key_line("g", "Go to top"),
            Self::key_line("G", "Go to bottom"),
            Line::from(""),
            Self::section("Display"),
            Self::key_line("f", "Toggle follow mode"),
            Self::key_line("s", "Toggle stats bar"),
            Line::from(""),
            Self::section("Actions"),
            Self::key_line("r", "Reconcile now"),
            Self::key_line("e", "Export as HTML"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("q", "Quit"),
            Line::from(""),
            Self::section("Severities"),
        ];

        help_text.extend(Severity::ALL.iter().map(|&severity| {
            Line::from(vec![
                Span::styled(format!("  {:>8}", "▌"), Theme::severity_marker(severity)),
                Span::styled(format!("  {}", severity), Theme::severity_text(severity)),
            ])
        }));

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(" Help ", Theme::title())),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(name: &str) -> Line<'_> {
        Line::from(Span::styled(name, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
