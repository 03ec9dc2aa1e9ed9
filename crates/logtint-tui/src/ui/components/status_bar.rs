use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::Theme;

/// Status bar showing keyboard shortcuts, or a message in their place
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    message: Option<&'a str>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            message: None,
            right_text: None,
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Show a message instead of the hints
    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    /// Set text to display on the right side
    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let line = match self.message {
            Some(message) => Line::from(vec![
                Span::styled(message, Theme::status_bar_message()),
                Span::styled("  [Esc] dismiss", Theme::status_bar()),
            ]),
            None => {
                let mut spans = Vec::new();
                for (i, (key, desc)) in self.hints.iter().enumerate() {
                    if i > 0 {
                        spans.push(Span::styled("  ", Theme::status_bar()));
                    }
                    spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
                    spans.push(Span::styled(format!(" {}", desc), Theme::status_bar()));
                }
                Line::from(spans)
            }
        };
        let line_width = line.width() as u16;

        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        if let Some(right) = self.right_text {
            let width = right.chars().count() as u16;
            let right_x = area.x + area.width.saturating_sub(width + 2);
            if right_x > area.x + line_width + 2 {
                buf.set_span(right_x, area.y, &Span::styled(&right, Theme::status_bar()), width);
            }
        }
    }
}

/// Hints shown under the log viewer
pub fn viewer_hints(follow: bool) -> Vec<(&'static str, &'static str)> {
    vec![
        ("j/k", "Scroll"),
        ("f", if follow { "Unfollow" } else { "Follow" }),
        ("r", "Refresh"),
        ("e", "Export"),
        ("?", "Help"),
        ("q", "Quit"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_hints_and_right_text() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new()
            .hints([("q", "Quit")])
            .right("12 lines")
            .render(area, &mut buf);

        let text = row(&buf, 0);
        assert!(text.contains("[q] Quit"));
        assert!(text.trim_end().ends_with("12 lines"));
    }

    #[test]
    fn test_message_replaces_hints() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new()
            .hints([("q", "Quit")])
            .message(Some("Exported 3 lines"))
            .render(area, &mut buf);

        let text = row(&buf, 0);
        assert!(text.contains("Exported 3 lines"));
        assert!(!text.contains("[q]"));
    }
}
