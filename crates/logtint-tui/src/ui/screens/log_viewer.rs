use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use logtint_core::{LogSurface, MemorySurface};
use logtint_types::{DisplayUnit, Severity};

use crate::app::AppState;
use crate::ui::components::{HelpOverlay, StatusBar, viewer_hints};
use crate::ui::{Layout, Theme};

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, surface: &mut MemorySurface) {
        let areas = Layout::log_viewer(frame.area(), state.ui_state.stats_visible);

        Self::render_header(frame, areas.header, state, surface);
        if let Some(stats_area) = areas.stats {
            Self::render_stats_bar(frame, stats_area, state);
        }
        Self::render_logs(frame, areas.logs, state, surface);
        Self::render_status_bar(frame, areas.status, state, surface);

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, surface: &MemorySurface) {
        let projection = surface
            .mounted_projection()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unmounted".to_string());

        let follow = if state.ui_state.follow {
            Span::styled(
                "● follow",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("○ paused", Theme::text_dim())
        };

        let title = Line::from(vec![
            Span::styled("logtint", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.source.as_str(), Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(projection, Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            follow,
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_stats_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let stats = &state.stats;
        let mut spans = vec![Span::styled(" ", Theme::text())];

        for severity in Severity::ALL {
            spans.push(Span::styled(
                format!("{}:", severity.label()),
                Theme::severity_label(severity),
            ));
            spans.push(Span::styled(
                format!("{} ", stats.counts.get(severity)),
                Theme::text(),
            ));
        }

        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled(
            format!(
                "passes {} skipped {} resets {} failures {}",
                stats.passes, stats.skipped, stats.resets, stats.failures
            ),
            Theme::text_dim(),
        ));

        if let Some((trigger, at)) = &state.last_trigger {
            spans.push(Span::styled(
                format!(" │ last {:?} {}", trigger, at.format("%H:%M:%S")),
                Theme::text_dim(),
            ));
        }

        let widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Stats ", Theme::title())),
        );

        frame.render_widget(widget, area);
    }

    fn render_logs(
        frame: &mut Frame,
        area: Rect,
        state: &mut AppState,
        surface: &mut MemorySurface,
    ) {
        // Account for the border
        let inner_height = area.height.saturating_sub(2) as usize;
        state.ui_state.viewport_height = inner_height;
        state.sync_scroll(surface);

        let units = surface.units();
        let total = units.len();
        let offset = surface.scroll_offset();

        let lines: Vec<Line> = units
            .iter()
            .skip(offset)
            .take(inner_height)
            .map(Self::format_unit)
            .collect();

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(format!(" Logs ({}) ", total), Theme::title())),
        );

        frame.render_widget(logs_widget, area);

        if total > inner_height {
            let max_scroll = total.saturating_sub(inner_height);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(offset.min(max_scroll));

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn format_unit(unit: &DisplayUnit) -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5} ", unit.sequence_index + 1), Theme::text_dim()),
            Span::styled("▌ ", Theme::severity_marker(unit.severity)),
            Span::styled(unit.text.as_str(), Theme::severity_text(unit.severity)),
        ])
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, surface: &MemorySurface) {
        let total = surface.units().len();
        let right = if total == 0 {
            "no lines".to_string()
        } else {
            let first = surface.scroll_offset() + 1;
            let last = (surface.scroll_offset() + state.ui_state.viewport_height).min(total);
            format!("{}-{} of {}", first, last, total)
        };

        let bar = StatusBar::new()
            .hints(viewer_hints(state.ui_state.follow))
            .message(state.ui_state.message.as_deref())
            .right(right);

        frame.render_widget(bar, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtint_core::Reconciler;
    use ratatui::{Terminal, backend::TestBackend};
    use tokio::sync::mpsc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_renders_units_and_counts() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = AppState::new("run.log", tx);
        let mut surface = MemorySurface::new("[SUCCEEDED] step one\n[FAILED] Assertion: two\n");
        let reconciler = Reconciler::default();
        reconciler.reconcile(Some(&mut surface));
        state.stats = reconciler.stats();

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|frame| LogViewerScreen::render(frame, &mut state, &mut surface))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("run.log"));
        assert!(text.contains("Logs (2)"));
        assert!(text.contains("[SUCCEEDED] step one"));
        assert!(text.contains("SUC:1"));
        assert!(text.contains("FLD:1"));
        assert_eq!(state.ui_state.viewport_height, 20 - 3 - 3 - 1 - 2);
    }

    #[test]
    fn test_follow_shows_newest_lines() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = AppState::new("run.log", tx);
        state.ui_state.stats_visible = false;
        let text: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let mut surface = MemorySurface::new(text);
        Reconciler::default().reconcile(Some(&mut surface));

        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal
            .draw(|frame| LogViewerScreen::render(frame, &mut state, &mut surface))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("line 49"));
        assert!(!text.contains("line 0 "));
        assert_eq!(surface.scroll_offset(), 50 - 6);
    }
}
