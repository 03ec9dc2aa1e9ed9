use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Screen regions of the log viewer
pub struct Layout;

/// Areas produced by [`Layout::log_viewer`]
pub struct ViewerAreas {
    pub header: Rect,
    pub stats: Option<Rect>,
    pub logs: Rect,
    pub status: Rect,
}

impl Layout {
    /// Header, optional stats bar, log pane and status bar
    pub fn log_viewer(area: Rect, show_stats: bool) -> ViewerAreas {
        let mut constraints = vec![Constraint::Length(3)];
        if show_stats {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        if show_stats {
            ViewerAreas {
                header: chunks[0],
                stats: Some(chunks[1]),
                logs: chunks[2],
                status: chunks[3],
            }
        } else {
            ViewerAreas {
                header: chunks[0],
                stats: None,
                logs: chunks[1],
                status: chunks[2],
            }
        }
    }

    /// Centered popup of at most `width` x `height`
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_bar_takes_three_rows() {
        let area = Rect::new(0, 0, 80, 24);
        let with = Layout::log_viewer(area, true);
        let without = Layout::log_viewer(area, false);

        assert_eq!(with.stats.map(|r| r.height), Some(3));
        assert!(without.stats.is_none());
        assert_eq!(without.logs.height, with.logs.height + 3);
        assert_eq!(with.status.y, 23);
    }

    #[test]
    fn test_popup_is_centered_and_bounded() {
        let popup = Layout::popup(Rect::new(0, 0, 40, 20), 100, 10);
        assert_eq!(popup.width, 36);
        assert_eq!(popup.x, 2);
        assert_eq!(popup.y, 5);
    }
}
