use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use logtint_core::{LogSurface, PassReport, ReconcileStats, Trigger};

use super::Action;

/// Rows a page scroll moves when the viewport height is not known yet
const DEFAULT_PAGE: usize = 20;

/// UI-specific transient state
pub struct UiState {
    /// Is help overlay visible?
    pub help_visible: bool,

    /// Keep the view pinned to the newest line
    pub follow: bool,

    /// Show the severity counts bar?
    pub stats_visible: bool,

    /// Message shown in the status bar (export results, errors)
    pub message: Option<String>,

    /// Rows available for log lines in the last frame
    pub viewport_height: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            help_visible: false,
            follow: true,
            stats_visible: true,
            message: None,
            viewport_height: 0,
        }
    }
}

/// Central application state
pub struct AppState {
    /// Label of the followed source (file path)
    pub source: String,

    pub ui_state: UiState,

    /// Latest reconciler snapshot
    pub stats: ReconcileStats,

    /// What triggered the last pass, and when it was seen
    pub last_trigger: Option<(Trigger, DateTime<Local>)>,

    pub should_quit: bool,

    /// Action sender for dispatching actions
    pub action_tx: mpsc::UnboundedSender<Action>,

    /// Whether a redraw is pending
    pub render_dirty: bool,
}

impl AppState {
    pub fn new(source: impl Into<String>, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            source: source.into(),
            ui_state: UiState::default(),
            stats: ReconcileStats::default(),
            last_trigger: None,
            should_quit: false,
            action_tx,
            render_dirty: true,
        }
    }

    pub fn show_message(&mut self, msg: String) {
        self.ui_state.message = Some(msg);
        self.render_dirty = true;
    }

    pub fn dismiss_message(&mut self) {
        self.ui_state.message = None;
        self.render_dirty = true;
    }

    /// Fold a finished pass into the displayed state
    pub fn record_pass(&mut self, report: &PassReport, stats: ReconcileStats) {
        self.last_trigger = Some((report.trigger, Local::now()));
        self.stats = stats;
        self.render_dirty = true;
    }

    fn page(&self) -> usize {
        if self.ui_state.viewport_height == 0 {
            DEFAULT_PAGE
        } else {
            self.ui_state.viewport_height
        }
    }

    pub fn scroll_up<S: LogSurface + ?Sized>(&mut self, surface: &mut S, n: usize) {
        self.ui_state.follow = false;
        surface.set_scroll_offset(surface.scroll_offset().saturating_sub(n));
        self.render_dirty = true;
    }

    pub fn scroll_down<S: LogSurface + ?Sized>(&mut self, surface: &mut S, n: usize) {
        self.ui_state.follow = false;
        let target = surface.scroll_offset().saturating_add(n);
        surface.set_scroll_offset(target.min(self.max_scroll(surface)));
        self.render_dirty = true;
    }

    pub fn page_up<S: LogSurface + ?Sized>(&mut self, surface: &mut S) {
        let page = self.page();
        self.scroll_up(surface, page);
    }

    pub fn page_down<S: LogSurface + ?Sized>(&mut self, surface: &mut S) {
        let page = self.page();
        self.scroll_down(surface, page);
    }

    pub fn scroll_to_top<S: LogSurface + ?Sized>(&mut self, surface: &mut S) {
        self.ui_state.follow = false;
        surface.set_scroll_offset(0);
        self.render_dirty = true;
    }

    pub fn scroll_to_bottom<S: LogSurface + ?Sized>(&mut self, surface: &mut S) {
        surface.set_scroll_offset(self.max_scroll(surface));
        self.render_dirty = true;
    }

    pub fn toggle_follow<S: LogSurface + ?Sized>(&mut self, surface: &mut S) {
        self.ui_state.follow = !self.ui_state.follow;
        self.sync_scroll(surface);
    }

    /// Pin to the bottom in follow mode and keep the offset in range
    pub fn sync_scroll<S: LogSurface + ?Sized>(&mut self, surface: &mut S) {
        let max = self.max_scroll(surface);
        if self.ui_state.follow || surface.scroll_offset() > max {
            surface.set_scroll_offset(max);
        }
        self.render_dirty = true;
    }

    fn max_scroll<S: LogSurface + ?Sized>(&self, surface: &S) -> usize {
        projection_len(surface).saturating_sub(self.ui_state.viewport_height)
    }
}

/// Units in whatever projection is mounted on the surface
pub fn projection_len<S: LogSurface + ?Sized>(surface: &S) -> usize {
    surface
        .mounted_projection()
        .and_then(|id| surface.projection_len(id))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtint_core::{MemorySurface, Reconciler};

    fn setup(lines: usize, viewport: usize) -> (AppState, MemorySurface) {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = AppState::new("test.log", tx);
        state.ui_state.viewport_height = viewport;

        let text: String = (0..lines).map(|i| format!("line {i}\n")).collect();
        let mut surface = MemorySurface::new(text);
        Reconciler::default().reconcile(Some(&mut surface));
        (state, surface)
    }

    #[test]
    fn test_scroll_disables_follow_and_clamps() {
        let (mut state, mut surface) = setup(30, 10);
        state.scroll_down(&mut surface, 100);
        assert!(!state.ui_state.follow);
        assert_eq!(surface.scroll_offset(), 20);

        state.scroll_up(&mut surface, 5);
        assert_eq!(surface.scroll_offset(), 15);

        state.scroll_to_top(&mut surface);
        assert_eq!(surface.scroll_offset(), 0);
    }

    #[test]
    fn test_page_uses_viewport_height() {
        let (mut state, mut surface) = setup(50, 10);
        state.page_down(&mut surface);
        assert_eq!(surface.scroll_offset(), 10);
        state.page_up(&mut surface);
        assert_eq!(surface.scroll_offset(), 0);
    }

    #[test]
    fn test_follow_pins_to_bottom() {
        let (mut state, mut surface) = setup(30, 10);
        state.sync_scroll(&mut surface);
        assert_eq!(surface.scroll_offset(), 20);

        state.toggle_follow(&mut surface);
        assert!(!state.ui_state.follow);
        state.scroll_to_top(&mut surface);
        state.sync_scroll(&mut surface);
        assert_eq!(surface.scroll_offset(), 0);
    }

    #[test]
    fn test_offset_clamped_after_shrink() {
        let (mut state, mut surface) = setup(30, 10);
        state.ui_state.follow = false;
        surface.set_scroll_offset(20);

        surface.replace_text("a\nb\n");
        Reconciler::default().reconcile(Some(&mut surface));
        state.sync_scroll(&mut surface);
        assert_eq!(surface.scroll_offset(), 0);
    }

    #[test]
    fn test_messages() {
        let (mut state, _) = setup(0, 10);
        state.show_message("exported".to_string());
        assert_eq!(state.ui_state.message.as_deref(), Some("exported"));
        state.dismiss_message();
        assert!(state.ui_state.message.is_none());
    }
}
