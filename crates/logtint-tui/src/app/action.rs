/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // UI toggles
    ToggleHelp,
    ToggleFollow,
    ToggleStats,

    // Log viewer navigation
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,

    // Reconciliation
    Refresh,
    ExportHtml,

    // Status message
    ShowMessage(String),
    DismissMessage,

    // Tick (for periodic updates)
    Tick,

    // Render request
    Render,
}
