use porcelain::popup::{HostAction, PopupKind};

/// Central action enum: every key press is mapped to one of these before it
/// touches state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Kill the git command of the running job.
    CancelJob,

    // Status view
    CursorUp,
    CursorDown,
    CursorTop,
    CursorBottom,
    PageUp,
    PageDown,
    EnterVisualMode,
    ExitVisualMode,
    OpenPopup(PopupKind),
    /// A help-popup action fired straight from the status view.
    Shortcut(String),
    Host(HostAction),

    // Popup overlay
    PopupKey(String),

    // Output viewer
    OutputUp,
    OutputDown,
    OutputPageUp,
    OutputPageDown,
    CloseOutput,

    // Prompt dialogs
    DialogYes,
    DialogNo,
    DialogChar(char),
    DialogBackspace,
    DialogUp,
    DialogDown,
    DialogSubmit,
    DialogCancel,
}
