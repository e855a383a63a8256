use porcelain::status::HeadInfo;

use crate::session::PopupView;
use crate::theme::Theme;

use super::{DialogState, OutputState, StatusViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginStyle {
    /// Dates as git printed them.
    #[default]
    Date,
    /// Days since, e.g. `3d`.
    Age,
}

/// The right-hand margin of the status view, driven by the margin popup.
#[derive(Debug, Clone, Copy)]
pub struct MarginState {
    /// Dates on stash and commit rows.
    pub visible: bool,
    pub style: MarginStyle,
    /// Hints on file and line rows (mode changes, binary, missing newline).
    pub details: bool,
    /// `+adds -dels` on file rows.
    pub shortstat: bool,
}

impl Default for MarginState {
    fn default() -> Self {
        Self {
            visible: true,
            style: MarginStyle::Date,
            details: true,
            shortstat: false,
        }
    }
}

impl MarginState {
    pub fn cycle_style(&mut self) {
        self.style = match self.style {
            MarginStyle::Date => MarginStyle::Age,
            MarginStyle::Age => MarginStyle::Date,
        };
    }
}

pub struct AppState {
    pub theme: Theme,
    pub head: HeadInfo,
    pub status: StatusViewState,
    pub popup: Option<PopupView>,
    pub output: Option<OutputState>,
    pub dialog: Option<DialogState>,
    pub margin: MarginState,
    pub status_message: Option<(String, bool)>, // (message, is_error)
    /// A job is in flight.
    pub busy: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            head: HeadInfo::default(),
            status: StatusViewState::default(),
            popup: None,
            output: None,
            dialog: None,
            margin: MarginState::default(),
            status_message: None,
            busy: false,
            should_quit: false,
        }
    }
}
