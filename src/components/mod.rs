pub mod action_hud;
pub mod context_bar;
pub mod dialog;
pub mod output_view;
pub mod popup_view;
pub mod status_view;

use ratatui::{layout::Rect, Frame};

use crate::state::AppState;

/// Trait for renderable TUI components.
pub trait Component {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState);
}
