pub mod app_state;
pub mod dialog_state;
pub mod output_state;
pub mod selection_state;
pub mod status_state;

pub use app_state::{AppState, MarginState, MarginStyle};
pub use dialog_state::DialogState;
pub use output_state::OutputState;
pub use selection_state::SelectionState;
pub use status_state::StatusViewState;
