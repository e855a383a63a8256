//! Popups: menus of switches, options and config-backed variables that
//! compose a git command line and dispatch it.

pub mod builder;
pub mod catalog;
pub mod dispatch;
pub mod invocation;
pub mod keymap;
pub mod spec;
pub mod state;

pub use builder::build_arguments;
pub use dispatch::{detect_scope, Dispatch, Dispatcher};
pub use invocation::{CommandInvocation, Context, Outcome};
pub use spec::{HostAction, PopupKind, PopupSpec, Scope};
pub use state::{PopupRows, PopupState};
