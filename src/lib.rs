//! Core of a popup-driven git porcelain.
//!
//! Two engines sit behind a handful of collaborator traits:
//!
//! - [`popup`] composes command lines from modal popups of switches, options
//!   and config-backed variables, and dispatches the resulting git commands.
//! - [`status`] parses diffs into a [`DiffModel`], turns a selection of
//!   rendered rows into a patch and stages, unstages or discards it.
//!
//! Git itself is reached only through [`GitRunner`], repository config through
//! [`ConfigStore`] and the user through [`Interaction`].

pub mod error;
pub mod git;
pub mod interaction;
pub mod popup;
pub mod status;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use git::{ConfigStore, DiffModel, GitCli, GitConfig, GitRunner};
pub use interaction::Interaction;
