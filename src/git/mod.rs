pub mod commands;
pub mod config;
pub mod diff;
pub mod patch;
pub mod query;
pub mod repository;
pub mod types;

pub use commands::{CancelHandle, GitCli, GitCommand, GitOutput, GitRunner, GitRunnerExt, HistoryEntry};
pub use config::{ConfigStore, GitConfig};
pub use patch::{apply_patch, build_patch, build_patch_for, ApplyMode, PatchDirection, PatchTarget};
pub use query::Query;
pub use repository::RepoLocation;
pub use types::{DiffLine, DiffLineOrigin, DiffModel, FileDelta, FileStatus, Hunk};
