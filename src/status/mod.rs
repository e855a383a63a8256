//! The status view: a snapshot of the repository split into sections, and
//! stage/unstage/discard at file, hunk and line granularity.

pub mod ops;
pub mod rows;
pub mod selection;
pub mod tree;

pub use ops::{Change, Status};
pub use rows::{build_rows, Folds, RowTarget, StatusRow};
pub use selection::{resolve, Resolved, Selection};
pub use tree::{DiffSection, HeadInfo, SectionKind, StatusOptions, StatusTree};
