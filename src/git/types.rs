use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Added => "new file",
            FileStatus::Deleted => "deleted",
            FileStatus::Modified => "modified",
            FileStatus::Renamed => "renamed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineOrigin {
    Context,
    Addition,
    Deletion,
}

impl DiffLineOrigin {
    pub fn prefix(&self) -> char {
        match self {
            DiffLineOrigin::Context => ' ',
            DiffLineOrigin::Addition => '+',
            DiffLineOrigin::Deletion => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub origin: DiffLineOrigin,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
    /// Line text without the origin prefix or trailing newline.
    pub content: String,
    /// Followed by `\ No newline at end of file`.
    pub no_newline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// The full `@@ ... @@ heading` line.
    pub header: String,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    pub fn count(&self, origin: DiffLineOrigin) -> u32 {
        self.lines.iter().filter(|l| l.origin == origin).count() as u32
    }

    /// Context plus deletions matches the old range, context plus additions the new one.
    pub fn is_consistent(&self) -> bool {
        let context = self.count(DiffLineOrigin::Context);
        context + self.count(DiffLineOrigin::Deletion) == self.old_lines
            && context + self.count(DiffLineOrigin::Addition) == self.new_lines
    }

    pub fn has_changes(&self) -> bool {
        self.lines
            .iter()
            .any(|l| l.origin != DiffLineOrigin::Context)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDelta {
    pub path: PathBuf,
    pub old_path: Option<PathBuf>,
    pub status: FileStatus,
    pub old_mode: Option<String>,
    pub new_mode: Option<String>,
    /// Header lines from `diff --git` up to the first hunk, verbatim.
    pub header: Vec<String>,
    pub hunks: Vec<Hunk>,
    pub binary: bool,
}

impl FileDelta {
    pub fn additions(&self) -> usize {
        self.hunks
            .iter()
            .map(|h| h.count(DiffLineOrigin::Addition) as usize)
            .sum()
    }

    pub fn deletions(&self) -> usize {
        self.hunks
            .iter()
            .map(|h| h.count(DiffLineOrigin::Deletion) as usize)
            .sum()
    }

    /// Mode change summary such as `100644 -> 100755`, for modified files only.
    pub fn mode_change(&self) -> Option<String> {
        match (&self.old_mode, &self.new_mode) {
            (Some(old), Some(new)) if old != new => Some(format!("{old} -> {new}")),
            _ => None,
        }
    }

    pub fn display_path(&self) -> String {
        match &self.old_path {
            Some(old) => format!("{} -> {}", old.display(), self.path.display()),
            None => self.path.display().to_string(),
        }
    }
}

/// A parsed unified diff. Rebuilt on every refresh, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffModel {
    pub files: Vec<FileDelta>,
}

impl DiffModel {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file(&self, path: &std::path::Path) -> Option<&FileDelta> {
        self.files.iter().find(|f| f.path == path)
    }
}
