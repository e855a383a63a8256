use crate::error::{Error, Result};
use crate::git::commands::{GitCommand, GitRunner};
use crate::git::query::{CommitSummary, Query, StashEntry};
use crate::git::types::DiffModel;

/// Sections in the order they are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Untracked,
    Unstaged,
    Staged,
    Stashes,
    Recent,
    Branch,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 6] = [
        SectionKind::Untracked,
        SectionKind::Unstaged,
        SectionKind::Staged,
        SectionKind::Stashes,
        SectionKind::Recent,
        SectionKind::Branch,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Untracked => "Untracked files",
            SectionKind::Unstaged => "Unstaged changes",
            SectionKind::Staged => "Staged changes",
            SectionKind::Stashes => "Stashes",
            SectionKind::Recent => "Recent commits",
            SectionKind::Branch => "Branch",
        }
    }

    /// Whether the section is backed by a diff.
    pub fn has_diff(&self) -> bool {
        matches!(
            self,
            SectionKind::Untracked | SectionKind::Unstaged | SectionKind::Staged
        )
    }
}

/// A diff-backed section. A diff that failed to parse leaves the model
/// empty and keeps the reason; other sections are unaffected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSection {
    pub model: DiffModel,
    pub error: Option<String>,
}

impl DiffSection {
    fn from_text(kind: SectionKind, text: &str) -> Self {
        match DiffModel::parse(text) {
            Ok(model) => Self { model, error: None },
            Err(err) => {
                tracing::warn!(section = kind.title(), %err, "diff could not be parsed");
                Self {
                    model: DiffModel::default(),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadInfo {
    /// `None` when detached.
    pub branch: Option<String>,
    /// Abbreviated commit; `None` before the first commit.
    pub commit: Option<String>,
    pub subject: Option<String>,
    pub upstream: Option<String>,
    pub push: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOptions {
    /// Passed to the diff queries as `-U<n>`.
    pub context_lines: Option<u32>,
    pub recent_commits: usize,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            context_lines: None,
            recent_commits: 10,
        }
    }
}

/// Snapshot of the repository. Every refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTree {
    pub head: HeadInfo,
    pub untracked: DiffSection,
    pub unstaged: DiffSection,
    pub staged: DiffSection,
    pub stashes: Vec<StashEntry>,
    pub recent: Vec<CommitSummary>,
}

impl StatusTree {
    /// Run every status query and build a fresh tree.
    pub fn refresh(git: &dyn GitRunner, options: &StatusOptions) -> Result<StatusTree> {
        let query = Query::new(git);
        let head = HeadInfo {
            branch: query.current_branch()?,
            commit: query.head_short()?,
            subject: query.head_subject()?,
            upstream: query.tracking("upstream")?,
            push: query.tracking("push")?,
        };

        let mut untracked = String::new();
        for path in query.untracked_files()? {
            untracked.push_str(&untracked_diff(git, &path, options)?);
        }
        let unstaged = diff_text(git, &[], options)?;
        let staged = diff_text(git, &["--cached"], options)?;

        let tree = StatusTree {
            head,
            untracked: DiffSection::from_text(SectionKind::Untracked, &untracked),
            unstaged: DiffSection::from_text(SectionKind::Unstaged, &unstaged),
            staged: DiffSection::from_text(SectionKind::Staged, &staged),
            stashes: query.stashes()?,
            recent: query.recent_commits(options.recent_commits)?,
        };
        tracing::debug!(
            untracked = tree.untracked.model.files.len(),
            unstaged = tree.unstaged.model.files.len(),
            staged = tree.staged.model.files.len(),
            "status refreshed"
        );
        Ok(tree)
    }

    pub fn section(&self, kind: SectionKind) -> Option<&DiffSection> {
        match kind {
            SectionKind::Untracked => Some(&self.untracked),
            SectionKind::Unstaged => Some(&self.unstaged),
            SectionKind::Staged => Some(&self.staged),
            _ => None,
        }
    }

    /// Number of entries a section header shows.
    pub fn count(&self, kind: SectionKind) -> usize {
        match kind {
            SectionKind::Stashes => self.stashes.len(),
            SectionKind::Recent => self.recent.len(),
            SectionKind::Branch => 1,
            diff => self
                .section(diff)
                .map(|s| s.model.files.len())
                .unwrap_or_default(),
        }
    }
}

fn diff_command(extra: &[&str], options: &StatusOptions) -> GitCommand {
    let mut command = GitCommand::new(["diff", "--no-color", "--no-ext-diff"]);
    if let Some(lines) = options.context_lines {
        command = command.arg(format!("-U{lines}"));
    }
    command.args(extra.iter().copied())
}

fn diff_text(git: &dyn GitRunner, extra: &[&str], options: &StatusOptions) -> Result<String> {
    let command = diff_command(extra, options);
    let output = git.run(&command)?;
    if !output.success() {
        return Err(Error::ExternalCommandFailed {
            command: command.display(),
            exit_code: output.exit_code,
            stderr: output.stderr.trim_end().to_string(),
        });
    }
    Ok(output.stdout)
}

/// An untracked file as a creation patch. `--no-index` exits with 1 when
/// the sides differ, which they always do here.
fn untracked_diff(git: &dyn GitRunner, path: &str, options: &StatusOptions) -> Result<String> {
    let command = diff_command(&["--no-index", "--", "/dev/null", path], options);
    let output = git.run(&command)?;
    let failed = |code| Error::ExternalCommandFailed {
        command: command.display(),
        exit_code: code,
        stderr: output.stderr.trim_end().to_string(),
    };
    match output.exit_code {
        0 | 1 if output.stdout.is_empty() && !output.stderr.trim().is_empty() => {
            Err(failed(output.exit_code))
        }
        0 | 1 => Ok(output.stdout),
        code => Err(failed(code)),
    }
}
