use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::git::commands::{GitRunner, GitRunnerExt};
use crate::git::patch::{apply_patch, build_patch_for, selects_changes, ApplyMode, PatchTarget};
use crate::git::query::Query;
use crate::git::types::{FileDelta, FileStatus};
use crate::interaction::Interaction;

use super::rows::{build_rows, Folds, RowTarget, StatusRow};
use super::selection::{resolve, Resolved, Selection};
use super::tree::{SectionKind, StatusOptions, StatusTree};

/// Result of a stage, unstage or discard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Something was written and the tree was rebuilt.
    Applied,
    /// The user answered no to the confirmation.
    Declined,
    /// The selection holds nothing the operation could act on.
    Unchanged,
}

/// The status view's model: the current tree, its fold state and the rows
/// rendered from both.
///
/// Every mutation goes through git and is followed by a full refresh. A
/// failed or declined operation leaves the tree as it was.
pub struct Status {
    tree: StatusTree,
    folds: Folds,
    rows: Vec<StatusRow>,
    options: StatusOptions,
}

impl Status {
    pub fn load(git: &dyn GitRunner, options: StatusOptions) -> Result<Self> {
        let tree = StatusTree::refresh(git, &options)?;
        let folds = Folds::default();
        let rows = build_rows(&tree, &folds);
        Ok(Self {
            tree,
            folds,
            rows,
            options,
        })
    }

    pub fn refresh(&mut self, git: &dyn GitRunner) -> Result<()> {
        self.tree = StatusTree::refresh(git, &self.options)?;
        self.rows = build_rows(&self.tree, &self.folds);
        Ok(())
    }

    pub fn tree(&self) -> &StatusTree {
        &self.tree
    }

    pub fn rows(&self) -> &[StatusRow] {
        &self.rows
    }

    pub fn options(&self) -> &StatusOptions {
        &self.options
    }

    /// Open or close the fold under `row`.
    pub fn toggle(&mut self, row: usize) {
        if let Some(target) = self.rows.get(row).map(|r| r.target) {
            self.folds.toggle(&self.tree, &target);
            self.rows = build_rows(&self.tree, &self.folds);
        }
    }

    pub fn folds_mut(&mut self) -> &mut Folds {
        &mut self.folds
    }

    /// Rebuild rows after the fold state was changed through [`Status::folds_mut`].
    pub fn rebuild_rows(&mut self) {
        self.rows = build_rows(&self.tree, &self.folds);
    }

    /// Worktree path and line a row refers to, for "go to file".
    pub fn location(&self, row: usize) -> Option<(PathBuf, Option<u32>)> {
        let (section, file, line) = match self.rows.get(row)?.target {
            RowTarget::File { section, file } => (section, file, None),
            RowTarget::Hunk {
                section,
                file,
                hunk,
            } => {
                let delta = self.delta(section, file).ok()?;
                let start = delta.hunks.get(hunk).map(|h| h.new_start.max(1));
                (section, file, start)
            }
            RowTarget::Line {
                section,
                file,
                hunk,
                line,
            } => {
                let delta = self.delta(section, file).ok()?;
                let line = delta
                    .hunks
                    .get(hunk)
                    .and_then(|h| h.lines.get(line))
                    .and_then(|l| l.new_lineno.or(l.old_lineno));
                (section, file, line)
            }
            _ => return None,
        };
        let delta = self.delta(section, file).ok()?;
        Some((delta.path.clone(), line))
    }

    pub fn stage(&mut self, git: &dyn GitRunner, selection: Selection) -> Result<Change> {
        let change = match resolve(&self.rows, selection)? {
            Resolved::Section(SectionKind::Untracked) => {
                self.run_on_paths(git, &["add", "--"], SectionKind::Untracked)?
            }
            Resolved::Section(SectionKind::Unstaged) => {
                git.git(["add", "--update"])?;
                Change::Applied
            }
            Resolved::File {
                section: section @ (SectionKind::Untracked | SectionKind::Unstaged),
                file,
                target,
            } => {
                let delta = self.delta(section, file)?;
                if target == PatchTarget::WholeFile
                    && (section == SectionKind::Untracked || needs_paths(delta))
                {
                    git.git(path_args(&["add", "--"], delta))?;
                    Change::Applied
                } else {
                    self.apply(git, section, file, target, ApplyMode::StageToIndex)?
                }
            }
            _ => Change::Unchanged,
        };
        self.finish(git, "stage", change)
    }

    pub fn unstage(&mut self, git: &dyn GitRunner, selection: Selection) -> Result<Change> {
        let change = match resolve(&self.rows, selection)? {
            Resolved::Section(SectionKind::Staged) => self.unstage_section(git)?,
            Resolved::File {
                section: SectionKind::Staged,
                file,
                target,
            } => {
                let delta = self.delta(SectionKind::Staged, file)?;
                if target == PatchTarget::WholeFile && needs_paths(delta) {
                    if Query::new(git).has_head()? {
                        git.git(path_args(&["reset", "-q", "--"], delta))?;
                    } else {
                        git.git(path_args(&["rm", "--cached", "-q", "--"], delta))?;
                    }
                    Change::Applied
                } else {
                    self.apply(
                        git,
                        SectionKind::Staged,
                        file,
                        target,
                        ApplyMode::UnstageFromIndex,
                    )?
                }
            }
            _ => Change::Unchanged,
        };
        self.finish(git, "unstage", change)
    }

    /// Throw changes away after the user confirms.
    pub fn discard(
        &mut self,
        git: &dyn GitRunner,
        ui: &mut dyn Interaction,
        selection: Selection,
    ) -> Result<Change> {
        let resolved = resolve(&self.rows, selection)?;
        let Some(prompt) = self.discard_prompt(&resolved)? else {
            return Ok(Change::Unchanged);
        };
        if !ui.confirm(&prompt) {
            tracing::info!(%prompt, "discard declined");
            return Ok(Change::Declined);
        }

        let change = match resolved {
            Resolved::Section(SectionKind::Untracked) => {
                self.run_on_paths(git, &["clean", "--force", "--"], SectionKind::Untracked)?
            }
            Resolved::Section(SectionKind::Unstaged) => {
                self.run_on_paths(git, &["checkout", "--"], SectionKind::Unstaged)?
            }
            Resolved::Section(SectionKind::Staged) => self.discard_staged_section(git)?,
            Resolved::File {
                section,
                file,
                target,
            } => {
                let delta = self.delta(section, file)?;
                match (section, target) {
                    (SectionKind::Untracked, PatchTarget::WholeFile) => {
                        git.git(path_args(&["clean", "--force", "--"], delta))?;
                        Change::Applied
                    }
                    (SectionKind::Unstaged, PatchTarget::WholeFile) if needs_paths(delta) => {
                        git.git(path_args(&["checkout", "--"], delta))?;
                        Change::Applied
                    }
                    (SectionKind::Staged, PatchTarget::WholeFile) if needs_paths(delta) => {
                        discard_staged_paths(git, delta)?;
                        Change::Applied
                    }
                    (SectionKind::Staged, _) => self.apply(
                        git,
                        section,
                        file,
                        target,
                        ApplyMode::DiscardFromIndexAndWorktree,
                    )?,
                    _ => self.apply(git, section, file, target, ApplyMode::DiscardFromWorktree)?,
                }
            }
            _ => Change::Unchanged,
        };
        self.finish(git, "discard", change)
    }

    /// Stop tracking the selected files while keeping them on disk.
    pub fn untrack(&mut self, git: &dyn GitRunner, selection: Selection) -> Result<Change> {
        let change = match resolve(&self.rows, selection)? {
            Resolved::Section(section @ (SectionKind::Unstaged | SectionKind::Staged)) => {
                self.run_on_paths(git, &["rm", "--cached", "-q", "--"], section)?
            }
            Resolved::File {
                section: section @ (SectionKind::Unstaged | SectionKind::Staged),
                file,
                target: PatchTarget::WholeFile,
            } => {
                let delta = self.delta(section, file)?;
                git.git(["rm", "--cached", "-q", "--", path_of(delta).as_str()])?;
                Change::Applied
            }
            _ => Change::Unchanged,
        };
        self.finish(git, "untrack", change)
    }

    /// Stage every change, untracked files included.
    pub fn stage_all(&mut self, git: &dyn GitRunner) -> Result<Change> {
        git.git(["add", "--all"])?;
        self.finish(git, "stage all", Change::Applied)
    }

    /// Stage all changes to tracked files.
    pub fn stage_tracked(&mut self, git: &dyn GitRunner) -> Result<Change> {
        git.git(["add", "--update"])?;
        self.finish(git, "stage tracked", Change::Applied)
    }

    pub fn unstage_all(&mut self, git: &dyn GitRunner) -> Result<Change> {
        let change = self.unstage_section(git)?;
        self.finish(git, "unstage all", change)
    }

    fn finish(&mut self, git: &dyn GitRunner, operation: &str, change: Change) -> Result<Change> {
        if change == Change::Applied {
            tracing::info!(operation, "status changed");
            self.refresh(git)?;
        }
        Ok(change)
    }

    fn delta(&self, section: SectionKind, file: usize) -> Result<&FileDelta> {
        self.tree
            .section(section)
            .and_then(|s| s.model.files.get(file))
            .ok_or(Error::CrossBoundarySelection)
    }

    fn files(&self, section: SectionKind) -> &[FileDelta] {
        self.tree
            .section(section)
            .map(|s| s.model.files.as_slice())
            .unwrap_or_default()
    }

    /// Run `args` followed by every path of `section`.
    fn run_on_paths(&self, git: &dyn GitRunner, args: &[&str], section: SectionKind) -> Result<Change> {
        let files = self.files(section);
        if files.is_empty() {
            return Ok(Change::Unchanged);
        }
        let mut command: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        for delta in files {
            command.extend(paths(delta));
        }
        git.git(command)?;
        Ok(Change::Applied)
    }

    fn unstage_section(&self, git: &dyn GitRunner) -> Result<Change> {
        if self.files(SectionKind::Staged).is_empty() {
            return Ok(Change::Unchanged);
        }
        if Query::new(git).has_head()? {
            git.git(["reset", "-q", "--"])?;
            Ok(Change::Applied)
        } else {
            self.run_on_paths(git, &["rm", "--cached", "-q", "--"], SectionKind::Staged)
        }
    }

    /// Text files are reverse-applied to index and working tree in one patch;
    /// the rest go through path-based commands.
    fn discard_staged_section(&self, git: &dyn GitRunner) -> Result<Change> {
        let section = match self.tree.section(SectionKind::Staged) {
            Some(section) if !section.model.is_empty() => section,
            _ => return Ok(Change::Unchanged),
        };
        let mut patch = String::new();
        for (index, delta) in section.model.files.iter().enumerate() {
            if needs_paths(delta) {
                discard_staged_paths(git, delta)?;
            } else {
                patch.push_str(&build_patch_for(
                    &section.model,
                    index,
                    PatchTarget::WholeFile,
                    ApplyMode::DiscardFromIndexAndWorktree.direction(),
                )?);
            }
        }
        if !patch.is_empty() {
            apply_patch(git, &patch, ApplyMode::DiscardFromIndexAndWorktree)?;
        }
        Ok(Change::Applied)
    }

    fn apply(
        &self,
        git: &dyn GitRunner,
        section: SectionKind,
        file: usize,
        target: PatchTarget,
        mode: ApplyMode,
    ) -> Result<Change> {
        let Some(diff) = self.tree.section(section) else {
            return Ok(Change::Unchanged);
        };
        if !self.has_changes(section, file, target)? {
            return Ok(Change::Unchanged);
        }
        let patch = build_patch_for(&diff.model, file, target, mode.direction())?;
        apply_patch(git, &patch, mode)?;
        Ok(Change::Applied)
    }

    fn has_changes(&self, section: SectionKind, file: usize, target: PatchTarget) -> Result<bool> {
        let delta = self.delta(section, file)?;
        Ok(match target {
            PatchTarget::WholeFile => true,
            PatchTarget::Hunk(hunk) => delta.hunks.get(hunk).is_some_and(|h| h.has_changes()),
            PatchTarget::Lines { hunk, lo, hi } => delta
                .hunks
                .get(hunk)
                .is_some_and(|h| selects_changes(h, lo, hi)),
        })
    }

    /// The confirmation text, or `None` when there is nothing to discard.
    fn discard_prompt(&self, resolved: &Resolved) -> Result<Option<String>> {
        Ok(match *resolved {
            Resolved::Section(section) => {
                let count = self.files(section).len();
                if count == 0 {
                    return Ok(None);
                }
                let files = if count == 1 { "file" } else { "files" };
                Some(match section {
                    SectionKind::Untracked => format!("Discard {count} untracked {files}?"),
                    SectionKind::Unstaged => format!("Discard unstaged changes in {count} {files}?"),
                    _ => format!("Discard staged changes in {count} {files}?"),
                })
            }
            Resolved::File {
                section,
                file,
                target,
            } => {
                if !self.has_changes(section, file, target)? {
                    return Ok(None);
                }
                let path = self.delta(section, file)?.display_path();
                Some(match (section, target) {
                    (SectionKind::Untracked, PatchTarget::WholeFile) => format!("Delete {path}?"),
                    (_, PatchTarget::WholeFile) => format!("Discard changes in {path}?"),
                    (_, PatchTarget::Hunk(_)) => format!("Discard hunk in {path}?"),
                    (_, PatchTarget::Lines { .. }) => format!("Discard selected lines in {path}?"),
                })
            }
            Resolved::Nothing => None,
        })
    }
}

/// Binary files and files without hunks (pure renames, mode-only changes)
/// cannot be expressed as a text patch here.
fn needs_paths(delta: &FileDelta) -> bool {
    delta.binary || delta.hunks.is_empty()
}

fn path_of(delta: &FileDelta) -> String {
    delta.path.display().to_string()
}

/// Paths a command must name to cover the file, old name of a rename included.
fn paths(delta: &FileDelta) -> Vec<String> {
    let mut paths = vec![path_of(delta)];
    if let Some(old) = &delta.old_path {
        paths.push(old.display().to_string());
    }
    paths
}

fn path_args(args: &[&str], delta: &FileDelta) -> Vec<String> {
    args.iter()
        .map(|a| a.to_string())
        .chain(paths(delta))
        .collect()
}

/// Drop a staged file that has no text patch from both index and working tree.
fn discard_staged_paths(git: &dyn GitRunner, delta: &FileDelta) -> Result<()> {
    match (&delta.status, &delta.old_path) {
        (FileStatus::Added, _) => {
            git.git(["rm", "--force", "-q", "--", path_of(delta).as_str()])?;
        }
        (FileStatus::Renamed, Some(old)) => {
            git.git(["rm", "--force", "-q", "--", path_of(delta).as_str()])?;
            git.git(["checkout", "HEAD", "--", old.display().to_string().as_str()])?;
        }
        _ => {
            git.git(["checkout", "HEAD", "--", path_of(delta).as_str()])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::tree::tests::scripted_repo;
    use crate::git::commands::GitOutput;
    use crate::testing::{FakeGit, ScriptedInteraction};

    fn loaded(git: &FakeGit) -> Status {
        let mut status = Status::load(git, StatusOptions::default()).unwrap();
        let tree = status.tree().clone();
        for section in [SectionKind::Untracked, SectionKind::Unstaged, SectionKind::Staged] {
            for delta in &tree.section(section).unwrap().model.files {
                status.folds_mut().expand_file(section, delta);
            }
        }
        status.rebuild_rows();
        status
    }

    fn row(status: &Status, target: RowTarget) -> usize {
        status
            .rows()
            .iter()
            .position(|r| r.target == target)
            .unwrap()
    }

    fn refreshes(git: &FakeGit) -> usize {
        git.calls_to("ls-files").len()
    }

    fn line(section: SectionKind, file: usize, line: usize) -> RowTarget {
        RowTarget::Line {
            section,
            file,
            hunk: 0,
            line,
        }
    }

    #[test]
    fn staging_one_addition_sends_a_narrowed_patch() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(&status, line(SectionKind::Unstaged, 0, 2));

        let change = status.stage(&git, Selection::row(at)).unwrap();

        assert_eq!(change, Change::Applied);
        let apply = &git.calls_to("apply")[0];
        assert_eq!(apply.display(), "apply --cached --whitespace=nowarn");
        let patch = apply.stdin.as_deref().unwrap();
        assert!(patch.contains("@@ -1,3 +1,4 @@\n one\n two\n+TWO\n three\n"));
        assert_eq!(refreshes(&git), 2);
    }

    #[test]
    fn context_only_selection_is_a_no_op() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(&status, line(SectionKind::Unstaged, 0, 0));

        assert_eq!(status.stage(&git, Selection::row(at)).unwrap(), Change::Unchanged);
        assert!(git.calls_to("apply").is_empty());
        assert_eq!(refreshes(&git), 1);
    }

    #[test]
    fn untracked_section_is_staged_by_path() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(&status, RowTarget::Section(SectionKind::Untracked));
        status.stage(&git, Selection::row(at)).unwrap();
        assert!(git.called_with("add -- new.txt"));
    }

    #[test]
    fn unstaging_a_staged_line_reverses_it() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(&status, line(SectionKind::Staged, 0, 0));
        status.unstage(&git, Selection::row(at)).unwrap();
        let apply = &git.calls_to("apply")[0];
        assert_eq!(apply.display(), "apply --reverse --cached --whitespace=nowarn");
    }

    #[test]
    fn unstaging_the_section_without_head_removes_from_index() {
        let git = scripted_repo();
        git.replace(
            ["rev-parse", "--verify", "--quiet", "HEAD"],
            GitOutput {
                exit_code: 1,
                ..Default::default()
            },
        );
        let mut status = loaded(&git);
        let at = row(&status, RowTarget::Section(SectionKind::Staged));
        status.unstage(&git, Selection::row(at)).unwrap();
        assert!(git.called_with("rm --cached -q -- c.txt"));
        assert!(git.calls_to("reset").is_empty());
    }

    #[test]
    fn unstaging_the_section_with_head_resets() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        status.unstage_all(&git).unwrap();
        assert!(git.called_with("reset -q --"));
    }

    #[test]
    fn declined_discard_touches_nothing() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let before = status.tree().clone();
        let at = row(&status, RowTarget::Section(SectionKind::Untracked));
        let mut ui = ScriptedInteraction::new().confirming(false);

        let change = status.discard(&git, &mut ui, Selection::row(at)).unwrap();

        assert_eq!(change, Change::Declined);
        assert_eq!(ui.prompts, vec!["Discard 1 untracked file?"]);
        assert!(git.calls_to("clean").is_empty());
        assert_eq!(status.tree(), &before);
    }

    #[test]
    fn confirmed_section_discard_cleans_untracked_files() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(&status, RowTarget::Section(SectionKind::Untracked));
        let mut ui = ScriptedInteraction::new().confirming(true);
        status.discard(&git, &mut ui, Selection::row(at)).unwrap();
        assert!(git.called_with("clean --force -- new.txt"));
    }

    #[test]
    fn discarding_a_staged_hunk_touches_index_and_worktree() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(
            &status,
            RowTarget::Hunk {
                section: SectionKind::Staged,
                file: 0,
                hunk: 0,
            },
        );
        let mut ui = ScriptedInteraction::new().confirming(true);
        status.discard(&git, &mut ui, Selection::row(at)).unwrap();
        assert_eq!(ui.prompts, vec!["Discard hunk in c.txt?"]);
        assert_eq!(
            git.calls_to("apply")[0].display(),
            "apply --reverse --index --whitespace=nowarn"
        );
    }

    #[test]
    fn discarding_context_does_not_ask() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(&status, line(SectionKind::Unstaged, 0, 3));
        let mut ui = ScriptedInteraction::new();
        let change = status.discard(&git, &mut ui, Selection::row(at)).unwrap();
        assert_eq!(change, Change::Unchanged);
        assert!(ui.prompts.is_empty());
    }

    #[test]
    fn rejected_patch_skips_refresh() {
        let git = scripted_repo();
        git.respond_exit(
            ["apply", "--cached", "--whitespace=nowarn"],
            1,
            "error: patch failed: a.txt:1\n",
        );
        let mut status = loaded(&git);
        let at = row(&status, line(SectionKind::Unstaged, 0, 1));

        let err = status.stage(&git, Selection::row(at)).unwrap_err();

        assert!(matches!(err, Error::PatchApplyFailed { ref stderr } if stderr == "error: patch failed: a.txt:1"));
        assert_eq!(refreshes(&git), 1);
    }

    #[test]
    fn binary_files_are_staged_by_path() {
        let git = scripted_repo();
        git.replace(
            ["diff", "--no-color", "--no-ext-diff"],
            GitOutput {
                stdout: "diff --git a/logo.png b/logo.png\n\
                         index 1111111..2222222 100644\n\
                         Binary files a/logo.png and b/logo.png differ\n"
                    .to_string(),
                ..Default::default()
            },
        );
        let mut status = loaded(&git);
        let at = row(
            &status,
            RowTarget::File {
                section: SectionKind::Unstaged,
                file: 0,
            },
        );
        status.stage(&git, Selection::row(at)).unwrap();
        assert!(git.called_with("add -- logo.png"));
        assert!(git.calls_to("apply").is_empty());
    }

    #[test]
    fn cross_file_selection_fails_before_any_command() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let lo = row(&status, line(SectionKind::Unstaged, 0, 1));
        let hi = row(&status, line(SectionKind::Unstaged, 1, 1));
        let err = status.stage(&git, Selection::range(lo, hi)).unwrap_err();
        assert!(matches!(err, Error::CrossBoundarySelection));
        assert!(git.calls_to("apply").is_empty());
    }

    #[test]
    fn untracking_a_file_keeps_it_on_disk() {
        let git = scripted_repo();
        let mut status = loaded(&git);
        let at = row(
            &status,
            RowTarget::File {
                section: SectionKind::Unstaged,
                file: 1,
            },
        );
        status.untrack(&git, Selection::row(at)).unwrap();
        assert!(git.called_with("rm --cached -q -- b.txt"));
    }

    #[test]
    fn toggle_reveals_a_file() {
        let git = scripted_repo();
        let mut status = Status::load(&git, StatusOptions::default()).unwrap();
        let before = status.rows().len();
        let at = row(
            &status,
            RowTarget::File {
                section: SectionKind::Staged,
                file: 0,
            },
        );
        status.toggle(at);
        assert_eq!(status.rows().len(), before + 2);
    }

    #[test]
    fn location_points_at_the_changed_line() {
        let git = scripted_repo();
        let status = loaded(&git);
        let at = row(&status, line(SectionKind::Unstaged, 0, 2));
        assert_eq!(status.location(at), Some(("a.txt".into(), Some(2))));

        let header = row(&status, RowTarget::Section(SectionKind::Unstaged));
        assert_eq!(status.location(header), None);
    }
}
