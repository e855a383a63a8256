use std::collections::HashSet;
use std::path::PathBuf;

use crate::git::types::{DiffLineOrigin, FileDelta};

use super::tree::{SectionKind, StatusTree};

/// What a rendered row points back to. Indices address the tree the rows
/// were built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowTarget {
    Section(SectionKind),
    File {
        section: SectionKind,
        file: usize,
    },
    Hunk {
        section: SectionKind,
        file: usize,
        hunk: usize,
    },
    Line {
        section: SectionKind,
        file: usize,
        hunk: usize,
        line: usize,
    },
    /// Parse failure shown in place of a section's files.
    SectionError(SectionKind),
    Stash(usize),
    Commit(usize),
    Head,
    Upstream,
    Push,
}

impl RowTarget {
    pub fn section(&self) -> SectionKind {
        match *self {
            RowTarget::Section(section)
            | RowTarget::SectionError(section)
            | RowTarget::File { section, .. }
            | RowTarget::Hunk { section, .. }
            | RowTarget::Line { section, .. } => section,
            RowTarget::Stash(_) => SectionKind::Stashes,
            RowTarget::Commit(_) => SectionKind::Recent,
            RowTarget::Head | RowTarget::Upstream | RowTarget::Push => SectionKind::Branch,
        }
    }
}

/// One display row. Column layout is left to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub target: RowTarget,
    pub label: String,
    pub value: String,
    pub hint: Option<String>,
    /// Set on diff body lines.
    pub origin: Option<DiffLineOrigin>,
    /// Added and deleted line counts, on file rows.
    pub stat: Option<(usize, usize)>,
    /// Whether the row's children are hidden. Always false for leaves.
    pub folded: bool,
}

impl StatusRow {
    fn new(target: RowTarget, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target,
            label: label.into(),
            value: value.into(),
            hint: None,
            origin: None,
            stat: None,
            folded: false,
        }
    }
}

/// Fold state, keyed by path and hunk header so that it carries over to
/// the next tree. Sections start expanded, files start collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folds {
    collapsed_sections: HashSet<SectionKind>,
    expanded_files: HashSet<(SectionKind, PathBuf)>,
    collapsed_hunks: HashSet<(SectionKind, PathBuf, String)>,
}

impl Folds {
    pub fn section_open(&self, section: SectionKind) -> bool {
        !self.collapsed_sections.contains(&section)
    }

    pub fn file_open(&self, section: SectionKind, delta: &FileDelta) -> bool {
        self.expanded_files.contains(&(section, delta.path.clone()))
    }

    fn hunk_open(&self, section: SectionKind, delta: &FileDelta, header: &str) -> bool {
        !self
            .collapsed_hunks
            .contains(&(section, delta.path.clone(), header.to_string()))
    }

    /// Flip the fold under `target`. Rows without children are ignored.
    pub fn toggle(&mut self, tree: &StatusTree, target: &RowTarget) {
        match *target {
            RowTarget::Section(section) => flip(&mut self.collapsed_sections, section),
            RowTarget::File { section, file } => {
                if let Some(delta) = delta(tree, section, file) {
                    flip(&mut self.expanded_files, (section, delta.path.clone()));
                }
            }
            RowTarget::Hunk {
                section,
                file,
                hunk,
            } => {
                if let Some(delta) = delta(tree, section, file) {
                    if let Some(hunk) = delta.hunks.get(hunk) {
                        flip(
                            &mut self.collapsed_hunks,
                            (section, delta.path.clone(), hunk.header.clone()),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    /// Open a file and all of its hunks.
    pub fn expand_file(&mut self, section: SectionKind, delta: &FileDelta) {
        self.expanded_files.insert((section, delta.path.clone()));
        self.collapsed_hunks
            .retain(|(s, path, _)| !(*s == section && *path == delta.path));
    }
}

fn flip<T: Eq + std::hash::Hash>(set: &mut HashSet<T>, key: T) {
    if !set.remove(&key) {
        set.insert(key);
    }
}

fn delta(tree: &StatusTree, section: SectionKind, file: usize) -> Option<&FileDelta> {
    tree.section(section)?.model.files.get(file)
}

/// Flatten the tree into display rows. Empty sections are skipped.
pub fn build_rows(tree: &StatusTree, folds: &Folds) -> Vec<StatusRow> {
    let mut rows = Vec::new();
    for section in SectionKind::ORDER {
        if section != SectionKind::Branch && tree.count(section) == 0 && !has_error(tree, section)
        {
            continue;
        }
        let open = folds.section_open(section);
        let mut header = StatusRow::new(
            RowTarget::Section(section),
            section.title(),
            match section {
                SectionKind::Branch => String::new(),
                _ => format!("({})", tree.count(section)),
            },
        );
        header.folded = !open;
        rows.push(header);
        if !open {
            continue;
        }
        match section {
            SectionKind::Stashes => stash_rows(tree, &mut rows),
            SectionKind::Recent => commit_rows(tree, &mut rows),
            SectionKind::Branch => branch_rows(tree, &mut rows),
            diff => diff_rows(tree, diff, folds, &mut rows),
        }
    }
    rows
}

fn has_error(tree: &StatusTree, section: SectionKind) -> bool {
    tree.section(section).is_some_and(|s| s.error.is_some())
}

fn diff_rows(tree: &StatusTree, section: SectionKind, folds: &Folds, rows: &mut Vec<StatusRow>) {
    let Some(diff) = tree.section(section) else {
        return;
    };
    if let Some(error) = &diff.error {
        rows.push(StatusRow::new(
            RowTarget::SectionError(section),
            "error",
            error.clone(),
        ));
        return;
    }

    for (file_idx, delta) in diff.model.files.iter().enumerate() {
        let open = folds.file_open(section, delta);
        let label = if section == SectionKind::Untracked {
            "untracked"
        } else {
            delta.status.label()
        };
        let mut file_row = StatusRow::new(
            RowTarget::File {
                section,
                file: file_idx,
            },
            label,
            delta.display_path(),
        );
        file_row.hint = if delta.binary {
            Some("binary".to_string())
        } else {
            delta.mode_change()
        };
        file_row.stat = Some((delta.additions(), delta.deletions()));
        file_row.folded = !open && !delta.hunks.is_empty();
        rows.push(file_row);
        if !open {
            continue;
        }

        for (hunk_idx, hunk) in delta.hunks.iter().enumerate() {
            let hunk_open = folds.hunk_open(section, delta, &hunk.header);
            let mut hunk_row = StatusRow::new(
                RowTarget::Hunk {
                    section,
                    file: file_idx,
                    hunk: hunk_idx,
                },
                hunk.header.clone(),
                "",
            );
            hunk_row.folded = !hunk_open;
            rows.push(hunk_row);
            if !hunk_open {
                continue;
            }
            for (line_idx, line) in hunk.lines.iter().enumerate() {
                let mut row = StatusRow::new(
                    RowTarget::Line {
                        section,
                        file: file_idx,
                        hunk: hunk_idx,
                        line: line_idx,
                    },
                    line.origin.prefix().to_string(),
                    line.content.clone(),
                );
                row.origin = Some(line.origin);
                if line.no_newline {
                    row.hint = Some("no newline at end of file".to_string());
                }
                rows.push(row);
            }
        }
    }
}

fn stash_rows(tree: &StatusTree, rows: &mut Vec<StatusRow>) {
    for (i, stash) in tree.stashes.iter().enumerate() {
        let mut row = StatusRow::new(RowTarget::Stash(i), stash.name.clone(), stash.message.clone());
        row.hint = stash.time.map(|t| t.format("%Y-%m-%d %H:%M").to_string());
        rows.push(row);
    }
}

fn commit_rows(tree: &StatusTree, rows: &mut Vec<StatusRow>) {
    for (i, commit) in tree.recent.iter().enumerate() {
        let mut row = StatusRow::new(
            RowTarget::Commit(i),
            commit.hash.clone(),
            commit.subject.clone(),
        );
        row.hint = commit.time.map(|t| t.format("%Y-%m-%d").to_string());
        rows.push(row);
    }
}

fn branch_rows(tree: &StatusTree, rows: &mut Vec<StatusRow>) {
    let head = &tree.head;
    let name = head
        .branch
        .clone()
        .unwrap_or_else(|| "(detached)".to_string());
    let value = match (&head.commit, &head.subject) {
        (Some(commit), Some(subject)) => format!("{name} {commit} {subject}"),
        _ => format!("{name} (no commits)"),
    };
    rows.push(StatusRow::new(RowTarget::Head, "Head:", value));
    if let Some(upstream) = &head.upstream {
        rows.push(StatusRow::new(RowTarget::Upstream, "Merge:", upstream.clone()));
    }
    if let Some(push) = head.push.as_ref().filter(|p| Some(*p) != head.upstream.as_ref()) {
        rows.push(StatusRow::new(RowTarget::Push, "Push:", push.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::tree::tests::scripted_repo;
    use crate::status::tree::StatusOptions;

    fn tree() -> StatusTree {
        StatusTree::refresh(&scripted_repo(), &StatusOptions::default()).unwrap()
    }

    fn labels(rows: &[StatusRow]) -> Vec<String> {
        rows.iter()
            .map(|r| format!("{} {}", r.label, r.value).trim_end().to_string())
            .collect()
    }

    #[test]
    fn sections_render_in_fixed_order_with_counts() {
        let rows = build_rows(&tree(), &Folds::default());
        let headers: Vec<_> = rows
            .iter()
            .filter(|r| matches!(r.target, RowTarget::Section(_)))
            .map(|r| format!("{} {}", r.label, r.value).trim_end().to_string())
            .collect();
        assert_eq!(
            headers,
            vec![
                "Untracked files (1)",
                "Unstaged changes (2)",
                "Staged changes (1)",
                "Recent commits (1)",
                "Branch",
            ]
        );
    }

    #[test]
    fn files_start_collapsed() {
        let rows = build_rows(&tree(), &Folds::default());
        assert!(!rows
            .iter()
            .any(|r| matches!(r.target, RowTarget::Hunk { .. })));
        let file = rows
            .iter()
            .find(|r| r.value == "a.txt")
            .unwrap();
        assert_eq!(file.label, "modified");
        assert!(file.folded);
    }

    #[test]
    fn expanded_file_shows_hunks_and_lines() {
        let tree = tree();
        let mut folds = Folds::default();
        folds.toggle(
            &tree,
            &RowTarget::File {
                section: SectionKind::Unstaged,
                file: 0,
            },
        );
        let rows = build_rows(&tree, &folds);
        let start = rows.iter().position(|r| r.value == "a.txt").unwrap();
        assert_eq!(
            labels(&rows[start..start + 6]),
            vec!["modified a.txt", "@@ -1,3 +1,3 @@", "  one", "- two", "+ TWO", "  three"]
        );
        assert_eq!(rows[start + 3].origin, Some(DiffLineOrigin::Deletion));
    }

    #[test]
    fn folds_survive_refresh() {
        let git = scripted_repo();
        let first = StatusTree::refresh(&git, &StatusOptions::default()).unwrap();
        let mut folds = Folds::default();
        folds.toggle(
            &first,
            &RowTarget::File {
                section: SectionKind::Unstaged,
                file: 1,
            },
        );
        folds.toggle(&first, &RowTarget::Section(SectionKind::Recent));
        let second = StatusTree::refresh(&git, &StatusOptions::default()).unwrap();
        let rows = build_rows(&second, &folds);
        assert!(rows.iter().any(|r| r.value == "second"));
        assert!(!rows.iter().any(|r| matches!(r.target, RowTarget::Commit(_))));
    }

    #[test]
    fn collapsed_hunk_hides_its_lines() {
        let tree = tree();
        let mut folds = Folds::default();
        let file = RowTarget::File {
            section: SectionKind::Staged,
            file: 0,
        };
        folds.toggle(&tree, &file);
        folds.toggle(
            &tree,
            &RowTarget::Hunk {
                section: SectionKind::Staged,
                file: 0,
                hunk: 0,
            },
        );
        let rows = build_rows(&tree, &folds);
        let hunk = rows
            .iter()
            .find(|r| matches!(r.target, RowTarget::Hunk { .. }))
            .unwrap();
        assert!(hunk.folded);
        assert!(!rows.iter().any(|r| r.value == "created"));
    }

    #[test]
    fn branch_rows_follow_head() {
        let mut tree = tree();
        tree.head.upstream = Some("origin/master".to_string());
        tree.head.push = Some("origin/master".to_string());
        let rows = build_rows(&tree, &Folds::default());
        let tail = labels(&rows[rows.len() - 2..]);
        assert_eq!(tail, vec!["Head: master abc1234 Initial commit", "Merge: origin/master"]);
    }

    #[test]
    fn section_errors_are_shown_in_place() {
        let mut tree = tree();
        tree.staged.model.files.clear();
        tree.staged.error = Some("malformed diff at line 1: hunk outside of a file section".into());
        let rows = build_rows(&tree, &Folds::default());
        let at = rows
            .iter()
            .position(|r| r.target == RowTarget::Section(SectionKind::Staged))
            .unwrap();
        assert_eq!(rows[at + 1].target, RowTarget::SectionError(SectionKind::Staged));
    }

    #[test]
    fn mode_change_is_a_hint() {
        let mut tree = tree();
        let file = &mut tree.unstaged.model.files[0];
        file.old_mode = Some("100644".into());
        file.new_mode = Some("100755".into());
        let rows = build_rows(&tree, &Folds::default());
        let row = rows.iter().find(|r| r.value == "a.txt").unwrap();
        assert_eq!(row.hint.as_deref(), Some("100644 -> 100755"));
    }
}
