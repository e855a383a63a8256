use super::commands::{GitCommand, GitRunner};
use super::types::*;
use crate::error::{Error, Result};

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// What part of a file a patch covers. Line indices are inclusive and
/// index into `Hunk::lines`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchTarget {
    WholeFile,
    Hunk(usize),
    Lines { hunk: usize, lo: usize, hi: usize },
}

/// How the patch will be applied. A reverse patch keeps the new side of the
/// hunk intact instead of the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchDirection {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Index only, working tree untouched.
    StageToIndex,
    /// Reverse, index only.
    UnstageFromIndex,
    /// Reverse, working tree only.
    DiscardFromWorktree,
    /// Reverse, index and working tree together.
    DiscardFromIndexAndWorktree,
}

impl ApplyMode {
    pub fn direction(&self) -> PatchDirection {
        match self {
            ApplyMode::StageToIndex => PatchDirection::Forward,
            _ => PatchDirection::Reverse,
        }
    }

    fn args(&self) -> &'static [&'static str] {
        match self {
            ApplyMode::StageToIndex => &["apply", "--cached", "--whitespace=nowarn"],
            ApplyMode::UnstageFromIndex => {
                &["apply", "--reverse", "--cached", "--whitespace=nowarn"]
            }
            ApplyMode::DiscardFromWorktree => &["apply", "--reverse", "--whitespace=nowarn"],
            ApplyMode::DiscardFromIndexAndWorktree => {
                &["apply", "--reverse", "--index", "--whitespace=nowarn"]
            }
        }
    }
}

/// Build a patch for forward application.
pub fn build_patch(model: &DiffModel, file_index: usize, target: PatchTarget) -> Result<String> {
    build_patch_for(model, file_index, target, PatchDirection::Forward)
}

/// Build a patch for `file_index`.
///
/// Whole files and whole hunks reuse the parsed text verbatim. A line range
/// synthesizes a new hunk: lines outside the range that exist only on the
/// side being changed are dropped, the others become context, and the ranges
/// are recounted.
pub fn build_patch_for(
    model: &DiffModel,
    file_index: usize,
    target: PatchTarget,
    direction: PatchDirection,
) -> Result<String> {
    let file = model
        .files
        .get(file_index)
        .ok_or(Error::CrossBoundarySelection)?;

    let mut out = String::new();
    match target {
        PatchTarget::WholeFile => {
            push_header(&mut out, &file.header);
            for hunk in &file.hunks {
                push_hunk(&mut out, hunk);
            }
        }
        PatchTarget::Hunk(index) => {
            let hunk = file.hunks.get(index).ok_or(Error::CrossBoundarySelection)?;
            push_header(&mut out, &file.header);
            push_hunk(&mut out, hunk);
        }
        PatchTarget::Lines { hunk, lo, hi } => {
            let source = file.hunks.get(hunk).ok_or(Error::CrossBoundarySelection)?;
            if lo > hi || hi >= source.lines.len() {
                return Err(Error::CrossBoundarySelection);
            }
            let (synthesized, partial) = narrow_hunk(source, lo, hi, direction);
            if partial {
                push_header(&mut out, &partial_header(file, direction));
            } else {
                push_header(&mut out, &file.header);
            }
            push_hunk(&mut out, &synthesized);
        }
    }
    Ok(out)
}

/// True when the inclusive range covers at least one added or deleted line.
pub fn selects_changes(hunk: &Hunk, lo: usize, hi: usize) -> bool {
    hunk.lines
        .iter()
        .enumerate()
        .any(|(i, l)| i >= lo && i <= hi && l.origin != DiffLineOrigin::Context)
}

fn narrow_hunk(hunk: &Hunk, lo: usize, hi: usize, direction: PatchDirection) -> (Hunk, bool) {
    // The origin that exists only on the side being changed is dropped when
    // unselected; the other one is demoted to context.
    let (dropped, demoted) = match direction {
        PatchDirection::Forward => (DiffLineOrigin::Addition, DiffLineOrigin::Deletion),
        PatchDirection::Reverse => (DiffLineOrigin::Deletion, DiffLineOrigin::Addition),
    };

    let mut partial = false;
    let mut lines = Vec::with_capacity(hunk.lines.len());
    for (i, line) in hunk.lines.iter().enumerate() {
        let selected = i >= lo && i <= hi;
        if selected || line.origin == DiffLineOrigin::Context {
            lines.push(line.clone());
        } else if line.origin == dropped {
            partial = true;
        } else if line.origin == demoted {
            partial = true;
            lines.push(DiffLine {
                origin: DiffLineOrigin::Context,
                ..line.clone()
            });
        }
    }

    let context = lines
        .iter()
        .filter(|l| l.origin == DiffLineOrigin::Context)
        .count() as u32;
    let old_lines = context
        + lines
            .iter()
            .filter(|l| l.origin == DiffLineOrigin::Deletion)
            .count() as u32;
    let new_lines = context
        + lines
            .iter()
            .filter(|l| l.origin == DiffLineOrigin::Addition)
            .count() as u32;
    let old_start = adjust_start(hunk.old_start, hunk.old_lines, old_lines);
    let new_start = adjust_start(hunk.new_start, hunk.new_lines, new_lines);

    let header = format!(
        "@@ -{} +{} @@{}",
        format_range(old_start, old_lines),
        format_range(new_start, new_lines),
        hunk_heading(&hunk.header)
    );
    (
        Hunk {
            header,
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines,
        },
        partial,
    )
}

/// An empty range starts at the line before it, as in git's own hunks.
/// Non-empty ranges keep the source hunk's start.
fn adjust_start(start: u32, original_len: u32, len: u32) -> u32 {
    match (original_len, len) {
        (0, l) if l > 0 && start == 0 => 1,
        (o, 0) if o > 0 => start.saturating_sub(1),
        _ => start,
    }
}

fn format_range(start: u32, len: u32) -> String {
    if len == 1 {
        start.to_string()
    } else {
        format!("{start},{len}")
    }
}

/// Text after the closing `@@`, including its leading space.
fn hunk_heading(header: &str) -> &str {
    header
        .strip_prefix("@@ ")
        .and_then(|rest| rest.find(" @@").map(|end| &rest[end + 3..]))
        .unwrap_or("")
}

/// A partial patch of a created file applied in reverse, or of a deleted
/// file applied forward, must not delete or create the whole file. The
/// header is rewritten into a plain modification.
fn partial_header(file: &FileDelta, direction: PatchDirection) -> Vec<String> {
    let rewrite = matches!(
        (file.status, direction),
        (FileStatus::Added, PatchDirection::Reverse) | (FileStatus::Deleted, PatchDirection::Forward)
    );
    if !rewrite {
        return file.header.clone();
    }
    let path = file.path.display().to_string();
    file.header
        .iter()
        .filter_map(|line| {
            if line.starts_with("new file mode ")
                || line.starts_with("deleted file mode ")
                || line.starts_with("index ")
            {
                None
            } else if line == "--- /dev/null" {
                Some(format!("--- a/{path}"))
            } else if line == "+++ /dev/null" {
                Some(format!("+++ b/{path}"))
            } else {
                Some(line.clone())
            }
        })
        .collect()
}

fn push_header(out: &mut String, header: &[String]) {
    for line in header {
        out.push_str(line);
        out.push('\n');
    }
}

fn push_hunk(out: &mut String, hunk: &Hunk) {
    out.push_str(&hunk.header);
    out.push('\n');
    for line in &hunk.lines {
        out.push(line.origin.prefix());
        out.push_str(&line.content);
        out.push('\n');
        if line.no_newline {
            out.push_str(NO_NEWLINE_MARKER);
            out.push('\n');
        }
    }
}

/// Feed a patch to `git apply` on stdin. A rejected patch leaves both the
/// index and the working tree as they were.
pub fn apply_patch<R: GitRunner + ?Sized>(runner: &R, patch: &str, mode: ApplyMode) -> Result<()> {
    let command = GitCommand::new(mode.args().iter().copied()).stdin(patch);
    let output = runner.run(&command)?;
    if output.success() {
        tracing::info!(?mode, "patch applied");
        Ok(())
    } else {
        tracing::warn!(?mode, stderr = %output.stderr.trim_end(), "patch rejected");
        Err(Error::PatchApplyFailed {
            stderr: output.stderr.trim_end().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::diff::parse;
    use crate::testing::FakeGit;
    use proptest::prelude::*;

    const TWO_HUNKS: &str = "\
diff --git a/notes.txt b/notes.txt
index 3b18e51..a4c2f0d 100644
--- a/notes.txt
+++ b/notes.txt
@@ -1,4 +1,5 @@ heading
 one
-two
+TWO
+two and a half
 three
 four
@@ -20,3 +21,3 @@
 twenty
-twenty-one
+21
 twenty-two
";

    const NEW_FILE: &str = "\
diff --git a/new.txt b/new.txt
new file mode 100644
index 0000000..3b18e51
--- /dev/null
+++ b/new.txt
@@ -0,0 +1,3 @@
+a
+b
+c
";

    #[test]
    fn whole_file_is_verbatim() {
        let model = parse(TWO_HUNKS).unwrap();
        assert_eq!(build_patch(&model, 0, PatchTarget::WholeFile).unwrap(), TWO_HUNKS);
    }

    #[test]
    fn single_hunk_keeps_file_header() {
        let model = parse(TWO_HUNKS).unwrap();
        let patch = build_patch(&model, 0, PatchTarget::Hunk(1)).unwrap();
        assert_eq!(
            patch,
            "\
diff --git a/notes.txt b/notes.txt
index 3b18e51..a4c2f0d 100644
--- a/notes.txt
+++ b/notes.txt
@@ -20,3 +21,3 @@
 twenty
-twenty-one
+21
 twenty-two
"
        );
    }

    #[test]
    fn single_added_line_forward() {
        let model = parse(TWO_HUNKS).unwrap();
        // Line 3 is "+two and a half"; the deletion becomes context, "+TWO" is dropped.
        let patch = build_patch(
            &model,
            0,
            PatchTarget::Lines {
                hunk: 0,
                lo: 3,
                hi: 3,
            },
        )
        .unwrap();
        assert!(patch.ends_with(
            "\
@@ -1,4 +1,5 @@ heading
 one
 two
+two and a half
 three
 four
"
        ));
    }

    #[test]
    fn single_deleted_line_reverse() {
        let model = parse(TWO_HUNKS).unwrap();
        let patch = build_patch_for(
            &model,
            0,
            PatchTarget::Lines {
                hunk: 0,
                lo: 1,
                hi: 1,
            },
            PatchDirection::Reverse,
        )
        .unwrap();
        assert!(patch.ends_with(
            "\
@@ -1,6 +1,5 @@ heading
 one
-two
 TWO
 two and a half
 three
 four
"
        ));
    }

    #[test]
    fn emptied_side_starts_at_the_line_before() {
        let model = parse(
            "\
diff --git a/list.txt b/list.txt
index 1111111..2222222 100644
--- a/list.txt
+++ b/list.txt
@@ -5 +5 @@
-five
+FIVE
",
        )
        .unwrap();

        let deletion = PatchTarget::Lines { hunk: 0, lo: 0, hi: 0 };
        let forward = build_patch(&model, 0, deletion).unwrap();
        assert!(forward.ends_with("@@ -5 +4,0 @@\n-five\n"), "{forward}");

        let addition = PatchTarget::Lines { hunk: 0, lo: 1, hi: 1 };
        let reverse = build_patch_for(&model, 0, addition, PatchDirection::Reverse).unwrap();
        assert!(reverse.ends_with("@@ -4,0 +5 @@\n+FIVE\n"), "{reverse}");

        let both = PatchTarget::Lines { hunk: 0, lo: 0, hi: 1 };
        let unchanged = build_patch(&model, 0, both).unwrap();
        assert!(unchanged.ends_with("@@ -5 +5 @@\n-five\n+FIVE\n"), "{unchanged}");
    }

    #[test]
    fn partial_reverse_of_new_file_is_a_modification() {
        let model = parse(NEW_FILE).unwrap();
        let patch = build_patch_for(
            &model,
            0,
            PatchTarget::Lines {
                hunk: 0,
                lo: 1,
                hi: 1,
            },
            PatchDirection::Reverse,
        )
        .unwrap();
        assert_eq!(
            patch,
            "\
diff --git a/new.txt b/new.txt
--- a/new.txt
+++ b/new.txt
@@ -1,2 +1,3 @@
 a
+b
 c
"
        );
    }

    #[test]
    fn full_selection_of_new_file_keeps_creation_header() {
        let model = parse(NEW_FILE).unwrap();
        let patch = build_patch_for(
            &model,
            0,
            PatchTarget::Lines {
                hunk: 0,
                lo: 0,
                hi: 2,
            },
            PatchDirection::Reverse,
        )
        .unwrap();
        assert_eq!(patch, NEW_FILE);
    }

    #[test]
    fn out_of_range_lines_cross_boundary() {
        let model = parse(TWO_HUNKS).unwrap();
        let err = build_patch(
            &model,
            0,
            PatchTarget::Lines {
                hunk: 0,
                lo: 2,
                hi: 40,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::CrossBoundarySelection));
    }

    #[test]
    fn context_only_selection_selects_nothing() {
        let model = parse(TWO_HUNKS).unwrap();
        let hunk = &model.files[0].hunks[0];
        assert!(!selects_changes(hunk, 0, 0));
        assert!(selects_changes(hunk, 0, 1));
    }

    #[test]
    fn apply_modes_pass_patch_on_stdin() {
        let git = FakeGit::new();
        apply_patch(&git, "patch", ApplyMode::UnstageFromIndex).unwrap();
        apply_patch(&git, "patch", ApplyMode::DiscardFromIndexAndWorktree).unwrap();
        let calls = git.calls();
        assert_eq!(
            calls[0].display(),
            "apply --reverse --cached --whitespace=nowarn"
        );
        assert_eq!(calls[0].stdin.as_deref(), Some("patch"));
        assert_eq!(
            calls[1].display(),
            "apply --reverse --index --whitespace=nowarn"
        );
    }

    #[test]
    fn rejected_patch_surfaces_stderr() {
        let git = FakeGit::new();
        git.respond_exit(
            ["apply", "--cached", "--whitespace=nowarn"],
            1,
            "error: patch failed: notes.txt:1\n",
        );
        match apply_patch(&git, "patch", ApplyMode::StageToIndex) {
            Err(Error::PatchApplyFailed { stderr }) => {
                assert_eq!(stderr, "error: patch failed: notes.txt:1")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    /// A single-hunk diff built from a sequence of origins. Always starts
    /// with a context line, as `git diff` does with default context.
    fn hunk_text(origins: &[u8]) -> String {
        let mut body = String::from(" anchor\n");
        let (mut old, mut new) = (1, 1);
        for (i, origin) in origins.iter().enumerate() {
            match origin {
                0 => {
                    body.push_str(&format!(" ctx {i}\n"));
                    old += 1;
                    new += 1;
                }
                1 => {
                    body.push_str(&format!("+add {i}\n"));
                    new += 1;
                }
                _ => {
                    body.push_str(&format!("-del {i}\n"));
                    old += 1;
                }
            }
        }
        format!(
            "diff --git a/f b/f\nindex 1111111..2222222 100644\n--- a/f\n+++ b/f\n@@ -{} +{} @@\n{body}",
            format_range(3, old),
            format_range(3, new)
        )
    }

    proptest! {
        #[test]
        fn parsed_hunks_satisfy_count_invariant(origins in prop::collection::vec(0u8..3, 0..30)) {
            let model = parse(&hunk_text(&origins)).unwrap();
            for hunk in &model.files[0].hunks {
                prop_assert!(hunk.is_consistent());
            }
        }

        #[test]
        fn whole_file_round_trips(origins in prop::collection::vec(0u8..3, 0..30)) {
            let model = parse(&hunk_text(&origins)).unwrap();
            let patch = build_patch(&model, 0, PatchTarget::WholeFile).unwrap();
            prop_assert_eq!(&parse(&patch).unwrap().files[0], &model.files[0]);
        }

        #[test]
        fn narrowed_hunks_stay_consistent(
            origins in prop::collection::vec(0u8..3, 1..30),
            a in 0usize..31,
            b in 0usize..31,
            reverse in any::<bool>(),
        ) {
            let model = parse(&hunk_text(&origins)).unwrap();
            let hunk = &model.files[0].hunks[0];
            let last = hunk.lines.len() - 1;
            let (lo, hi) = (a.min(b).min(last), a.max(b).min(last));
            let direction = if reverse { PatchDirection::Reverse } else { PatchDirection::Forward };
            let patch = build_patch_for(&model, 0, PatchTarget::Lines { hunk: 0, lo, hi }, direction).unwrap();

            let narrowed = parse(&patch).unwrap();
            let result = &narrowed.files[0].hunks[0];
            prop_assert!(result.is_consistent());
            prop_assert_eq!(result.old_start, hunk.old_start);
            prop_assert_eq!(result.new_start, hunk.new_start);
        }
    }
}
