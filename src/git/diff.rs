use std::path::PathBuf;

use super::types::*;
use crate::error::{Error, Result};

/// Parse `git diff` output into a [`DiffModel`].
///
/// Single pass over the lines. A file section starts at `diff --git` and runs
/// to the next one; hunk bodies are consumed by counting down the ranges in
/// their header.
pub fn parse(text: &str) -> Result<DiffModel> {
    let mut parser = Parser::default();
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    for (i, line) in lines.into_iter().enumerate() {
        parser.line_no = i + 1;
        parser.feed(line)?;
    }
    parser.finish()
}

impl DiffModel {
    pub fn parse(text: &str) -> Result<DiffModel> {
        parse(text)
    }
}

#[derive(Default)]
struct Parser {
    files: Vec<FileDelta>,
    file: Option<FileDelta>,
    hunk: Option<Hunk>,
    old_remaining: u32,
    new_remaining: u32,
    old_no: u32,
    new_no: u32,
    line_no: usize,
}

impl Parser {
    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedDiff {
            line: self.line_no,
            reason: reason.into(),
        }
    }

    fn feed(&mut self, line: &str) -> Result<()> {
        if self.hunk.is_some() {
            return self.hunk_line(line);
        }
        if let Some(rest) = line.strip_prefix("diff --git ") {
            self.finish_file();
            self.file = Some(file_from_git_header(rest, line));
            return Ok(());
        }
        if line.starts_with("@@") {
            return self.start_hunk(line);
        }
        if line.starts_with('\\') {
            return self.mark_no_newline();
        }
        let Some(file) = self.file.as_mut() else {
            return Err(self.malformed("expected a 'diff --git' header"));
        };
        if !file.hunks.is_empty() {
            return Err(self.malformed(format!("unexpected line after hunk: {line}")));
        }
        header_line(file, line);
        Ok(())
    }

    fn start_hunk(&mut self, line: &str) -> Result<()> {
        if self.file.is_none() {
            return Err(self.malformed("hunk outside of a file section"));
        }
        let (old_start, old_lines, new_start, new_lines) =
            parse_hunk_header(line).ok_or_else(|| self.malformed("invalid hunk header"))?;
        self.old_remaining = old_lines;
        self.new_remaining = new_lines;
        self.old_no = old_start;
        self.new_no = new_start;
        self.hunk = Some(Hunk {
            header: line.to_string(),
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines: Vec::new(),
        });
        self.close_hunk_if_done();
        Ok(())
    }

    fn hunk_line(&mut self, line: &str) -> Result<()> {
        if line.starts_with('\\') {
            return self.mark_no_newline();
        }
        let (origin, content) = match line.chars().next() {
            Some(' ') => (DiffLineOrigin::Context, &line[1..]),
            // Some tools strip the single space from empty context lines.
            None => (DiffLineOrigin::Context, ""),
            Some('+') => (DiffLineOrigin::Addition, &line[1..]),
            Some('-') => (DiffLineOrigin::Deletion, &line[1..]),
            Some(_) => return Err(self.malformed(format!("unexpected line in hunk: {line}"))),
        };

        let needs_old = origin != DiffLineOrigin::Addition;
        let needs_new = origin != DiffLineOrigin::Deletion;
        if (needs_old && self.old_remaining == 0) || (needs_new && self.new_remaining == 0) {
            return Err(self.malformed("hunk is longer than its header declares"));
        }

        let old_lineno = needs_old.then_some(self.old_no);
        let new_lineno = needs_new.then_some(self.new_no);
        if needs_old {
            self.old_no += 1;
            self.old_remaining -= 1;
        }
        if needs_new {
            self.new_no += 1;
            self.new_remaining -= 1;
        }
        if let Some(hunk) = self.hunk.as_mut() {
            hunk.lines.push(DiffLine {
                origin,
                old_lineno,
                new_lineno,
                content: content.to_string(),
                no_newline: false,
            });
        }
        self.close_hunk_if_done();
        Ok(())
    }

    fn close_hunk_if_done(&mut self) {
        if self.old_remaining == 0 && self.new_remaining == 0 {
            if let (Some(hunk), Some(file)) = (self.hunk.take(), self.file.as_mut()) {
                file.hunks.push(hunk);
            }
        }
    }

    fn mark_no_newline(&mut self) -> Result<()> {
        let last = match self.hunk.as_mut() {
            Some(hunk) => hunk.lines.last_mut(),
            None => self
                .file
                .as_mut()
                .and_then(|f| f.hunks.last_mut())
                .and_then(|h| h.lines.last_mut()),
        };
        match last {
            Some(line) => {
                line.no_newline = true;
                Ok(())
            }
            None => Err(self.malformed("no-newline marker without a preceding line")),
        }
    }

    fn finish_file(&mut self) {
        if let Some(file) = self.file.take() {
            self.files.push(file);
        }
    }

    fn finish(mut self) -> Result<DiffModel> {
        if self.hunk.is_some() {
            return Err(self.malformed("unexpected end of input inside a hunk"));
        }
        self.finish_file();
        Ok(DiffModel { files: self.files })
    }
}

fn file_from_git_header(rest: &str, line: &str) -> FileDelta {
    let path = split_git_header_paths(rest)
        .map(|(_, b)| b)
        .unwrap_or_else(|| rest.to_string());
    FileDelta {
        path: PathBuf::from(path),
        old_path: None,
        status: FileStatus::Modified,
        old_mode: None,
        new_mode: None,
        header: vec![line.to_string()],
        hunks: Vec::new(),
        binary: false,
    }
}

/// `a/<old> b/<new>`; paths containing spaces are split at the middle when
/// both sides name the same file. Either side may be C-quoted.
fn split_git_header_paths(rest: &str) -> Option<(String, String)> {
    if rest.starts_with('"') {
        let (a, tail) = take_quoted(rest)?;
        let b = tail.strip_prefix(' ')?;
        let b = if b.starts_with('"') {
            take_quoted(b)?.0
        } else {
            b.to_string()
        };
        return Some((
            a.strip_prefix("a/")?.to_string(),
            b.strip_prefix("b/")?.to_string(),
        ));
    }
    let rest = rest.strip_prefix("a/")?;
    if let Some(split) = rest.find(" \"b/") {
        let (b, _) = take_quoted(&rest[split + 1..])?;
        return Some((rest[..split].to_string(), b.strip_prefix("b/")?.to_string()));
    }
    if rest.len() % 2 == 1 {
        let half = (rest.len() - 3) / 2;
        if rest.is_char_boundary(half) && rest[half..].starts_with(" b/") {
            let (a, b) = (&rest[..half], &rest[half + 3..]);
            if a == b {
                return Some((a.to_string(), b.to_string()));
            }
        }
    }
    let (a, b) = rest.split_once(" b/")?;
    Some((a.to_string(), b.to_string()))
}

/// Decode a leading C-quoted token, returning it and the remaining input.
/// Git quotes paths with non-ASCII bytes, quotes, backslashes and control
/// characters; octal escapes carry raw UTF-8 bytes.
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut bytes = Vec::new();
    let mut iter = body.char_indices();
    while let Some((i, c)) = iter.next() {
        match c {
            '"' => {
                let decoded = String::from_utf8_lossy(&bytes).into_owned();
                return Some((decoded, &body[i + 1..]));
            }
            '\\' => {
                let (_, esc) = iter.next()?;
                match esc {
                    'n' => bytes.push(b'\n'),
                    't' => bytes.push(b'\t'),
                    'r' => bytes.push(b'\r'),
                    'a' => bytes.push(0x07),
                    'b' => bytes.push(0x08),
                    'f' => bytes.push(0x0c),
                    'v' => bytes.push(0x0b),
                    '0'..='7' => {
                        let mut value = esc.to_digit(8)?;
                        for _ in 0..2 {
                            let (_, d) = iter.next()?;
                            value = value * 8 + d.to_digit(8)?;
                        }
                        bytes.push(u8::try_from(value).ok()?);
                    }
                    other => {
                        let mut buf = [0; 4];
                        bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
                    }
                }
            }
            other => {
                let mut buf = [0; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    None
}

fn unquote(path: &str) -> String {
    match take_quoted(path) {
        Some((decoded, "")) => decoded,
        _ => path.to_string(),
    }
}

fn header_line(file: &mut FileDelta, line: &str) {
    file.header.push(line.to_string());
    if let Some(mode) = line.strip_prefix("old mode ") {
        file.old_mode = Some(mode.to_string());
    } else if let Some(mode) = line.strip_prefix("new mode ") {
        file.new_mode = Some(mode.to_string());
    } else if let Some(mode) = line.strip_prefix("new file mode ") {
        file.status = FileStatus::Added;
        file.new_mode = Some(mode.to_string());
    } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
        file.status = FileStatus::Deleted;
        file.old_mode = Some(mode.to_string());
    } else if let Some(index) = line.strip_prefix("index ") {
        if let Some((_, mode)) = index.split_once(' ') {
            file.old_mode.get_or_insert_with(|| mode.to_string());
            file.new_mode.get_or_insert_with(|| mode.to_string());
        }
    } else if let Some(from) = line.strip_prefix("rename from ") {
        file.status = FileStatus::Renamed;
        file.old_path = Some(PathBuf::from(unquote(from)));
    } else if let Some(to) = line.strip_prefix("rename to ") {
        file.path = PathBuf::from(unquote(to));
    } else if let Some(old) = line.strip_prefix("--- ") {
        if old == "/dev/null" {
            file.status = FileStatus::Added;
        }
    } else if let Some(new) = line.strip_prefix("+++ ") {
        if new == "/dev/null" {
            file.status = FileStatus::Deleted;
        } else if let Some(path) = unquote(new).strip_prefix("b/") {
            file.path = PathBuf::from(path);
        }
    } else if line.starts_with("Binary files ") || line == "GIT binary patch" {
        file.binary = true;
    }
}

/// `@@ -a[,b] +c[,d] @@ heading`. An omitted length is 1.
pub fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    let body = line.strip_prefix("@@ ")?;
    let end = body.find(" @@")?;
    let mut ranges = body[..end].split_whitespace();
    let (old_start, old_lines) = parse_range(ranges.next()?.strip_prefix('-')?)?;
    let (new_start, new_lines) = parse_range(ranges.next()?.strip_prefix('+')?)?;
    if ranges.next().is_some() {
        return None;
    }
    Some((old_start, old_lines, new_start, new_lines))
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const MODIFIED: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 3b18e51..a4c2f0d 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,4 +1,5 @@ mod config;
 fn one() {}
-fn two() {}
+fn two() -> u8 { 2 }
+fn three() {}
 fn four() {}
 fn five() {}
@@ -10 +11 @@ fn ten() {}
-old
+new
";

    #[test]
    fn parses_files_hunks_and_line_numbers() {
        let model = parse(MODIFIED).unwrap();
        assert_eq!(model.files.len(), 1);
        let file = &model.files[0];
        assert_eq!(file.path, Path::new("src/lib.rs"));
        assert_eq!(file.status, FileStatus::Modified);
        assert_eq!(file.old_mode.as_deref(), Some("100644"));
        assert_eq!(file.hunks.len(), 2);

        let hunk = &file.hunks[0];
        assert_eq!(hunk.header, "@@ -1,4 +1,5 @@ mod config;");
        assert_eq!((hunk.old_start, hunk.old_lines), (1, 4));
        assert_eq!((hunk.new_start, hunk.new_lines), (1, 5));
        assert_eq!(hunk.lines[1].origin, DiffLineOrigin::Deletion);
        assert_eq!(hunk.lines[1].old_lineno, Some(2));
        assert_eq!(hunk.lines[1].new_lineno, None);
        assert_eq!(hunk.lines[3].content, "fn three() {}");
        assert_eq!(hunk.lines[3].new_lineno, Some(3));
        assert_eq!(hunk.lines[4].old_lineno, Some(3));
        assert_eq!(hunk.lines[4].new_lineno, Some(4));
        assert!(hunk.is_consistent());

        let short = &file.hunks[1];
        assert_eq!((short.old_lines, short.new_lines), (1, 1));
        assert_eq!(short.lines[0].old_lineno, Some(10));
        assert_eq!(short.lines[1].new_lineno, Some(11));
    }

    #[test]
    fn no_newline_marker_attaches_to_previous_line() {
        let text = "\
diff --git a/a.txt b/a.txt
index 1111111..2222222 100644
--- a/a.txt
+++ b/a.txt
@@ -1 +1 @@
-hello
\\ No newline at end of file
+hello world
\\ No newline at end of file
";
        let model = parse(text).unwrap();
        let lines = &model.files[0].hunks[0].lines;
        assert_eq!(lines.len(), 2);
        assert!(lines[0].no_newline);
        assert_eq!(lines[0].content, "hello");
        assert!(lines[1].no_newline);
        assert_eq!(lines[1].content, "hello world");
    }

    #[test]
    fn pure_rename_has_no_hunks() {
        let text = "\
diff --git a/old name.txt b/new name.txt
similarity index 100%
rename from old name.txt
rename to new name.txt
";
        let model = parse(text).unwrap();
        let file = &model.files[0];
        assert_eq!(file.status, FileStatus::Renamed);
        assert_eq!(file.path, Path::new("new name.txt"));
        assert_eq!(file.old_path.as_deref(), Some(Path::new("old name.txt")));
        assert!(file.hunks.is_empty());
    }

    #[test]
    fn mode_only_change() {
        let text = "\
diff --git a/test b/test
old mode 100644
new mode 100755
";
        let model = parse(text).unwrap();
        let file = &model.files[0];
        assert!(file.hunks.is_empty());
        assert_eq!(file.mode_change().as_deref(), Some("100644 -> 100755"));
    }

    #[test]
    fn binary_file_has_marker_and_no_hunks() {
        let text = "\
diff --git a/logo.png b/logo.png
new file mode 100644
index 0000000..9a1b2c3
Binary files /dev/null and b/logo.png differ
diff --git a/b.txt b/b.txt
new file mode 100644
index 0000000..e69de29
";
        let model = parse(text).unwrap();
        assert_eq!(model.files.len(), 2);
        assert!(model.files[0].binary);
        assert_eq!(model.files[0].status, FileStatus::Added);
        assert!(model.files[0].hunks.is_empty());
        assert!(!model.files[1].binary);
    }

    #[test]
    fn new_and_deleted_files() {
        let text = "\
diff --git a/new.txt b/new.txt
new file mode 100644
index 0000000..3b18e51
--- /dev/null
+++ b/new.txt
@@ -0,0 +1,2 @@
+one
+two
diff --git a/gone.txt b/gone.txt
deleted file mode 100644
index 3b18e51..0000000
--- a/gone.txt
+++ /dev/null
@@ -1 +0,0 @@
-bye
";
        let model = parse(text).unwrap();
        assert_eq!(model.files[0].status, FileStatus::Added);
        assert_eq!(model.files[0].hunks[0].lines[0].new_lineno, Some(1));
        assert_eq!(model.files[1].status, FileStatus::Deleted);
        assert_eq!(model.files[1].path, Path::new("gone.txt"));
        assert_eq!(model.files[1].hunks[0].new_lines, 0);
    }

    #[test]
    fn empty_input_is_an_empty_model() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn truncated_hunk_is_malformed() {
        let text = "\
diff --git a/a b/a
--- a/a
+++ b/a
@@ -1,3 +1,3 @@
 one
";
        match parse(text) {
            Err(Error::MalformedDiff { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected malformed diff, got {other:?}"),
        }
    }

    #[test]
    fn stray_line_is_malformed() {
        assert!(matches!(
            parse("hello\n"),
            Err(Error::MalformedDiff { line: 1, .. })
        ));
    }

    #[test]
    fn quoted_non_ascii_paths_are_decoded() {
        let text = "\
diff --git \"a/caf\\303\\251 menu.txt\" \"b/caf\\303\\251 menu.txt\"
new file mode 100644
index 0000000..e69de29
--- /dev/null
+++ \"b/caf\\303\\251 menu.txt\"
@@ -0,0 +1 @@
+espresso
";
        let model = parse(text).unwrap();
        assert_eq!(model.files[0].path, Path::new("café menu.txt"));
        assert_eq!(model.files[0].status, FileStatus::Added);

        assert_eq!(
            split_git_header_paths("a/plain.txt \"b/tab\\there.txt\""),
            Some(("plain.txt".to_string(), "tab\there.txt".to_string()))
        );
        assert_eq!(unquote("\"say \\\"hi\\\"\""), "say \"hi\"");
        assert_eq!(unquote("unquoted"), "unquoted");
    }

    #[test]
    fn hunk_header_grammar() {
        assert_eq!(parse_hunk_header("@@ -1,4 +1,5 @@"), Some((1, 4, 1, 5)));
        assert_eq!(parse_hunk_header("@@ -7 +7,0 @@ fn x"), Some((7, 1, 7, 0)));
        assert_eq!(parse_hunk_header("@@ -a +1 @@"), None);
        assert_eq!(parse_hunk_header("@@@ -1 -1 +1 @@@"), None);
    }
}
