//! Maps a range of rendered rows back to diff coordinates.

use crate::error::{Error, Result};
use crate::git::patch::PatchTarget;

use super::rows::{RowTarget, StatusRow};
use super::tree::SectionKind;

/// Inclusive row range as the host reports it. The ends may come in
/// either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn row(row: usize) -> Self {
        Self {
            start: row,
            end: row,
        }
    }

    pub fn range(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn ordered(&self) -> (usize, usize) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// Every file of a diff section.
    Section(SectionKind),
    File {
        section: SectionKind,
        file: usize,
        target: PatchTarget,
    },
    /// Rows that carry no change (stashes, commits, branch summary).
    Nothing,
}

/// Resolve `selection` against the rows it was made on.
///
/// A single row resolves to what it heads: a section, a whole file, a whole
/// hunk, or one line. A range clamps inward past the headers enclosing its
/// lines and must then lie inside one hunk. A range of headers only resolves
/// to its first row, and every other row must sit under that one.
pub fn resolve(rows: &[StatusRow], selection: Selection) -> Result<Resolved> {
    let (start, end) = selection.ordered();
    if end >= rows.len() {
        return Err(Error::CrossBoundarySelection);
    }
    let range = &rows[start..=end];
    if range.len() == 1 {
        return Ok(single(&range[0].target));
    }
    if range.iter().all(|r| !r.target.section().has_diff()) {
        return Ok(Resolved::Nothing);
    }

    let Some(first) = range.iter().find(|r| is_line(&r.target)) else {
        let head = &range[0].target;
        if range.iter().any(|r| !encloses(head, &r.target)) {
            return Err(Error::CrossBoundarySelection);
        }
        return Ok(single(head));
    };
    let first = first.target;
    // Lines of one hunk are contiguous, so anything else must be a header
    // above them.
    if range
        .iter()
        .any(|r| !is_line(&r.target) && !encloses(&r.target, &first))
    {
        return Err(Error::CrossBoundarySelection);
    }

    let mut lines = range.iter().filter_map(|r| match r.target {
        RowTarget::Line {
            section,
            file,
            hunk,
            line,
        } => Some((section, file, hunk, line)),
        _ => None,
    });
    let Some((section, file, hunk, lo)) = lines.next() else {
        return Err(Error::CrossBoundarySelection);
    };
    let mut hi = lo;
    for (s, f, h, line) in lines {
        if (s, f, h) != (section, file, hunk) {
            return Err(Error::CrossBoundarySelection);
        }
        hi = line;
    }
    Ok(Resolved::File {
        section,
        file,
        target: PatchTarget::Lines { hunk, lo, hi },
    })
}

/// Whether `inner` is `outer` itself or sits under it.
fn encloses(outer: &RowTarget, inner: &RowTarget) -> bool {
    match (*outer, *inner) {
        (RowTarget::Section(section), inner) => inner.section() == section,
        (
            RowTarget::File { section, file },
            RowTarget::File {
                section: s,
                file: f,
            }
            | RowTarget::Hunk {
                section: s,
                file: f,
                ..
            }
            | RowTarget::Line {
                section: s,
                file: f,
                ..
            },
        ) => (section, file) == (s, f),
        (
            RowTarget::Hunk {
                section,
                file,
                hunk,
            },
            RowTarget::Hunk {
                section: s,
                file: f,
                hunk: h,
            }
            | RowTarget::Line {
                section: s,
                file: f,
                hunk: h,
                ..
            },
        ) => (section, file, hunk) == (s, f, h),
        (outer, inner) => outer == inner,
    }
}

fn is_line(target: &RowTarget) -> bool {
    matches!(target, RowTarget::Line { .. })
}

fn single(target: &RowTarget) -> Resolved {
    match *target {
        RowTarget::Section(section) if section.has_diff() => Resolved::Section(section),
        RowTarget::File { section, file } => Resolved::File {
            section,
            file,
            target: PatchTarget::WholeFile,
        },
        RowTarget::Hunk {
            section,
            file,
            hunk,
        } => Resolved::File {
            section,
            file,
            target: PatchTarget::Hunk(hunk),
        },
        RowTarget::Line {
            section,
            file,
            hunk,
            line,
        } => Resolved::File {
            section,
            file,
            target: PatchTarget::Lines {
                hunk,
                lo: line,
                hi: line,
            },
        },
        _ => Resolved::Nothing,
    }
}
