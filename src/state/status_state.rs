use porcelain::status::{RowTarget, StatusRow};

use super::SelectionState;

/// Scroll position and selection of the status view.
#[derive(Debug, Default)]
pub struct StatusViewState {
    pub rows: Vec<StatusRow>,
    pub selection: SelectionState,
    pub scroll: usize,
}

impl StatusViewState {
    pub fn cursor(&self) -> usize {
        self.selection.cursor
    }

    pub fn current(&self) -> Option<&StatusRow> {
        self.rows.get(self.selection.cursor)
    }

    pub fn move_by(&mut self, delta: isize) {
        let last = self.rows.len().saturating_sub(1);
        let cursor = self.selection.cursor as isize + delta;
        self.selection.cursor = cursor.clamp(0, last as isize) as usize;
    }

    pub fn top(&mut self) {
        self.selection.cursor = 0;
    }

    pub fn bottom(&mut self) {
        self.selection.cursor = self.rows.len().saturating_sub(1);
    }

    /// Take new rows, keeping the cursor on the row it pointed at when that
    /// row still exists.
    pub fn replace_rows(&mut self, rows: Vec<StatusRow>) {
        let target: Option<RowTarget> = self.current().map(|r| r.target);
        let cursor = self.selection.cursor;
        self.rows = rows;
        self.selection.cursor = target
            .and_then(|t| self.rows.iter().position(|r| r.target == t))
            .unwrap_or(cursor)
            .min(self.rows.len().saturating_sub(1));
        if self.selection.active {
            self.selection.anchor = self.selection.anchor.min(self.rows.len().saturating_sub(1));
        }
    }

    /// Adjust `scroll` so the cursor is inside a viewport of `height` rows.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        let cursor = self.selection.cursor;
        if cursor < self.scroll {
            self.scroll = cursor;
        } else if cursor >= self.scroll + height {
            self.scroll = cursor + 1 - height;
        }
    }
}
