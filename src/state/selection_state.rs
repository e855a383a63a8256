use porcelain::status::Selection;

/// Cursor and visual line selection in the status view.
#[derive(Debug, Default)]
pub struct SelectionState {
    /// Whether visual mode is currently active.
    pub active: bool,
    /// The row where the selection started.
    pub anchor: usize,
    /// The row under the cursor.
    pub cursor: usize,
}

impl SelectionState {
    /// Returns the (start, end) row range, inclusive.
    pub fn range(&self) -> (usize, usize) {
        if !self.active {
            return (self.cursor, self.cursor);
        }
        if self.anchor <= self.cursor {
            (self.anchor, self.cursor)
        } else {
            (self.cursor, self.anchor)
        }
    }

    pub fn contains(&self, row: usize) -> bool {
        let (start, end) = self.range();
        (start..=end).contains(&row)
    }

    pub fn selection(&self) -> Selection {
        let (start, end) = self.range();
        Selection::range(start, end)
    }

    pub fn enter_visual(&mut self) {
        self.active = true;
        self.anchor = self.cursor;
    }

    pub fn exit_visual(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_ordered_whichever_way_the_cursor_moved() {
        let mut state = SelectionState {
            cursor: 7,
            ..Default::default()
        };
        state.enter_visual();
        state.cursor = 4;
        assert_eq!(state.range(), (4, 7));
        assert!(state.contains(5));
        assert_eq!(state.selection(), Selection::range(4, 7));
    }

    #[test]
    fn outside_visual_mode_only_the_cursor_is_selected() {
        let state = SelectionState {
            active: false,
            anchor: 1,
            cursor: 3,
        };
        assert_eq!(state.range(), (3, 3));
    }
}
