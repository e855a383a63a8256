/// Read-only text shown over the status view: log and diff output, command
/// history.
#[derive(Debug)]
pub struct OutputState {
    pub title: String,
    pub lines: Vec<String>,
    pub scroll: usize,
}

impl OutputState {
    pub fn new(title: String, text: &str) -> Self {
        Self {
            title,
            lines: text.lines().map(str::to_string).collect(),
            scroll: 0,
        }
    }

    pub fn scroll_by(&mut self, delta: isize, height: usize) {
        let max = self.lines.len().saturating_sub(height.max(1)) as isize;
        self.scroll = (self.scroll as isize + delta).clamp(0, max.max(0)) as usize;
    }
}
