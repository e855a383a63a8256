use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::state::AppState;

use super::Component;

/// Full-screen viewer for command output.
pub struct OutputView;

impl Component for OutputView {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let Some(output) = &state.output else {
            return;
        };
        let theme = &state.theme;

        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(format!(" {} ", output.title))
            .title_bottom(Line::styled(
                format!(" {}/{} ", output.scroll + 1, output.lines.len().max(1)),
                Style::default().fg(theme.text_muted),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = output
            .lines
            .iter()
            .skip(output.scroll)
            .take(inner.height as usize)
            .map(|l| Line::styled(l.as_str(), Style::default().fg(theme.text)))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
