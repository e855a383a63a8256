use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::state::AppState;

use super::Component;

/// Top bar: branch, head commit and a busy marker.
pub struct ContextBar;

impl Component for ContextBar {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let theme = &state.theme;
        let head = &state.head;

        let branch = head.branch.as_deref().unwrap_or("(detached)");
        let mut spans = vec![
            Span::styled(" porcelain ", Style::default().fg(theme.surface).bg(theme.accent)),
            Span::raw("  "),
            Span::styled(
                branch,
                Style::default()
                    .fg(theme.success)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(commit) = &head.commit {
            spans.push(Span::styled(
                format!(" {commit}"),
                Style::default().fg(theme.text_muted),
            ));
        }
        if let Some(upstream) = &head.upstream {
            spans.push(Span::styled(" \u{2192} ", Style::default().fg(theme.text_muted)));
            spans.push(Span::styled(
                upstream.as_str(),
                Style::default().fg(theme.warning),
            ));
        }
        if state.busy {
            spans.push(Span::styled("  [running]", Style::default().fg(theme.warning)));
        }

        let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.surface));
        frame.render_widget(bar, area);
    }
}
