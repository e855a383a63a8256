use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::event::DialogMode;
use crate::state::AppState;

const MAX_CHOICES: usize = 10;

pub fn render_dialog(frame: &mut Frame, state: &AppState) {
    let Some(dialog) = &state.dialog else {
        return;
    };
    let theme = &state.theme;
    let area = frame.area();

    let matches = dialog.matches();
    let body_height = match dialog.mode() {
        DialogMode::Confirm => 1,
        DialogMode::Input => 1,
        DialogMode::Choose => 1 + matches.len().clamp(1, MAX_CHOICES),
    };
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = (body_height as u16 + 4).min(area.height.saturating_sub(2));
    let x = (area.width.saturating_sub(dialog_width)) / 2;
    let y = (area.height.saturating_sub(dialog_height)) / 2;
    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let border = match dialog.mode() {
        DialogMode::Confirm => theme.warning,
        _ => theme.accent,
    };
    let block = Block::default()
        .title(format!(" {} ", dialog.text()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(body_height as u16), // body
            Constraint::Length(1),                  // blank
            Constraint::Length(1),                  // key hints
        ])
        .split(inner);

    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
    };
    let muted = |t: &'static str| Span::styled(t, Style::default().fg(theme.text_muted));

    let (body, hints) = match dialog.mode() {
        DialogMode::Confirm => (
            vec![Line::from(Span::styled(
                format!(" {}", dialog.text()),
                Style::default().fg(theme.text),
            ))],
            Line::from(vec![
                key(" [Enter/y]"),
                muted("yes  "),
                key("[Esc/n]"),
                muted("no"),
            ]),
        ),
        DialogMode::Input => (
            vec![Line::from(vec![
                Span::styled(" > ", Style::default().fg(theme.accent)),
                Span::styled(dialog.input.as_str(), Style::default().fg(theme.text)),
                Span::styled("\u{2588}", Style::default().fg(theme.text_muted)),
            ])],
            Line::from(vec![key(" [Enter]"), muted("accept  "), key("[Esc]"), muted("cancel")]),
        ),
        DialogMode::Choose => {
            let mut lines = vec![Line::from(vec![
                Span::styled(" filter: ", Style::default().fg(theme.text_muted)),
                Span::styled(dialog.input.as_str(), Style::default().fg(theme.text)),
            ])];
            if matches.is_empty() {
                lines.push(Line::from(muted("  no matches")));
            }
            let first = dialog.selected.saturating_sub(MAX_CHOICES - 1);
            for (i, candidate) in matches.iter().enumerate().skip(first).take(MAX_CHOICES) {
                let style = if i == dialog.selected {
                    Style::default()
                        .fg(theme.text)
                        .bg(theme.selection_bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text)
                };
                lines.push(Line::from(Span::styled(format!("  {candidate}"), style)));
            }
            (
                lines,
                Line::from(vec![
                    key(" [\u{2191}\u{2193}]"),
                    muted("move  "),
                    key("[Enter]"),
                    muted("pick  "),
                    key("[Esc]"),
                    muted("cancel"),
                ]),
            )
        }
    };
    frame.render_widget(Paragraph::new(body), rows[0]);
    frame.render_widget(Paragraph::new(hints), rows[2]);
}
