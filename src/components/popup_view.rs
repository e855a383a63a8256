use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use porcelain::popup::state::VariableValue;
use porcelain::popup::PopupRows;

use crate::state::AppState;
use crate::theme::Theme;

use super::Component;

/// The open popup, docked to the bottom of the screen.
pub struct PopupView;

impl Component for PopupView {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let Some(popup) = &state.popup else {
            return;
        };
        let theme = &state.theme;
        let rows = &popup.rows;

        let upper = upper_lines(rows, theme);
        let action_height = rows
            .actions
            .iter()
            .map(|g| g.actions.len() + 1)
            .max()
            .unwrap_or(0);
        let wanted = upper.len() + action_height + 2;
        let height = (wanted as u16).min(area.height);
        let popup_area = Rect::new(area.x, area.y + area.height - height, area.width, height);

        frame.render_widget(Clear, popup_area);
        let mut title = format!(" {} ", rows.title);
        if !popup.pending.is_empty() {
            title.push_str(&format!("[{}] ", popup.pending.join(" ")));
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.accent));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(upper.len() as u16),
                Constraint::Min(0),
            ])
            .split(inner);
        frame.render_widget(Paragraph::new(upper), parts[0]);

        if rows.actions.is_empty() {
            return;
        }
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Ratio(1, rows.actions.len() as u32);
                rows.actions.len()
            ])
            .split(parts[1]);
        for (group, column) in rows.actions.iter().zip(columns.iter()) {
            let mut lines = vec![Line::from(Span::styled(
                group.heading.as_str(),
                Style::default()
                    .fg(theme.secondary)
                    .add_modifier(Modifier::BOLD),
            ))];
            for (key, description) in &group.actions {
                lines.push(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(key.as_str(), Style::default().fg(theme.key_fg)),
                    Span::raw(" "),
                    Span::styled(description.as_str(), Style::default().fg(theme.text)),
                ]));
            }
            frame.render_widget(Paragraph::new(lines), *column);
        }
    }
}

/// Variables and arguments, one heading per group.
fn upper_lines<'a>(rows: &'a PopupRows, theme: &Theme) -> Vec<Line<'a>> {
    let heading = |text: &'a str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(theme.secondary)
                .add_modifier(Modifier::BOLD),
        ))
    };
    let mut lines = Vec::new();

    for (title, variables) in &rows.variables {
        lines.push(heading(title.as_str()));
        for variable in variables {
            let mut spans = vec![
                Span::raw(" "),
                Span::styled(variable.key.as_str(), Style::default().fg(theme.key_fg)),
                Span::raw(" "),
                Span::styled(variable.name.as_str(), Style::default().fg(theme.text)),
                Span::raw(" "),
            ];
            match &variable.value {
                VariableValue::Text(Some(value)) => {
                    spans.push(Span::styled(value.as_str(), Style::default().fg(theme.flag_fg)));
                }
                VariableValue::Text(None) => {
                    spans.push(Span::styled("unset", Style::default().fg(theme.text_muted)));
                }
                VariableValue::Choices(cells) => {
                    spans.push(Span::styled("[", Style::default().fg(theme.text_muted)));
                    for (i, cell) in cells.iter().enumerate() {
                        if i > 0 {
                            spans.push(Span::styled("|", Style::default().fg(theme.text_muted)));
                        }
                        let style = if cell.active {
                            Style::default().fg(theme.flag_fg)
                        } else {
                            Style::default().fg(theme.text_muted)
                        };
                        spans.push(Span::styled(cell.text.as_str(), style));
                    }
                    spans.push(Span::styled("]", Style::default().fg(theme.text_muted)));
                }
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::default());
    }

    for (title, arguments) in &rows.arguments {
        lines.push(heading(title.as_str()));
        for argument in arguments {
            let flag_style = if argument.enabled {
                Style::default()
                    .fg(theme.flag_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_muted)
            };
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::styled(argument.key.as_str(), Style::default().fg(theme.key_fg)),
                Span::raw(" "),
                Span::styled(argument.description.as_str(), Style::default().fg(theme.text)),
                Span::raw(" ("),
                Span::styled(argument.flag.as_str(), flag_style),
                Span::raw(")"),
            ]));
        }
        lines.push(Line::default());
    }
    lines
}
