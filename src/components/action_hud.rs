use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::state::AppState;

use super::Component;

pub struct ActionHud;

impl Component for ActionHud {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let theme = &state.theme;

        // Show status message if present, otherwise show keybindings
        if let Some((ref msg, is_error)) = state.status_message {
            let color = if is_error { theme.error } else { theme.success };
            let bar = Paragraph::new(Line::from(vec![
                Span::raw(" "),
                Span::styled(msg.as_str(), Style::default().fg(color)),
            ]))
            .style(Style::default().bg(theme.surface));
            frame.render_widget(bar, area);
            return;
        }

        let bindings: &[(&str, &str)] = if state.busy {
            &[("C-g", "cancel")]
        } else if state.output.is_some() {
            &[("j/k", "scroll"), ("Space", "page"), ("q/Esc", "close")]
        } else if state.popup.is_some() {
            &[("q/Esc", "back")]
        } else if state.status.selection.active {
            &[
                ("j/k", "extend"),
                ("s", "stage"),
                ("u", "unstage"),
                ("x", "discard"),
                ("V/Esc", "exit"),
            ]
        } else {
            &[
                ("q", "quit"),
                ("j/k", "move"),
                ("Tab", "fold"),
                ("s", "stage"),
                ("u", "unstage"),
                ("x", "discard"),
                ("V", "visual"),
                ("c", "commit"),
                ("P", "push"),
                ("L", "margin"),
                ("?", "help"),
            ]
        };

        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in bindings.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(
                *key,
                Style::default()
                    .fg(theme.key_fg)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(":{desc}"),
                Style::default().fg(theme.text_muted),
            ));
        }
        let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.surface));
        frame.render_widget(bar, area);
    }
}
