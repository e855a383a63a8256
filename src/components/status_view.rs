use chrono::{Local, NaiveDate};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use porcelain::git::DiffLineOrigin;
use porcelain::status::{RowTarget, StatusRow};

use crate::state::{AppState, MarginState, MarginStyle};
use crate::theme::Theme;

use super::Component;

pub struct StatusView;

impl Component for StatusView {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let theme = &state.theme;
        let view = &state.status;
        let height = area.height as usize;
        let width = area.width as usize;

        let lines: Vec<Line> = view
            .rows
            .iter()
            .enumerate()
            .skip(view.scroll)
            .take(height)
            .map(|(i, row)| {
                let mut line = render_row(row, theme, &state.margin, width);
                if view.selection.active && view.selection.contains(i) {
                    line = line.style(Style::default().bg(theme.visual_select_bg));
                } else if i == view.cursor() {
                    line = line.style(Style::default().bg(theme.selection_bg));
                }
                line
            })
            .collect();

        if lines.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                " Nothing to show",
                Style::default().fg(theme.text_muted),
            )));
            frame.render_widget(empty, area);
            return;
        }
        frame.render_widget(Paragraph::new(lines), area);
    }
}

fn render_row<'a>(row: &'a StatusRow, theme: &Theme, margin: &MarginState, width: usize) -> Line<'a> {
    let mut spans: Vec<Span> = Vec::new();
    let mut right: Option<Span> = None;

    match row.target {
        RowTarget::Section(_) => {
            let fold = if row.folded { "\u{25b8} " } else { "\u{25be} " };
            spans.push(Span::styled(fold, Style::default().fg(theme.text_muted)));
            spans.push(Span::styled(
                row.label.as_str(),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ));
            if !row.value.is_empty() {
                spans.push(Span::styled(
                    format!(" {}", row.value),
                    Style::default().fg(theme.text_muted),
                ));
            }
        }
        RowTarget::SectionError(_) => {
            spans.push(Span::styled(
                format!("  {}: {}", row.label, row.value),
                Style::default().fg(theme.error),
            ));
        }
        RowTarget::File { .. } => {
            spans.push(Span::styled(
                format!("  {:<11}", row.label),
                Style::default().fg(theme.secondary),
            ));
            spans.push(Span::styled(row.value.as_str(), Style::default().fg(theme.text)));
            if margin.details {
                if let Some(hint) = &row.hint {
                    spans.push(Span::styled(
                        format!("  ({hint})"),
                        Style::default().fg(theme.text_muted),
                    ));
                }
            }
            if margin.shortstat {
                if let Some((adds, dels)) = row.stat {
                    spans.push(Span::styled(
                        format!("  +{adds}"),
                        Style::default().fg(theme.diff_add_fg),
                    ));
                    spans.push(Span::styled(
                        format!(" -{dels}"),
                        Style::default().fg(theme.diff_del_fg),
                    ));
                }
            }
        }
        RowTarget::Hunk { .. } => {
            spans.push(Span::styled(
                format!("    {}", row.label),
                Style::default().fg(theme.diff_hunk_header_fg),
            ));
        }
        RowTarget::Line { .. } => {
            let style = match row.origin {
                Some(DiffLineOrigin::Addition) => {
                    Style::default().fg(theme.diff_add_fg).bg(theme.diff_add_bg)
                }
                Some(DiffLineOrigin::Deletion) => {
                    Style::default().fg(theme.diff_del_fg).bg(theme.diff_del_bg)
                }
                _ => Style::default().fg(theme.diff_context_fg),
            };
            spans.push(Span::styled(format!("    {}{}", row.label, row.value), style));
            if margin.details {
                if let Some(hint) = &row.hint {
                    spans.push(Span::styled(
                        format!("  \\ {hint}"),
                        Style::default().fg(theme.text_muted),
                    ));
                }
            }
        }
        RowTarget::Stash(_) | RowTarget::Commit(_) => {
            spans.push(Span::styled(
                format!("  {} ", row.label),
                Style::default().fg(theme.flag_fg),
            ));
            spans.push(Span::styled(row.value.as_str(), Style::default().fg(theme.text)));
            if margin.visible {
                if let Some(hint) = &row.hint {
                    right = Some(Span::styled(
                        margin_text(hint, margin.style),
                        Style::default().fg(theme.text_muted),
                    ));
                }
            }
        }
        RowTarget::Head | RowTarget::Upstream | RowTarget::Push => {
            spans.push(Span::styled(
                format!("  {:<7}", row.label),
                Style::default()
                    .fg(theme.text)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(row.value.as_str(), Style::default().fg(theme.success)));
        }
    }

    if let Some(right) = right {
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let wanted = right.content.chars().count() + 1;
        if used + wanted < width {
            spans.push(Span::raw(" ".repeat(width - used - wanted)));
            spans.push(right);
        }
    }
    Line::from(spans)
}

/// A row date as the margin style wants it. Dates that do not parse are
/// shown as given.
pub fn margin_text(hint: &str, style: MarginStyle) -> String {
    match style {
        MarginStyle::Date => hint.to_string(),
        MarginStyle::Age => {
            let Some(date) = hint
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                return hint.to_string();
            };
            age(date, Local::now().date_naive())
        }
    }
}

fn age(date: NaiveDate, today: NaiveDate) -> String {
    let days = (today - date).num_days();
    match days {
        i64::MIN..=0 => "today".to_string(),
        1..=13 => format!("{days}d"),
        14..=60 => format!("{}w", days / 7),
        61..=729 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
