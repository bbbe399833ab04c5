//! Backlog page: every saved response with its versions and feedback.

use catcheck_core::client::BacklogEntry;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_backlog(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let title = format!(" Backlog ({}) · b: reload ", state.backlog.len());
    let block = panel_block(title, true, theme);

    if state.backlog.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::styled("Backlog is empty.", Style::default().fg(theme.dim)))
                .block(block),
            area,
        );
        return;
    }

    let mut text = Text::default();
    for entry in &state.backlog {
        for line in entry_lines(entry, theme) {
            text.push_line(line);
        }
        text.push_line(Line::raw(""));
    }

    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((state.backlog_scroll, 0)),
        area,
    );
}

fn entry_lines(entry: &BacklogEntry, theme: &Theme) -> Vec<Line<'static>> {
    let dim = Style::default().fg(theme.dim);
    let mut header = vec![
        Span::styled(
            entry.product_name.display().to_owned(),
            Style::default()
                .fg(theme.tab_active)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  #{}", entry.id), dim),
    ];
    if let Some(date) = entry.analysis_date {
        header.push(Span::styled(format!("  {}", date.format("%Y-%m-%d %H:%M")), dim));
    }

    let mut lines = vec![Line::from(header)];
    lines.push(Line::from(vec![
        Span::styled("  original  ", dim),
        Span::raw(entry.original_text.replace('\n', " ")),
    ]));
    for version in &entry.versions {
        lines.push(Line::from(vec![
            Span::styled(format!("  v{:<8} ", version.version_number), dim),
            Span::raw(catcheck_core::markup::clean_text(&version.improved_text)),
            Span::styled(format!("  ({})", version.prompt), dim),
        ]));
    }
    for feedback in &entry.feedbacks {
        lines.push(Line::from(vec![
            Span::styled("  feedback  ", Style::default().fg(theme.warning)),
            Span::raw(feedback.feedback_text.clone()),
        ]));
    }
    lines
}
