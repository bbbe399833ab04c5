//! Review page: pending suggestions beside the working document.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_review(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Some(review) = &state.review else {
        frame.render_widget(
            Paragraph::new(Line::styled(
                "No review open. Select a result and press v.",
                Style::default().fg(theme.dim),
            ))
            .block(panel_block(" Review ", false, theme)),
            area,
        );
        return;
    };

    let [list_area, doc_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Fill(1)]).areas(area);

    let pending = review.session.pending();
    let title = format!(" Suggestions ({}) ", pending.len());
    let block = panel_block(title, state.mode == Mode::Normal, theme);
    if pending.is_empty() {
        let mut lines = vec![Line::styled(
            "Nothing left to review.",
            Style::default().fg(theme.dim),
        )];
        lines.push(Line::styled(
            "w: save the document to the result",
            Style::default().fg(theme.dim),
        ));
        frame.render_widget(Paragraph::new(lines).block(block), list_area);
    } else {
        let items: Vec<ListItem> = pending
            .iter()
            .map(|s| {
                ListItem::new(Line::from(vec![
                    Span::styled(s.original.as_str(), Style::default().fg(theme.deleted_fg)),
                    Span::raw(" → "),
                    Span::styled(s.suggested.as_str(), Style::default().fg(theme.diff_added)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(theme.selection_bg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default().with_selected(Some(review.selected));
        frame.render_stateful_widget(list, list_area, &mut list_state);
    }

    let editing = state.mode == Mode::EditDocument;
    let mut title = format!(" {} ", review.product_name);
    if review.session.can_undo() {
        title.push_str("· u: undo ");
    }
    let body = if editing { state.input.as_str() } else { review.session.document() };
    let mut text = Text::from(
        body.split('\n')
            .map(|l| Line::raw(l.to_owned()))
            .collect::<Vec<_>>(),
    );
    if editing {
        if let Some(last) = text.lines.last_mut() {
            last.push_span(Span::styled("▏", Style::default().fg(theme.status_mode_insert)));
        }
    }
    frame.render_widget(
        Paragraph::new(text)
            .block(panel_block(title, editing, theme))
            .wrap(Wrap { trim: false }),
        doc_area,
    );
}
