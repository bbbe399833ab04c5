//! Results page: the card list on the left, the selected card on the right.

use catcheck_core::analysis::{DiffTag, ResultCard};
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
use crate::ui::markup::markup_text;

pub fn render_results(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Fill(1)]).areas(area);
    render_list(frame, list_area, state, theme);
    render_detail(frame, detail_area, state, theme);
}

fn list_title(state: &AppState) -> String {
    let mut title = format!(" Results {}/{} ", state.visible_cards().len(), state.cards.len());
    if let Some((page, total)) = state.responses_page {
        title.push_str(&format!("· page {page}/{} ", total.max(1)));
    }
    title
}

fn render_list(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel_block(list_title(state), state.mode == Mode::Normal, theme);

    if state.cards.is_empty() {
        let hint = if state.analysis_loading {
            "Waiting for the first result…"
        } else {
            "No results. Press r to analyze the sheet or L to load saved results."
        };
        frame.render_widget(
            Paragraph::new(Line::styled(hint, Style::default().fg(theme.dim)))
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
        return;
    }

    let mut items: Vec<ListItem> = state
        .visible_cards()
        .iter()
        .map(|card| card_item(card, state, theme))
        .collect();
    if state.has_hidden_cards() {
        let hidden = state.cards.len() - state.visible_cards().len();
        items.push(ListItem::new(Line::styled(
            format!("  m: load more ({hidden} hidden)"),
            Style::default().fg(theme.dim),
        )));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme.selection_bg).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn card_item<'a>(card: &'a ResultCard, state: &AppState, theme: &Theme) -> ListItem<'a> {
    let marker = if state.busy.contains(&card.key) {
        Span::styled("… ", Style::default().fg(theme.info))
    } else if card.response_id().is_none() {
        Span::styled("○ ", Style::default().fg(theme.dim))
    } else {
        Span::styled("● ", Style::default().fg(theme.success))
    };
    let mut spans = vec![marker, Span::raw(card.product_name())];
    if let Some(item) = &card.item_number {
        spans.push(Span::styled(format!("  #{item}"), Style::default().fg(theme.dim)));
    }
    if let Some(version) = card.current_version() {
        if version.version_number > 1 {
            spans.push(Span::styled(
                format!("  v{}", version.version_number),
                Style::default().fg(theme.dim),
            ));
        }
    }
    ListItem::new(Line::from(spans))
}

fn heading(text: &str, theme: &Theme) -> Line<'static> {
    Line::styled(
        text.to_owned(),
        Style::default()
            .fg(theme.tab_active)
            .add_modifier(Modifier::BOLD),
    )
}

fn render_detail(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Some(card) = state.edited_card().or_else(|| state.selected_card()) else {
        frame.render_widget(panel_block(" Detail ", false, theme), area);
        return;
    };

    let editing = state.mode == Mode::EditCard;
    let title = match &card.item_number {
        Some(item) => format!(" {} · #{} ", card.product_name(), item),
        None => format!(" {} ", card.product_name()),
    };
    let block = panel_block(title, editing, theme);

    let mut text = Text::default();
    text.push_line(heading("Original", theme));
    for line in card.original_text().lines() {
        text.push_line(Line::raw(line.to_owned()));
    }
    text.push_line(Line::raw(""));

    if let Some(buffer) = card.edit_buffer() {
        text.push_line(heading("Editing (Ctrl-s save, Esc cancel)", theme));
        let mut lines: Vec<Line> = buffer.split('\n').map(|l| Line::raw(l.to_owned())).collect();
        if let Some(last) = lines.last_mut() {
            last.push_span(Span::styled("▏", Style::default().fg(theme.status_mode_insert)));
        }
        for line in lines {
            text.push_line(line);
        }
    } else {
        let prompt = card
            .current_version()
            .map(|v| format!("Suggested · v{} · {}", v.version_number, v.prompt))
            .unwrap_or_else(|| "Suggested".to_owned());
        text.push_line(heading(&prompt, theme));
        for line in markup_text(card.current_text(), theme, true).lines {
            text.push_line(line);
        }
    }

    if card.has_changes() {
        text.push_line(Line::raw(""));
        text.push_line(heading("Changes", theme));
        for change in card.changes() {
            let mut spans = vec![
                Span::raw("  "),
                Span::styled(change.original.clone(), Style::default().fg(theme.diff_removed)),
                Span::raw(" → "),
                Span::styled(change.corrected.clone(), Style::default().fg(theme.diff_added)),
            ];
            if let Some(explanation) = change.explanation.as_deref().filter(|e| !e.is_empty()) {
                spans.push(Span::styled(
                    format!("  {explanation}"),
                    Style::default().fg(theme.dim),
                ));
            }
            text.push_line(Line::from(spans));
        }
    }

    if card.shows_word_diff() {
        text.push_line(Line::raw(""));
        text.push_line(heading("Word diff", theme));
        text.push_line(diff_line(card, theme));
    }

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.detail_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn diff_line(card: &ResultCard, theme: &Theme) -> Line<'static> {
    let spans: Vec<Span<'static>> = card
        .word_diff()
        .into_iter()
        .map(|segment| {
            let style = match segment.tag {
                DiffTag::Equal => Style::default(),
                DiffTag::Removed => Style::default()
                    .fg(theme.diff_removed)
                    .add_modifier(Modifier::CROSSED_OUT),
                DiffTag::Added => Style::default()
                    .fg(theme.diff_added)
                    .add_modifier(Modifier::UNDERLINED),
            };
            Span::styled(segment.text.replace('\n', " "), style)
        })
        .collect();
    Line::from(spans)
}
