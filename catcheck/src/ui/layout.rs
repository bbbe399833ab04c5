//! Frame layout: a tab bar on top, the active page, and a one-row status bar.
//!
//! Pure layout arithmetic plus the two pieces of chrome every page shares.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Tabs},
    Frame,
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Returns `[tabs, main, status_bar]` for the current frame.
pub fn compute_layout(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area)
}

/// Inner `Rect` of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

/// Bordered panel block; thick border when focused.
///
/// `Fuzzy` merging because `Exact` draws wrong junctions where thick and
/// plain borders meet.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused {
        BorderType::Thick
    } else {
        BorderType::Plain
    };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

pub fn render_tabs(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let titles = Tab::ALL.iter().enumerate().map(|(i, tab)| {
        let title = match tab {
            Tab::Results if !state.cards.is_empty() => {
                format!("{} {} ({})", i + 1, tab.title(), state.cards.len())
            }
            Tab::Review if state.review.is_some() => format!("{} {} *", i + 1, tab.title()),
            _ => format!("{} {}", i + 1, tab.title()),
        };
        Line::from(title)
    });
    let tabs = Tabs::new(titles)
        .select(state.tab.index())
        .style(Style::default().fg(theme.dim))
        .highlight_style(
            Style::default()
                .fg(theme.tab_active)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");
    frame.render_widget(tabs, area);
}

/// Mode, selection summary, progress, and the current notification.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::EditCard | Mode::EditDocument => (" EDIT ", theme.status_mode_insert),
        Mode::Feedback => (" FEEDBACK ", theme.status_mode_insert),
        Mode::SheetInput => (" SHEET ", theme.status_mode_insert),
        Mode::Normal | Mode::HelpOverlay | Mode::ConfirmQuit => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    if state.mode.is_text_input() && state.mode != Mode::EditCard {
        spans.push(Span::raw(format!(" {}▏", state.input)));
        if let Some(saved) = state.saved_sheet_for_input().filter(|_| state.mode == Mode::SheetInput) {
            spans.push(Span::styled(
                format!(" {} ", saved.name),
                Style::default().fg(theme.dim),
            ));
        }
    } else {
        spans.push(Span::raw(format!(" {} ", selection_summary(state))));
    }

    let spinner = SPINNER[state.spinner % SPINNER.len()];
    if let Some((received, expected)) = state.progress() {
        spans.push(Span::styled(
            format!(" {spinner} analyzing {received}/{expected} "),
            Style::default().fg(theme.info),
        ));
    } else if state.sheet_loading || state.responses_loading {
        spans.push(Span::styled(
            format!(" {spinner} loading "),
            Style::default().fg(theme.info),
        ));
    }

    if state.mode == Mode::ConfirmQuit {
        spans.push(Span::styled(
            " Work still running. Quit anyway? (y/n) ",
            Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
        ));
    } else if let Some(notification) = state.notification() {
        spans.push(Span::styled(
            format!(" {} ", notification.message),
            Style::default()
                .fg(theme.severity(notification.severity))
                .add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

fn selection_summary(state: &AppState) -> String {
    let sheet = state.sheet_id.as_deref().unwrap_or("no sheet");
    let product = state.product_column.as_deref().unwrap_or("-");
    let analysis = state.analysis_column.as_deref().unwrap_or("-");
    let assistant = state
        .selected_assistant()
        .map(|a| a.name.as_str())
        .unwrap_or("-");
    format!("{sheet} │ {product} → {analysis} │ {assistant}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_reserves_one_row_for_tabs_and_status() {
        let [tabs, main, status] = compute_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(tabs.height, 1);
        assert_eq!(status.height, 1);
        assert_eq!(status.y, 23);
        assert_eq!(main.height, 22);
    }

    #[test]
    fn inner_rect_strips_borders() {
        let inner = inner_rect(Rect::new(0, 0, 10, 5));
        assert_eq!(inner, Rect::new(1, 1, 8, 3));
    }
}
