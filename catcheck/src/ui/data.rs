//! Sheet page: the loaded spreadsheet as a table.

use catcheck_core::sheet::cell_text;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_data(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Some(sheet) = &state.sheet else {
        let hint = if state.sheet_loading {
            "Loading sheet…"
        } else {
            "No sheet loaded. Press s to enter a spreadsheet id."
        };
        frame.render_widget(
            Paragraph::new(Line::styled(hint, Style::default().fg(theme.dim)))
                .block(panel_block(" Sheet ", false, theme)),
            area,
        );
        return;
    };

    let mut title = format!(" {} · {} rows ", state.sheet_id.as_deref().unwrap_or(""), sheet.rows.len());
    if let Some(updated) = sheet.last_updated {
        title.push_str(&format!("· updated {} ", updated.format("%Y-%m-%d %H:%M")));
    }

    let header = Row::new(sheet.columns.iter().map(|c| {
        let style = if Some(c) == state.product_column.as_ref() || Some(c) == state.analysis_column.as_ref() {
            Style::default().fg(theme.tab_active).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(c.as_str()).style(style)
    }));
    let rows = sheet.rows.iter().map(|row| {
        Row::new(
            sheet
                .columns
                .iter()
                .map(|c| Cell::from(cell_text(row, c).replace('\n', " "))),
        )
    });
    let widths = vec![Constraint::Fill(1); sheet.columns.len().max(1)];

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel_block(title, true, theme))
        .row_highlight_style(Style::default().bg(theme.selection_bg));
    let mut table_state = TableState::default().with_selected(Some(state.data_scroll));
    frame.render_stateful_widget(table, area, &mut table_state);
}
