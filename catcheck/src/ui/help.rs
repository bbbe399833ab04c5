//! Help overlay, drawn over the page with `Clear` first.

use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    // Too narrow for the key column.
    if frame.area().width < 50 || frame.area().height < 8 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to close ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Setup",
        &[
            ("s", "Enter a spreadsheet id (Up/Down: saved sheets)"),
            ("R", "Reload the sheet"),
            ("p / P", "Next / previous product-name column"),
            ("c / C", "Next / previous analysis column"),
            ("a / A", "Next / previous assistant"),
            ("r", "Analyze the sheet"),
            ("x", "Stop the running analysis"),
            ("L", "Load saved results"),
        ],
    ),
    (
        "Results",
        &[
            ("j / k", "Select next / previous result"),
            ("J / K", "Scroll the detail"),
            ("m", "Load more results"),
            ("< / >", "Previous / next page of saved results"),
            ("e", "Edit the suggested text (Ctrl-s save, Esc cancel)"),
            ("y", "Confirm: write the text back to the sheet"),
            ("n", "Reject the result"),
            ("f", "Send feedback"),
            ("v / Enter", "Review suggestions one by one"),
        ],
    ),
    (
        "Review",
        &[
            ("j / k", "Select suggestion"),
            ("y / Enter", "Accept"),
            ("n", "Reject"),
            ("u", "Undo the last step"),
            ("e", "Edit the document by hand (Ctrl-s apply)"),
            ("w", "Save the document to the result"),
            ("Esc", "Back to results"),
        ],
    ),
    (
        "General",
        &[
            ("Tab / S-Tab", "Next / previous page"),
            ("1-4", "Jump to page"),
            ("b", "Reload the backlog"),
            ("?", "Toggle this help"),
            ("q", "Quit"),
        ],
    ),
];

fn help_text(theme: &Theme) -> Text<'static> {
    let heading = Style::default()
        .fg(theme.tab_active)
        .add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();
    for (section, keys) in SECTIONS {
        lines.push(Line::styled(*section, heading));
        for (key, what) in *keys {
            lines.push(Line::raw(format!("  {key:<13}{what}")));
        }
        lines.push(Line::raw(""));
    }
    Text::from(lines)
}
