//! Change markup as ratatui text.

use catcheck_core::render::{render_markup, Decoration, RunStyle};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use crate::theme::Theme;

/// Terminal style for a decorated run. Terminals have no wavy underline, so
/// changed text gets a colored underline instead.
pub fn decoration_style(decoration: &Decoration, theme: &Theme) -> Style {
    match decoration.style {
        RunStyle::Plain => Style::default(),
        RunStyle::Added => Style::default()
            .bg(theme.added_bg)
            .add_modifier(Modifier::UNDERLINED),
        RunStyle::Deleted => Style::default()
            .fg(theme.deleted_fg)
            .add_modifier(Modifier::CROSSED_OUT),
        RunStyle::Changed => Style::default()
            .fg(theme.changed_fg)
            .underline_color(theme.changed_fg)
            .add_modifier(Modifier::UNDERLINED),
    }
}

/// Renders `markup` into lines. With `captions`, each decorated run is
/// followed by its caption in brackets.
pub fn markup_text(markup: &str, theme: &Theme, captions: bool) -> Text<'static> {
    let caption_style = Style::default()
        .fg(theme.caption)
        .add_modifier(Modifier::ITALIC);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for run in render_markup(markup) {
        let style = decoration_style(&run.decoration, theme);
        let mut parts = run.text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                current.push(Span::styled(part.to_owned(), style));
            }
            if parts.peek().is_some() {
                lines.push(Line::from(std::mem::take(&mut current)));
            }
        }
        if captions {
            if let Some(caption) = run.decoration.caption {
                current.push(Span::styled(format!(" [{caption}]"), caption_style));
            }
        }
    }
    lines.push(Line::from(current));
    Text::from(lines)
}
