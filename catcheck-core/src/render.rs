//! Annotated-text renderer.
//!
//! Maps each [`ChangeRun`] to a [`Decoration`]: the visual style a frontend
//! should apply and the caption it should show alongside the text. This is a
//! pure function of the parser output; frontends translate `RunStyle` into
//! their own primitives (ratatui styles in the TUI, ANSI attributes in the
//! headless `check` command).

use crate::markup::{ChangeKind, ChangeRun};

/// Caption attached to deleted runs.
pub const DELETED_CAPTION: &str = "deleted text";
/// Caption attached to added runs.
pub const ADDED_CAPTION: &str = "added text";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStyle {
    /// Unstyled text.
    Plain,
    /// Highlighted background with a solid underline.
    Added,
    /// Struck-through text.
    Deleted,
    /// Wavy underline.
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub style: RunStyle,
    pub caption: Option<String>,
}

/// A run paired with its decoration, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRun {
    pub text: String,
    pub decoration: Decoration,
}

/// Returns the decoration for a single run.
pub fn decorate(run: &ChangeRun) -> Decoration {
    match run.kind {
        ChangeKind::Plain => Decoration {
            style: RunStyle::Plain,
            caption: None,
        },
        ChangeKind::Added => Decoration {
            style: RunStyle::Added,
            caption: Some(ADDED_CAPTION.to_owned()),
        },
        ChangeKind::Deleted => Decoration {
            style: RunStyle::Deleted,
            caption: Some(DELETED_CAPTION.to_owned()),
        },
        ChangeKind::Changed => Decoration {
            style: RunStyle::Changed,
            caption: Some(format!(
                "Originally: \"{}\"",
                run.original_value.as_deref().unwrap_or_default()
            )),
        },
    }
}

/// Decorates every run in order.
pub fn render_runs(runs: &[ChangeRun]) -> Vec<RenderedRun> {
    runs.iter()
        .map(|run| RenderedRun {
            text: run.text.clone(),
            decoration: decorate(run),
        })
        .collect()
}

/// Parses `markup` and decorates the result in one step.
pub fn render_markup(markup: &str) -> Vec<RenderedRun> {
    render_runs(&crate::markup::parse(markup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    #[test]
    fn plain_run_is_unstyled_without_caption() {
        let d = decorate(&ChangeRun::plain("x"));
        assert_eq!(d.style, RunStyle::Plain);
        assert_eq!(d.caption, None);
    }

    #[test]
    fn deleted_run_is_struck_with_caption() {
        let rendered = render_markup("<del>gone</del>");
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].decoration.style, RunStyle::Deleted);
        assert_eq!(rendered[0].decoration.caption.as_deref(), Some("deleted text"));
    }

    #[test]
    fn changed_run_quotes_original_verbatim() {
        let rendered = render_markup(r#"<change original="foo &quot;bar">baz</change>"#);
        assert_eq!(rendered[0].decoration.style, RunStyle::Changed);
        assert_eq!(
            rendered[0].decoration.caption.as_deref(),
            Some("Originally: \"foo &quot;bar\"")
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let markup = r#"a <add>b</add> <del>c</del> <change original="d">e</change>"#;
        let runs = parse(markup);
        assert_eq!(render_runs(&runs), render_runs(&runs));
        let styles: Vec<_> = render_runs(&runs).iter().map(|r| r.decoration.style).collect();
        assert_eq!(
            styles,
            [
                RunStyle::Plain,
                RunStyle::Added,
                RunStyle::Plain,
                RunStyle::Deleted,
                RunStyle::Plain,
                RunStyle::Changed,
            ]
        );
    }
}
