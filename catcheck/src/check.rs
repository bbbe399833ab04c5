//! `catcheck check`: analyze one text without the TUI.
//!
//! Prints the annotated text to stdout, ANSI-styled when stdout is a
//! terminal, followed by the list of suggestions. With `--accept-all` every
//! suggestion is applied in order and the resulting text is printed instead.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use catcheck_core::client::BackendClient;
use catcheck_core::markup;
use catcheck_core::render::{render_markup, RenderedRun, RunStyle};
use catcheck_core::review::{AcceptOutcome, ReviewSession};
use catcheck_core::suggestion;
use crossterm::style::Stylize;
use tokio::io::AsyncReadExt;

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// File to check, or `-` for stdin.
    pub input: PathBuf,
    /// Assistant id used for the analysis.
    #[arg(long)]
    pub assistant: String,
    /// Apply every suggestion and print the corrected text.
    #[arg(long)]
    pub accept_all: bool,
}

async fn read_input(path: &PathBuf) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(path).await
    }
}

pub async fn run(client: &BackendClient, args: CheckArgs) -> catcheck_core::Result<()> {
    let text = read_input(&args.input).await?;
    if text.trim().is_empty() {
        return Err(catcheck_core::Error::config("nothing to check: input is empty"));
    }

    tracing::info!(chars = text.len(), assistant = %args.assistant, "checking text");
    let improved = client.analyze_text(&text, &args.assistant).await?;

    let mut out = std::io::stdout().lock();
    if args.accept_all {
        let corrected = accept_all(&text, &improved)?;
        writeln!(out, "{corrected}")?;
        return Ok(());
    }

    let styled = out.is_terminal();
    for run in render_markup(&improved) {
        write!(out, "{}", paint(&run, styled))?;
    }
    writeln!(out)?;

    let suggestions = suggestion::extract(&improved);
    if suggestions.is_empty() && !markup::has_markup(&improved) {
        writeln!(out, "\nNo changes suggested.")?;
    }
    for (i, s) in suggestions.iter().enumerate() {
        writeln!(out, "{:>3}. {} → {}", i + 1, s.original, s.suggested)?;
    }
    Ok(())
}

fn paint(run: &RenderedRun, styled: bool) -> String {
    if !styled {
        return match run.decoration.style {
            RunStyle::Deleted => String::new(),
            _ => run.text.clone(),
        };
    }
    let text = run.text.as_str();
    match run.decoration.style {
        RunStyle::Plain => text.to_owned(),
        RunStyle::Added => text.on_dark_green().underlined().to_string(),
        RunStyle::Deleted => text.red().crossed_out().to_string(),
        RunStyle::Changed => text.yellow().underlined().to_string(),
    }
}

/// Applies every suggestion in `markup` to `original`, first to last.
fn accept_all(original: &str, markup: &str) -> catcheck_core::Result<String> {
    let mut session = ReviewSession::new();
    session.load(original, markup);
    while !session.pending().is_empty() {
        if let AcceptOutcome::Stale { suggestion } = session.accept(0)? {
            eprintln!("skipped: '{}' not found in the text", suggestion.original);
        }
    }
    Ok(session.document().to_owned())
}

#[cfg(test)]
mod tests {
    use catcheck_core::render::Decoration;

    use super::*;

    #[test]
    fn accept_all_applies_in_order() {
        let out = accept_all(
            "Teh producct is red",
            r#"<change original="Teh">The</change> <change original="producct">product</change> is red"#,
        )
        .unwrap();
        assert_eq!(out, "The product is red");
    }

    #[test]
    fn accept_all_without_suggestions_keeps_text() {
        assert_eq!(accept_all("fine", "fine").unwrap(), "fine");
    }

    #[test]
    fn unstyled_output_drops_deleted_runs() {
        let run = RenderedRun {
            text: "gone".into(),
            decoration: Decoration {
                style: RunStyle::Deleted,
                caption: None,
            },
        };
        assert_eq!(paint(&run, false), "");
    }
}
