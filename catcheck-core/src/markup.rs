//! Change-markup parser.
//!
//! The assistant marks its edits with pseudo-XML tags interleaved with plain
//! text: `<add>…</add>`, `<del>…</del>` and `<change original="…">…</change>`.
//! Tags are never nested. [`parse`] turns such a string into a flat sequence of
//! [`ChangeRun`]s in one left-to-right scan; the tags themselves never appear in
//! the output.
//!
//! The parser does not validate anything. An unmatched closing tag resets its
//! flag, an unterminated opening tag leaves its flag set until the end of the
//! input, and unknown tags are dropped.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[^>]+>").expect("static regex"));
static ORIGINAL_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"original="([^"]*)""#).expect("static regex"));
static CHANGE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<change[^>]*>(.*?)</change>").expect("static regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// What happened to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Plain,
    Added,
    Deleted,
    Changed,
}

/// One contiguous run of text sharing a single change kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRun {
    pub text: String,
    pub kind: ChangeKind,
    /// The replaced text for `Changed` runs; `None` for every other kind.
    pub original_value: Option<String>,
}

impl ChangeRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ChangeKind::Plain,
            original_value: None,
        }
    }
}

/// Region flags carried across the scan.
#[derive(Debug, Default)]
struct ScanState {
    deleted: bool,
    added: bool,
    change_original: String,
}

impl ScanState {
    fn apply_tag(&mut self, tag: &str) {
        let closing = tag.starts_with("</");
        let name: String = tag
            .trim_start_matches('<')
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match (name.as_str(), closing) {
            ("del", false) => self.deleted = true,
            ("del", true) => self.deleted = false,
            ("add", false) => self.added = true,
            ("add", true) => self.added = false,
            ("change", false) => {
                if let Some(caps) = ORIGINAL_ATTR.captures(tag) {
                    self.change_original = caps[1].to_owned();
                }
            }
            ("change", true) => self.change_original.clear(),
            _ => {}
        }
    }

    fn classify(&self, text: &str) -> ChangeRun {
        if self.deleted {
            ChangeRun {
                text: text.to_owned(),
                kind: ChangeKind::Deleted,
                original_value: None,
            }
        } else if !self.change_original.is_empty() {
            ChangeRun {
                text: text.to_owned(),
                kind: ChangeKind::Changed,
                original_value: Some(self.change_original.clone()),
            }
        } else if self.added {
            ChangeRun {
                text: text.to_owned(),
                kind: ChangeKind::Added,
                original_value: None,
            }
        } else {
            ChangeRun::plain(text)
        }
    }
}

/// Parses change markup into an ordered sequence of runs.
///
/// Concatenating the `text` of the returned runs yields the input with every
/// tag removed. Empty text between adjacent tags produces no run, so an empty
/// input yields an empty vector.
pub fn parse(markup: &str) -> Vec<ChangeRun> {
    let mut runs = Vec::new();
    let mut state = ScanState::default();
    let mut cursor = 0;

    for tag in TAG.find_iter(markup) {
        let text = &markup[cursor..tag.start()];
        if !text.is_empty() {
            runs.push(state.classify(text));
        }
        state.apply_tag(tag.as_str());
        cursor = tag.end();
    }

    let tail = &markup[cursor..];
    if !tail.is_empty() {
        runs.push(state.classify(tail));
    }
    runs
}

/// Returns `true` when `text` contains at least one markup tag.
pub fn has_markup(text: &str) -> bool {
    TAG.is_match(text)
}

/// Removes every tag and keeps all inner text, including deleted spans.
///
/// This is the copy a result card hands to the user when entering edit mode.
pub fn strip_tags(markup: &str) -> String {
    TAG.replace_all(markup, "").into_owned()
}

/// Normalizes suggested text before it is written back to the spreadsheet.
///
/// `change` spans collapse to their replacement text, all remaining tags are
/// removed, and whitespace runs collapse to a single space.
pub fn clean_text(markup: &str) -> String {
    let unwrapped = CHANGE_SPAN.replace_all(markup, "$1");
    let untagged = ANY_TAG.replace_all(&unwrapped, "");
    WHITESPACE.replace_all(&untagged, " ").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(runs: &[ChangeRun]) -> String {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn plain_text_is_one_plain_run() {
        assert_eq!(parse("plain"), vec![ChangeRun::plain("plain")]);
    }

    #[test]
    fn empty_input_yields_no_runs() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn deleted_region_then_plain() {
        let runs = parse("<del>gone</del>kept");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].kind, ChangeKind::Deleted);
        assert_eq!(runs[0].text, "gone");
        assert_eq!(runs[1], ChangeRun::plain("kept"));
    }

    #[test]
    fn change_carries_original_value() {
        let runs = parse(r#"<change original="foo">bar</change>"#);
        assert_eq!(
            runs,
            vec![ChangeRun {
                text: "bar".into(),
                kind: ChangeKind::Changed,
                original_value: Some("foo".into()),
            }]
        );
    }

    #[test]
    fn added_region_is_marked() {
        let runs = parse("a <add>new</add> b");
        let kinds: Vec<_> = runs.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, [ChangeKind::Plain, ChangeKind::Added, ChangeKind::Plain]);
        assert_eq!(runs[1].text, "new");
    }

    #[test]
    fn concatenation_reproduces_stripped_text() {
        let markup = r#"The <del>old </del><add>new </add>producct <change original="producct">product</change> is red."#;
        let runs = parse(markup);
        assert_eq!(texts(&runs), strip_tags(markup));
        assert_eq!(texts(&runs), "The old new producct product is red.");
    }

    #[test]
    fn unterminated_opening_tag_keeps_flag_to_end() {
        let runs = parse("ok <del>rest of text");
        assert_eq!(runs.last().map(|r| r.kind), Some(ChangeKind::Deleted));
        assert_eq!(runs.last().map(|r| r.text.as_str()), Some("rest of text"));
    }

    #[test]
    fn unmatched_closing_tag_resets_flag_silently() {
        let runs = parse("a</del>b</change>c");
        assert!(runs.iter().all(|r| r.kind == ChangeKind::Plain));
        assert_eq!(texts(&runs), "abc");
    }

    #[test]
    fn unknown_tags_are_dropped() {
        let runs = parse("<b>bold</b> text");
        assert_eq!(texts(&runs), "bold text");
        assert!(runs.iter().all(|r| r.kind == ChangeKind::Plain));
    }

    #[test]
    fn change_with_empty_original_renders_plain() {
        let runs = parse(r#"<change original="">x</change>"#);
        assert_eq!(runs, vec![ChangeRun::plain("x")]);
    }

    #[test]
    fn clean_text_unwraps_changes_and_collapses_whitespace() {
        let markup = "  Red <change original=\"producct\">product</change>\n\n with <b>tags</b>  ";
        assert_eq!(clean_text(markup), "Red product with tags");
    }

    #[test]
    fn has_markup_detects_tags() {
        assert!(has_markup("a <del>b</del>"));
        assert!(!has_markup("plain text, 5 > 3"));
    }
}
