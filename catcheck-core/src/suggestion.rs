//! Suggestion extraction from change markup.
//!
//! Only `change` spans become suggestions; `add` and `del` spans are ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<change original="([^"]+)">([^<]+)</change>"#).expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Change,
}

/// One proposed replacement of an `original` substring by `suggested`.
///
/// Suggestions are only unique by position in the list they live in; two
/// identical pairs extracted from the same markup are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub original: String,
    pub suggested: String,
}

impl Suggestion {
    pub fn change(original: impl Into<String>, suggested: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Change,
            original: original.into(),
            suggested: suggested.into(),
        }
    }
}

/// Extracts suggestions from `markup` in left-to-right order.
///
/// Spans whose replacement equals the original are skipped. No deduplication
/// is performed.
pub fn extract(markup: &str) -> Vec<Suggestion> {
    CHANGE
        .captures_iter(markup)
        .filter(|caps| caps[1] != caps[2])
        .map(|caps| Suggestion::change(&caps[1], &caps[2]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_change_yields_one_suggestion() {
        let found = extract(r#"x <change original="A">B</change> y"#);
        assert_eq!(found, vec![Suggestion::change("A", "B")]);
    }

    #[test]
    fn no_op_change_is_suppressed() {
        assert!(extract(r#"<change original="A">A</change>"#).is_empty());
    }

    #[test]
    fn add_and_del_are_ignored() {
        assert!(extract("<add>new</add> <del>old</del>").is_empty());
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let markup = r#"<change original="a">b</change> <change original="c">d</change> <change original="a">b</change>"#;
        let found = extract(markup);
        assert_eq!(
            found,
            vec![
                Suggestion::change("a", "b"),
                Suggestion::change("c", "d"),
                Suggestion::change("a", "b"),
            ]
        );
    }

    #[test]
    fn serializes_with_lowercase_kind() {
        let json = serde_json::to_value(Suggestion::change("a", "b")).expect("serialize");
        assert_eq!(json["kind"], "change");
        assert_eq!(json["suggested"], "b");
    }
}
