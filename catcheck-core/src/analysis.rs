//! Analysis results and the result-card model.
//!
//! Backend payloads are normalized at deserialization: `product_name` arrives
//! either as a bare string or as `{ "original": "…" }` and always lands in a
//! single [`ProductName`]. A [`ResultCard`] wraps one result for review: it
//! tracks the current version (always the last entry of `versions`), the
//! manual-edit buffer, and exposes both version-update policies explicitly.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use similar::{ChangeTag, TextDiff};
use uuid::Uuid;

use crate::markup;
use crate::review::ReviewSession;

/// Prompt recorded on versions synthesized from a fresh analysis.
pub const INITIAL_PROMPT: &str = "Grammar";
/// Prompt recorded on versions appended by a manual edit.
pub const MANUAL_EDIT_PROMPT: &str = "Manual edit";

/// Backend identifier of a persisted analysis response.
pub type ResponseId = i64;

/// Product name, normalized from the backend's two shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProductName(pub String);

impl ProductName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name for display; empty names show as "Unknown product".
    pub fn display(&self) -> &str {
        if self.0.trim().is_empty() {
            "Unknown product"
        } else {
            &self.0
        }
    }
}

impl<'de> Deserialize<'de> for ProductName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Plain(String),
            Wrapped {
                #[serde(default)]
                original: Option<String>,
            },
            Missing,
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Plain(name) => ProductName(name),
            Shape::Wrapped { original } => ProductName(original.unwrap_or_default()),
            Shape::Missing => ProductName::default(),
        })
    }
}

/// One correction listed by the assistant alongside its markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNote {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub corrected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescription {
    #[serde(default, deserialize_with = "null_as_default")]
    pub original: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improved: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: Vec<ChangeNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    #[serde(default = "first_version")]
    pub version_number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improved_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: Vec<ChangeNote>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

fn first_version() -> u32 {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl ResultStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

/// One analyzed catalog item, as streamed by `/analyze` or listed by
/// `/get_last_responses`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResponseId>,
    #[serde(default)]
    pub product_name: ProductName,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_description: ProductDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub versions: Vec<Version>,
    /// Prompt label attached to streamed results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Sheet row the streamed result was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
}

impl AnalysisResult {
    /// Ensures the result has at least one version, oldest first.
    ///
    /// Streamed results carry no version history; they get a single version 1
    /// built from `product_description.improved` and its change notes.
    /// `/get_last_responses` lists versions newest first, so they are sorted.
    pub fn normalized(mut self) -> Self {
        self.versions.sort_by_key(|v| v.version_number);
        if self.versions.is_empty() {
            self.versions.push(Version {
                version_number: 1,
                improved_text: self.product_description.improved.clone(),
                changes: self.product_description.changes.clone(),
                prompt: self
                    .prompt
                    .clone()
                    .unwrap_or_else(|| INITIAL_PROMPT.to_owned()),
                created_at: None,
            });
        }
        self
    }
}

/// How a saved manual edit is recorded in the version history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPolicy {
    /// Replace the text of the current (last) version in place.
    #[default]
    Overwrite,
    /// Push a new version after the current one.
    Append,
}

/// One word-level difference segment between two texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub tag: DiffTag,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    Equal,
    Removed,
    Added,
}

/// Word-level diff of `old` against `new`, in reading order.
pub fn word_diff(old: &str, new: &str) -> Vec<DiffSegment> {
    let diff = TextDiff::from_words(old, new);
    let mut segments: Vec<DiffSegment> = Vec::new();
    for change in diff.iter_all_changes() {
        let tag = match change.tag() {
            ChangeTag::Equal => DiffTag::Equal,
            ChangeTag::Delete => DiffTag::Removed,
            ChangeTag::Insert => DiffTag::Added,
        };
        match segments.last_mut() {
            Some(last) if last.tag == tag => last.text.push_str(change.value()),
            _ => segments.push(DiffSegment {
                tag,
                text: change.value().to_owned(),
            }),
        }
    }
    segments
}

/// One reviewable analysis result.
#[derive(Debug, Clone)]
pub struct ResultCard {
    /// Local identity, stable even before the backend assigns an id.
    pub key: Uuid,
    pub result: AnalysisResult,
    /// Row of the spreadsheet this result belongs to, when known.
    pub row_index: Option<usize>,
    /// Catalog item number looked up from the sheet, when known.
    pub item_number: Option<String>,
    editing: Option<String>,
}

impl ResultCard {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            key: Uuid::new_v4(),
            row_index: result.row_index,
            result: result.normalized(),
            item_number: None,
            editing: None,
        }
    }

    pub fn response_id(&self) -> Option<ResponseId> {
        self.result.id
    }

    pub fn product_name(&self) -> &str {
        self.result.product_name.display()
    }

    pub fn original_text(&self) -> &str {
        &self.result.product_description.original
    }

    /// The version shown to the user: always the last one.
    pub fn current_version(&self) -> Option<&Version> {
        self.result.versions.last()
    }

    /// Improved text of the current version; the description's improved text
    /// only when there are no versions at all.
    pub fn current_text(&self) -> &str {
        match self.current_version() {
            Some(version) => &version.improved_text,
            None => &self.result.product_description.improved,
        }
    }

    /// The word diff is only meaningful for text without change markup.
    pub fn shows_word_diff(&self) -> bool {
        !markup::has_markup(self.current_text())
    }

    pub fn changes(&self) -> &[ChangeNote] {
        self.current_version()
            .map(|v| v.changes.as_slice())
            .unwrap_or_default()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes().is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Enters edit mode with a tag-stripped copy of the current text.
    pub fn begin_edit(&mut self) -> &str {
        let stripped = markup::strip_tags(self.current_text());
        self.editing.insert(stripped).as_str()
    }

    pub fn edit_buffer(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.editing.as_mut()
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Leaves edit mode, recording the edited text according to `policy`.
    ///
    /// Returns the version that now holds the edit, or `None` when the card
    /// was not being edited.
    pub fn save_edit(&mut self, policy: VersionPolicy) -> Option<Version> {
        let text = self.editing.take()?;
        let version = match policy {
            VersionPolicy::Overwrite => self.overwrite_current(text),
            VersionPolicy::Append => self.append_version(text, MANUAL_EDIT_PROMPT),
        };
        Some(version.clone())
    }

    /// Replaces the current version's text in place.
    pub fn overwrite_current(&mut self, text: impl Into<String>) -> &Version {
        if self.result.versions.is_empty() {
            self.result = std::mem::take(&mut self.result).normalized();
        }
        let last = self.result.versions.len() - 1;
        let version = &mut self.result.versions[last];
        version.improved_text = text.into();
        version
    }

    /// Pushes a new version after the current one.
    pub fn append_version(&mut self, text: impl Into<String>, prompt: impl Into<String>) -> &Version {
        let next = self
            .current_version()
            .map(|v| v.version_number + 1)
            .unwrap_or(1);
        self.result.versions.push(Version {
            version_number: next,
            improved_text: text.into(),
            changes: Vec::new(),
            prompt: prompt.into(),
            created_at: None,
        });
        &self.result.versions[self.result.versions.len() - 1]
    }

    /// The text written back to the spreadsheet on confirmation.
    pub fn confirm_text(&self) -> String {
        markup::clean_text(self.current_text())
    }

    /// A review session over the original description with the current
    /// version's suggestions pending.
    pub fn review_session(&self) -> ReviewSession {
        let mut session = ReviewSession::new();
        session.load(self.original_text(), self.current_text());
        session
    }

    /// Word diff of the original description against the current text.
    pub fn word_diff(&self) -> Vec<DiffSegment> {
        word_diff(self.original_text(), &markup::strip_tags(self.current_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streamed() -> AnalysisResult {
        serde_json::from_str(
            r#"{
                "status": "completed",
                "row_index": 3,
                "product_name": "Red chair",
                "product_description": {
                    "original": "The producct is red",
                    "improved": "The <change original=\"producct\">product</change> is red",
                    "changes": [{"type": "spelling", "original": "producct", "corrected": "product"}]
                }
            }"#,
        )
        .expect("valid payload")
    }

    #[test]
    fn product_name_accepts_both_shapes() {
        let plain: AnalysisResult = serde_json::from_str(r#"{"product_name": "Chair"}"#).unwrap();
        let wrapped: AnalysisResult =
            serde_json::from_str(r#"{"product_name": {"original": "Chair"}}"#).unwrap();
        let null: AnalysisResult = serde_json::from_str(r#"{"product_name": null}"#).unwrap();
        assert_eq!(plain.product_name, ProductName("Chair".into()));
        assert_eq!(wrapped.product_name, plain.product_name);
        assert_eq!(null.product_name.display(), "Unknown product");
    }

    #[test]
    fn listed_response_keeps_version_history() {
        let listed: AnalysisResult = serde_json::from_str(
            r#"{
                "id": 7,
                "product_name": {"original": "Chair"},
                "product_description": {"original": "a", "improved": "b", "changes": []},
                "analysis_date": "2024-05-01T10:20:30.123456",
                "versions": [
                    {"version_number": 2, "improved_text": "c", "changes": [], "prompt": "Manual edit", "created_at": "2024-05-02T08:00:00"},
                    {"version_number": 1, "improved_text": "b", "changes": [], "prompt": "Initial analysis", "created_at": "2024-05-01T10:20:30"}
                ]
            }"#,
        )
        .unwrap();
        let card = ResultCard::new(listed);
        assert_eq!(card.response_id(), Some(7));
        assert_eq!(card.current_version().map(|v| v.version_number), Some(2));
        assert_eq!(card.current_text(), "c");
    }

    #[test]
    fn streamed_result_gets_initial_version() {
        let card = ResultCard::new(streamed());
        assert_eq!(card.result.versions.len(), 1);
        let v = card.current_version().unwrap();
        assert_eq!(v.version_number, 1);
        assert_eq!(v.prompt, INITIAL_PROMPT);
        assert!(card.has_changes());
        assert_eq!(card.response_id(), None);
        assert_eq!(card.row_index, Some(3));
    }

    #[test]
    fn edit_overwrites_last_version() {
        let mut card = ResultCard::new(streamed());
        assert_eq!(card.begin_edit(), "The product is red");
        card.edit_buffer_mut().unwrap().replace_range(.., "The product is bright red");

        let saved = card.save_edit(VersionPolicy::Overwrite).unwrap();
        assert_eq!(saved.version_number, 1);
        assert_eq!(card.result.versions.len(), 1);
        assert_eq!(card.current_text(), "The product is bright red");
        assert!(!card.is_editing());
    }

    #[test]
    fn edit_can_append_a_version() {
        let mut card = ResultCard::new(streamed());
        card.begin_edit();
        let saved = card.save_edit(VersionPolicy::Append).unwrap();
        assert_eq!(saved.version_number, 2);
        assert_eq!(saved.prompt, MANUAL_EDIT_PROMPT);
        assert_eq!(card.result.versions.len(), 2);
    }

    #[test]
    fn emptied_edit_stays_empty() {
        let mut card = ResultCard::new(streamed());
        card.begin_edit();
        card.edit_buffer_mut().unwrap().clear();
        card.save_edit(VersionPolicy::Overwrite).unwrap();
        assert_eq!(card.current_text(), "");
        assert_eq!(card.confirm_text(), "");
    }

    #[test]
    fn word_diff_only_for_plain_text() {
        let mut card = ResultCard::new(streamed());
        assert!(!card.shows_word_diff());
        card.begin_edit();
        card.save_edit(VersionPolicy::Overwrite).unwrap();
        assert!(card.shows_word_diff());
    }

    #[test]
    fn save_without_edit_is_none() {
        let mut card = ResultCard::new(streamed());
        assert_eq!(card.save_edit(VersionPolicy::Overwrite), None);
    }

    #[test]
    fn confirm_text_is_cleaned() {
        let card = ResultCard::new(streamed());
        assert_eq!(card.confirm_text(), "The product is red");
    }

    #[test]
    fn review_session_targets_original() {
        let card = ResultCard::new(streamed());
        let mut session = card.review_session();
        session.accept(0).unwrap();
        assert_eq!(session.document(), "The product is red");
    }

    #[test]
    fn word_diff_marks_replaced_words() {
        let segments = word_diff("the red chair", "the blue chair");
        let tags: Vec<_> = segments.iter().map(|s| s.tag).collect();
        assert!(tags.contains(&DiffTag::Removed));
        assert!(tags.contains(&DiffTag::Added));
        let rebuilt_new: String = segments
            .iter()
            .filter(|s| s.tag != DiffTag::Removed)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(rebuilt_new, "the blue chair");
    }
}
