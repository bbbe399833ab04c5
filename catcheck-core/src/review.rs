//! Review session: the editable document plus its outstanding suggestions.
//!
//! A session is `Idle` until [`ReviewSession::load`] installs a document and the
//! suggestions extracted from one analysis response. Accepting a suggestion
//! splices the replacement into the document at the first occurrence of the
//! original text anywhere in the document; rejecting only drops it from the
//! list. Every mutation re-prunes suggestions whose original text no longer
//! occurs, so the pending list never points at text that is gone.

use thiserror::Error;

use crate::suggestion::{self, Suggestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("no document is loaded for review")]
    NotLoaded,
    #[error("no pending suggestion at index {index}")]
    NoSuchSuggestion { index: usize },
    #[error("nothing to undo")]
    NothingToUndo,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// No document loaded.
    #[default]
    Idle,
    /// Document and suggestions freshly loaded from one analysis response.
    Loaded,
    /// At least one accept, reject or hand edit has been applied.
    Editing,
}

/// Result of accepting a suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The original text was found and replaced.
    Applied { suggestion: Suggestion, offset: usize },
    /// The original text no longer occurs; the suggestion was dropped and the
    /// document left untouched.
    Stale { suggestion: Suggestion },
}

#[derive(Debug, Clone)]
struct Snapshot {
    document: String,
    pending: Vec<Suggestion>,
    state: ReviewState,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    state: ReviewState,
    document: String,
    pending: Vec<Suggestion>,
    undo: Option<Snapshot>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole session with `document` and the suggestions found
    /// in `markup`. Prior suggestions and undo state are discarded.
    pub fn load(&mut self, document: impl Into<String>, markup: &str) {
        self.load_suggestions(document, suggestion::extract(markup));
    }

    /// Like [`load`](Self::load) with an already extracted suggestion list.
    pub fn load_suggestions(&mut self, document: impl Into<String>, suggestions: Vec<Suggestion>) {
        self.document = document.into();
        self.pending = suggestions;
        self.undo = None;
        self.state = ReviewState::Loaded;
        tracing::debug!(pending = self.pending.len(), "review session loaded");
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn pending(&self) -> &[Suggestion] {
        &self.pending
    }

    pub fn can_undo(&self) -> bool {
        self.undo.is_some()
    }

    /// Applies the pending suggestion at `index`.
    ///
    /// # Errors
    ///
    /// `NotLoaded` before the first `load`, `NoSuchSuggestion` for an index past
    /// the end of the pending list.
    pub fn accept(&mut self, index: usize) -> Result<AcceptOutcome, ReviewError> {
        self.check_index(index)?;
        self.snapshot();
        let suggestion = self.pending.remove(index);

        let outcome = match self.document.find(&suggestion.original) {
            Some(offset) => {
                self.document.replace_range(
                    offset..offset + suggestion.original.len(),
                    &suggestion.suggested,
                );
                AcceptOutcome::Applied { suggestion, offset }
            }
            None => {
                tracing::debug!(original = %suggestion.original, "accepting stale suggestion");
                AcceptOutcome::Stale { suggestion }
            }
        };

        self.prune_stale();
        self.state = ReviewState::Editing;
        Ok(outcome)
    }

    /// Drops the pending suggestion at `index` without touching the document.
    pub fn reject(&mut self, index: usize) -> Result<Suggestion, ReviewError> {
        self.check_index(index)?;
        self.snapshot();
        let suggestion = self.pending.remove(index);
        self.state = ReviewState::Editing;
        Ok(suggestion)
    }

    /// Replaces the document with a hand-edited version.
    ///
    /// Returns the suggestions that were pruned because their original text
    /// disappeared with the edit.
    pub fn edit_document(&mut self, text: impl Into<String>) -> Result<Vec<Suggestion>, ReviewError> {
        if self.state == ReviewState::Idle {
            return Err(ReviewError::NotLoaded);
        }
        self.snapshot();
        self.document = text.into();
        self.state = ReviewState::Editing;
        Ok(self.prune_stale())
    }

    /// Reverts the most recent accept, reject or edit. Only one step is kept.
    pub fn undo(&mut self) -> Result<(), ReviewError> {
        let snapshot = self.undo.take().ok_or(ReviewError::NothingToUndo)?;
        self.document = snapshot.document;
        self.pending = snapshot.pending;
        self.state = snapshot.state;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ReviewError> {
        if self.state == ReviewState::Idle {
            return Err(ReviewError::NotLoaded);
        }
        if index >= self.pending.len() {
            return Err(ReviewError::NoSuchSuggestion { index });
        }
        Ok(())
    }

    fn snapshot(&mut self) {
        self.undo = Some(Snapshot {
            document: self.document.clone(),
            pending: self.pending.clone(),
            state: self.state,
        });
    }

    fn prune_stale(&mut self) -> Vec<Suggestion> {
        let (keep, stale): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|s| self.document.contains(&s.original));
        self.pending = keep;
        if !stale.is_empty() {
            tracing::debug!(pruned = stale.len(), "pruned stale suggestions");
        }
        stale
    }
}
