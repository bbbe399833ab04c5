//! Backend access for the TUI.
//!
//! The app queues [`ApiRequest`]s; the worker performs them and answers with
//! [`ApiEvent`]s on the event bus, plus user notifications.

pub mod worker;

use catcheck_core::analysis::{AnalysisResult, ResponseId};
use catcheck_core::client::{AnalysisParams, Assistant, BacklogEntry, ResponsePage, SaveRequest, WriteBack};
use catcheck_core::sheet::{SavedSheet, SheetData};
use uuid::Uuid;

/// Identifies one analysis run; events from older runs are discarded.
pub type RunId = u64;

#[derive(Debug, Clone)]
pub enum ApiRequest {
    LoadSheet {
        sheet_id: String,
        /// Background refresh: no success notification.
        quiet: bool,
    },
    LoadAssistants,
    LoadSavedSheets,
    /// Starts a new analysis stream, aborting any running one.
    RunAnalysis {
        run: RunId,
        params: AnalysisParams,
    },
    StopAnalysis,
    /// Persists a streamed result for the card `key`.
    SaveResult {
        key: Uuid,
        request: Box<SaveRequest>,
    },
    LoadLastResponses {
        params: AnalysisParams,
        page: u32,
        per_page: u32,
    },
    /// Writes the confirmed text back, then marks the response confirmed.
    Confirm {
        key: Uuid,
        response_id: ResponseId,
        write: WriteBack,
    },
    Reject {
        key: Uuid,
        response_id: ResponseId,
    },
    Feedback {
        key: Uuid,
        result: Box<AnalysisResult>,
        text: String,
    },
    LoadBacklog,
}

#[derive(Debug, Clone)]
pub enum ApiEvent {
    SheetLoaded {
        sheet_id: String,
        data: Box<SheetData>,
    },
    SheetFailed,
    AssistantsLoaded(Vec<Assistant>),
    SavedSheetsLoaded(Vec<SavedSheet>),
    AnalysisResult {
        run: RunId,
        result: Box<AnalysisResult>,
    },
    /// The backend could not analyze one row.
    AnalysisRowFailed {
        run: RunId,
        row_index: Option<usize>,
    },
    AnalysisDone {
        run: RunId,
    },
    /// The stream itself broke; no more results will come.
    AnalysisAborted {
        run: RunId,
    },
    Saved {
        key: Uuid,
        response_id: Option<ResponseId>,
    },
    LastResponses(Box<ResponsePage>),
    LastResponsesFailed,
    Confirmed {
        key: Uuid,
        write: WriteBack,
    },
    Rejected {
        key: Uuid,
    },
    FeedbackSaved {
        key: Uuid,
    },
    /// A confirm, reject or feedback call for `key` failed.
    ActionFailed {
        key: Uuid,
    },
    BacklogLoaded(Vec<BacklogEntry>),
}
