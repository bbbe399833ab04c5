//! Application state: the page controller.
//!
//! `AppState` owns everything the views read: the loaded sheet, column and
//! assistant selection, result cards, the open review session, the backlog and
//! the current notification. It performs no I/O. Operations that need the
//! backend queue an [`ApiRequest`]; the event loop drains the queue with
//! [`AppState::take_requests`] and feeds worker answers back through the
//! `apply_*` methods.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use catcheck_core::analysis::{AnalysisResult, ResponseId, ResultCard, VersionPolicy};
use catcheck_core::client::{
    AnalysisParams, Assistant, BacklogEntry, ResponsePage, SaveRequest, WriteBack,
};
use catcheck_core::config::Config;
use catcheck_core::notify::{Notification, Notifier};
use catcheck_core::review::{AcceptOutcome, ReviewSession};
use catcheck_core::sheet::{SavedSheet, SheetData};
use uuid::Uuid;

use crate::api::{ApiEvent, ApiRequest, RunId};

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the selected card's edit buffer.
    EditCard,
    /// Hand-editing the review document.
    EditDocument,
    /// Typing feedback for the selected card.
    Feedback,
    /// Typing a spreadsheet id.
    SheetInput,
    HelpOverlay,
    /// Quit requested while work is still in flight.
    ConfirmQuit,
}

impl Mode {
    pub fn is_text_input(self) -> bool {
        matches!(
            self,
            Mode::EditCard | Mode::EditDocument | Mode::Feedback | Mode::SheetInput
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Results,
    Review,
    Data,
    Backlog,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Results, Tab::Review, Tab::Data, Tab::Backlog];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Results => "Results",
            Tab::Review => "Review",
            Tab::Data => "Sheet",
            Tab::Backlog => "Backlog",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Review session bound to the card it was opened from.
#[derive(Debug, Clone)]
pub struct ActiveReview {
    pub card: Uuid,
    pub product_name: String,
    pub session: ReviewSession,
    pub selected: usize,
}

#[derive(Debug, Clone)]
struct ShownNotification {
    notification: Notification,
    shown_at: Instant,
}

pub struct AppState {
    pub mode: Mode,
    pub tab: Tab,
    pub help_scroll: u16,

    // Sheet and selection
    pub sheet_id: Option<String>,
    pub sheet: Option<SheetData>,
    pub sheet_loading: bool,
    /// Sheets registered with the backend, offered while typing a sheet id.
    pub saved_sheets: Vec<SavedSheet>,
    pub product_column: Option<String>,
    pub analysis_column: Option<String>,
    pub assistants: Vec<Assistant>,
    pub assistant: Option<usize>,
    default_assistant: Option<String>,

    // Results
    pub cards: Vec<ResultCard>,
    pub selected: usize,
    /// Number of cards revealed; grows by `page_size` with "load more".
    pub visible: usize,
    page_size: usize,
    per_page: u32,
    version_policy: VersionPolicy,
    pub analysis_loading: bool,
    pub responses_loading: bool,
    /// Rows expected from the running analysis and rows received so far.
    pub expected: usize,
    pub received: usize,
    run: RunId,
    running_params: Option<AnalysisParams>,
    /// `(page, total_pages)` of the last `/get_last_responses` answer.
    pub responses_page: Option<(u32, u32)>,
    /// Cards with a confirm, reject or feedback call in flight.
    pub busy: HashSet<Uuid>,
    /// Card whose text is open in `Mode::EditCard`.
    editing: Option<Uuid>,
    pub detail_scroll: u16,

    pub review: Option<ActiveReview>,

    pub backlog: Vec<BacklogEntry>,
    pub backlog_scroll: u16,
    pub data_scroll: usize,

    /// Line buffer for feedback, sheet id and document edits.
    pub input: String,
    pub spinner: usize,

    notifier: Arc<dyn Notifier>,
    notification: Option<ShownNotification>,
    notification_ttl: Duration,
    requests: Vec<ApiRequest>,
}

impl AppState {
    pub fn new(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            mode: Mode::default(),
            tab: Tab::default(),
            help_scroll: 0,
            sheet_id: config.default_sheet.clone().filter(|s| !s.is_empty()),
            sheet: None,
            sheet_loading: false,
            saved_sheets: Vec::new(),
            product_column: None,
            analysis_column: None,
            assistants: Vec::new(),
            assistant: None,
            default_assistant: config.default_assistant.clone(),
            cards: Vec::new(),
            selected: 0,
            visible: config.page_size.max(1),
            page_size: config.page_size.max(1),
            per_page: config.per_page.max(1),
            version_policy: config.version_policy,
            analysis_loading: false,
            responses_loading: false,
            expected: 0,
            received: 0,
            run: 0,
            running_params: None,
            responses_page: None,
            busy: HashSet::new(),
            editing: None,
            detail_scroll: 0,
            review: None,
            backlog: Vec::new(),
            backlog_scroll: 0,
            data_scroll: 0,
            input: String::new(),
            spinner: 0,
            notifier,
            notification: None,
            notification_ttl: Duration::from_secs(config.notification_ttl_secs.max(1)),
            requests: Vec::new(),
        }
    }

    /// Requests everything the first frame needs.
    pub fn startup(&mut self) {
        self.requests.push(ApiRequest::LoadAssistants);
        self.requests.push(ApiRequest::LoadSavedSheets);
        self.requests.push(ApiRequest::LoadBacklog);
        if let Some(sheet_id) = self.sheet_id.clone() {
            self.sheet_loading = true;
            self.requests.push(ApiRequest::LoadSheet {
                sheet_id,
                quiet: false,
            });
        }
    }

    /// Drains the queued backend requests.
    pub fn take_requests(&mut self) -> Vec<ApiRequest> {
        std::mem::take(&mut self.requests)
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    /// Folds one worker answer into the state.
    pub fn apply_api(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::SheetLoaded { sheet_id, data } => self.apply_sheet(&sheet_id, *data),
            ApiEvent::SheetFailed => self.apply_sheet_failed(),
            ApiEvent::AssistantsLoaded(assistants) => self.apply_assistants(assistants),
            ApiEvent::SavedSheetsLoaded(sheets) => self.saved_sheets = sheets,
            ApiEvent::AnalysisResult { run, result } => self.apply_analysis_result(run, *result),
            ApiEvent::AnalysisRowFailed { run, row_index } => {
                tracing::debug!(run, ?row_index, "row skipped by the backend");
                self.apply_row_failed(run)
            }
            ApiEvent::AnalysisDone { run } | ApiEvent::AnalysisAborted { run } => {
                self.apply_analysis_finished(run)
            }
            ApiEvent::Saved { key, response_id } => self.apply_saved(key, response_id),
            ApiEvent::LastResponses(page) => self.apply_last_responses(*page),
            ApiEvent::LastResponsesFailed => self.apply_last_responses_failed(),
            ApiEvent::Confirmed { key, write } => self.apply_confirmed(key, &write),
            ApiEvent::Rejected { key } => self.apply_rejected(key),
            ApiEvent::FeedbackSaved { key } | ApiEvent::ActionFailed { key } => {
                self.apply_action_done(key)
            }
            ApiEvent::BacklogLoaded(entries) => self.apply_backlog(entries),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Notifications and timers
    // ─────────────────────────────────────────────────────────────

    pub fn show_notification(&mut self, notification: Notification) {
        self.notification = Some(ShownNotification {
            notification,
            shown_at: Instant::now(),
        });
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref().map(|n| &n.notification)
    }

    pub fn on_tick(&mut self) {
        self.spinner = self.spinner.wrapping_add(1);
        if let Some(shown) = &self.notification {
            if shown.shown_at.elapsed() >= self.notification_ttl {
                self.notification = None;
            }
        }
    }

    /// Periodic refresh: reload the sheet quietly unless a load is running.
    pub fn refresh_due(&mut self) {
        if self.sheet_loading {
            return;
        }
        if let Some(sheet_id) = self.sheet_id.clone() {
            tracing::debug!(%sheet_id, "refreshing sheet");
            self.sheet_loading = true;
            self.requests.push(ApiRequest::LoadSheet {
                sheet_id,
                quiet: true,
            });
        }
    }

    pub fn has_work_in_flight(&self) -> bool {
        self.analysis_loading || !self.busy.is_empty()
    }

    // ─────────────────────────────────────────────────────────────
    // Sheet and selection
    // ─────────────────────────────────────────────────────────────

    pub fn set_sheet_id(&mut self, sheet_id: &str) {
        let sheet_id = sheet_id.trim();
        if sheet_id.is_empty() {
            self.notify(Notification::warning("Enter a spreadsheet id"));
            return;
        }
        if self.analysis_loading {
            self.stop_analysis();
        }
        self.sheet_id = Some(sheet_id.to_owned());
        self.sheet = None;
        self.product_column = None;
        self.analysis_column = None;
        self.clear_cards();
        self.responses_page = None;
        self.sheet_loading = true;
        self.requests.push(ApiRequest::LoadSheet {
            sheet_id: sheet_id.to_owned(),
            quiet: false,
        });
    }

    pub fn reload_sheet(&mut self) {
        match self.sheet_id.clone() {
            Some(sheet_id) => {
                self.sheet_loading = true;
                self.requests.push(ApiRequest::LoadSheet {
                    sheet_id,
                    quiet: false,
                });
            }
            None => self.notify(Notification::warning("No spreadsheet selected")),
        }
    }

    pub fn apply_sheet(&mut self, sheet_id: &str, mut data: SheetData) {
        if self.sheet_id.as_deref() != Some(sheet_id) {
            tracing::debug!(sheet_id, "ignoring data for a sheet no longer selected");
            return;
        }
        self.sheet_loading = false;
        let first_load = self.sheet.is_none();

        if !self.column_present(&data, self.product_column.as_deref()) {
            self.product_column = data.default_product_name_column().map(str::to_owned);
        }
        if !self.column_present(&data, self.analysis_column.as_deref()) {
            self.analysis_column = data.default_analysis_column().map(str::to_owned);
        }
        let stored = std::mem::take(&mut data.analysis_results);
        self.sheet = Some(data);
        self.data_scroll = self.data_scroll.min(self.sheet_rows().saturating_sub(1));

        let cards = std::mem::take(&mut self.cards);
        self.cards = cards.into_iter().map(|card| self.locate(card)).collect();

        // Results stored with the sheet replace the list, unless a run or an
        // edit is using it.
        if !stored.is_empty() && !self.analysis_loading && self.editing.is_none() {
            self.clear_cards();
            self.responses_page = None;
            let cards: Vec<ResultCard> = stored
                .into_iter()
                .map(|r| self.locate(ResultCard::new(r)))
                .collect();
            self.cards = cards;
        } else if first_load {
            self.load_last_responses(1);
        }
    }

    fn column_present(&self, data: &SheetData, column: Option<&str>) -> bool {
        column.is_some_and(|c| data.has_column(c))
    }

    pub fn apply_sheet_failed(&mut self) {
        self.sheet_loading = false;
    }

    pub fn sheet_rows(&self) -> usize {
        self.sheet.as_ref().map_or(0, |s| s.rows.len())
    }

    pub fn apply_assistants(&mut self, assistants: Vec<Assistant>) {
        let wanted = self.default_assistant.as_deref();
        self.assistant = wanted
            .and_then(|w| {
                assistants
                    .iter()
                    .position(|a| a.id.as_deref() == Some(w) || a.name == w)
            })
            .or_else(|| assistants.iter().position(|a| a.id.is_some()));
        self.assistants = assistants;
        self.load_last_responses(1);
    }

    pub fn selected_assistant(&self) -> Option<&Assistant> {
        self.assistant.and_then(|i| self.assistants.get(i))
    }

    pub fn cycle_product_column(&mut self, forward: bool) {
        if let Some(next) = self.cycled_column(self.product_column.as_deref(), forward) {
            self.product_column = Some(next);
            self.load_last_responses(1);
        }
    }

    pub fn cycle_analysis_column(&mut self, forward: bool) {
        if let Some(next) = self.cycled_column(self.analysis_column.as_deref(), forward) {
            self.analysis_column = Some(next);
            self.load_last_responses(1);
        }
    }

    fn cycled_column(&self, current: Option<&str>, forward: bool) -> Option<String> {
        let columns = &self.sheet.as_ref()?.columns;
        if columns.is_empty() {
            return None;
        }
        let next = match current.and_then(|c| columns.iter().position(|x| x == c)) {
            Some(i) if forward => (i + 1) % columns.len(),
            Some(i) => (i + columns.len() - 1) % columns.len(),
            None => 0,
        };
        Some(columns[next].clone())
    }

    pub fn cycle_assistant(&mut self, forward: bool) {
        let len = self.assistants.len();
        if len == 0 {
            return;
        }
        self.assistant = Some(match self.assistant {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        });
        self.load_last_responses(1);
    }

    /// Parameters for an analysis, when sheet, both columns and a configured
    /// assistant are selected.
    pub fn analysis_params(&self) -> Option<AnalysisParams> {
        Some(AnalysisParams {
            sheet_id: self.sheet_id.clone()?,
            product_name_column: self.product_column.clone()?,
            analysis_column: self.analysis_column.clone()?,
            assistant_id: self.selected_assistant()?.id.clone()?,
        })
    }

    // ─────────────────────────────────────────────────────────────
    // Analysis
    // ─────────────────────────────────────────────────────────────

    pub fn run_analysis(&mut self) {
        let Some(params) = self.analysis_params() else {
            self.notify(Notification::warning(
                "Select a sheet, both columns and a configured assistant first",
            ));
            return;
        };

        self.expected = self.sheet.as_ref().map_or(0, |s| {
            s.rows_to_analyze(&params.product_name_column, &params.analysis_column)
        });
        self.received = 0;
        self.clear_cards();
        self.responses_page = None;
        self.run += 1;
        self.analysis_loading = true;
        self.running_params = Some(params.clone());
        tracing::info!(run = self.run, expected = self.expected, "starting analysis");
        self.requests.push(ApiRequest::RunAnalysis {
            run: self.run,
            params,
        });
        self.tab = Tab::Results;
    }

    pub fn stop_analysis(&mut self) {
        if !self.analysis_loading {
            return;
        }
        self.analysis_loading = false;
        self.run += 1;
        self.requests.push(ApiRequest::StopAnalysis);
        self.notify(Notification::info("Analysis stopped"));
    }

    fn current_run(&self, run: RunId) -> bool {
        run == self.run && self.analysis_loading
    }

    pub fn apply_analysis_result(&mut self, run: RunId, result: AnalysisResult) {
        if !self.current_run(run) {
            tracing::debug!(run, "dropping result from a superseded run");
            return;
        }
        self.received += 1;
        let card = self.locate(ResultCard::new(result));
        if let Some(params) = self.running_params.clone() {
            self.requests.push(ApiRequest::SaveResult {
                key: card.key,
                request: Box::new(SaveRequest::new(params, &card.result)),
            });
        }
        self.cards.push(card);
    }

    pub fn apply_row_failed(&mut self, run: RunId) {
        if self.current_run(run) {
            self.received += 1;
        }
    }

    /// Terminal `done` event or a broken stream.
    pub fn apply_analysis_finished(&mut self, run: RunId) {
        if self.current_run(run) {
            self.analysis_loading = false;
        }
    }

    pub fn apply_saved(&mut self, key: Uuid, response_id: Option<ResponseId>) {
        if let Some(card) = self.card_mut(key) {
            card.result.id = response_id;
        }
    }

    /// `(received, expected)` while an analysis runs.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.analysis_loading.then_some((self.received, self.expected))
    }

    // ─────────────────────────────────────────────────────────────
    // Previously saved responses
    // ─────────────────────────────────────────────────────────────

    /// Loads one page of pending responses for the current selection.
    /// Does nothing until both columns and an assistant are selected.
    pub fn load_last_responses(&mut self, page: u32) {
        if self.analysis_loading {
            return;
        }
        let Some(params) = self.analysis_params() else {
            return;
        };
        self.responses_loading = true;
        self.requests.push(ApiRequest::LoadLastResponses {
            params,
            page: page.max(1),
            per_page: self.per_page,
        });
    }

    pub fn apply_last_responses(&mut self, page: ResponsePage) {
        self.responses_loading = false;
        if self.analysis_loading {
            return;
        }
        self.clear_cards();
        self.responses_page = Some((page.page, page.total_pages));
        let cards: Vec<ResultCard> = page
            .responses
            .into_iter()
            .map(|r| self.locate(ResultCard::new(r)))
            .collect();
        self.cards = cards;
    }

    pub fn apply_last_responses_failed(&mut self) {
        self.responses_loading = false;
    }

    pub fn next_page(&mut self) {
        if let Some((page, total)) = self.responses_page {
            if page < total {
                self.load_last_responses(page + 1);
            }
        }
    }

    pub fn prev_page(&mut self) {
        if let Some((page, _)) = self.responses_page {
            if page > 1 {
                self.load_last_responses(page - 1);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Result cards
    // ─────────────────────────────────────────────────────────────

    fn clear_cards(&mut self) {
        self.end_card_edit();
        self.cards.clear();
        self.selected = 0;
        self.visible = self.page_size;
        self.detail_scroll = 0;
        self.review = None;
        if self.tab == Tab::Review {
            self.tab = Tab::Results;
        }
    }

    /// Fills row index and item number from the loaded sheet.
    fn locate(&self, mut card: ResultCard) -> ResultCard {
        let Some(sheet) = &self.sheet else {
            return card;
        };
        if card.row_index.is_none() {
            if let Some(column) = self.product_column.as_deref() {
                card.row_index = sheet.find_row_by_product_name(column, card.result.product_name.as_str());
            }
        }
        if card.item_number.is_none() {
            card.item_number = card.row_index.and_then(|i| sheet.item_number(i));
        }
        card
    }

    pub fn visible_cards(&self) -> &[ResultCard] {
        &self.cards[..self.visible.min(self.cards.len())]
    }

    pub fn has_hidden_cards(&self) -> bool {
        self.cards.len() > self.visible
    }

    pub fn load_more(&mut self) {
        if self.has_hidden_cards() {
            self.visible = (self.visible + self.page_size).min(self.cards.len());
        }
    }

    pub fn select_next(&mut self) {
        let last = self.visible_cards().len().saturating_sub(1);
        if self.selected < last {
            self.selected += 1;
            self.detail_scroll = 0;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.detail_scroll = 0;
        }
    }

    pub fn selected_card(&self) -> Option<&ResultCard> {
        self.visible_cards().get(self.selected)
    }

    fn selected_key(&self) -> Option<Uuid> {
        self.selected_card().map(|c| c.key)
    }

    fn card_mut(&mut self, key: Uuid) -> Option<&mut ResultCard> {
        self.cards.iter_mut().find(|c| c.key == key)
    }

    /// Removes a card, keeping the selection on the card it pointed at.
    fn remove_card(&mut self, key: Uuid) {
        self.busy.remove(&key);
        if self.editing == Some(key) {
            self.end_card_edit();
            self.notify(Notification::warning("The edited result was removed"));
        }
        let selected_key = self.selected_key();
        if let Some(index) = self.cards.iter().position(|c| c.key == key) {
            self.cards.remove(index);
            let kept = selected_key
                .filter(|k| *k != key)
                .and_then(|k| self.visible_cards().iter().position(|c| c.key == k));
            self.selected = match kept {
                Some(position) => position,
                None => self.selected.min(self.visible_cards().len().saturating_sub(1)),
            };
        }
        if self.review.as_ref().is_some_and(|r| r.card == key) {
            self.review = None;
        }
    }

    pub fn begin_edit(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        if let Some(card) = self.card_mut(key) {
            card.begin_edit();
            self.editing = Some(key);
            self.mode = Mode::EditCard;
        }
    }

    /// Card being edited, if it still exists.
    pub fn edited_card(&self) -> Option<&ResultCard> {
        let key = self.editing?;
        self.cards.iter().find(|c| c.key == key)
    }

    pub fn save_edit(&mut self) {
        let policy = self.version_policy;
        let saved = self
            .editing
            .take()
            .and_then(|key| self.card_mut(key))
            .and_then(|card| card.save_edit(policy));
        self.mode = Mode::Normal;
        if let Some(version) = saved {
            self.notify(Notification::success(format!(
                "Saved as version {}",
                version.version_number
            )));
        }
    }

    pub fn cancel_edit(&mut self) {
        self.end_card_edit();
    }

    fn end_card_edit(&mut self) {
        if let Some(card) = self.editing.take().and_then(|key| self.card_mut(key)) {
            card.cancel_edit();
        }
        if self.mode == Mode::EditCard {
            self.mode = Mode::Normal;
        }
    }

    /// Buffer the current text-input mode types into.
    pub fn input_buffer_mut(&mut self) -> Option<&mut String> {
        match self.mode {
            Mode::EditCard => {
                let key = self.editing?;
                self.card_mut(key)?.edit_buffer_mut()
            }
            Mode::EditDocument | Mode::Feedback | Mode::SheetInput => Some(&mut self.input),
            _ => None,
        }
    }

    /// Saved response id of the selected card, notifying when missing.
    fn actionable(&self) -> Option<(Uuid, ResponseId)> {
        let card = self.selected_card()?;
        if self.busy.contains(&card.key) {
            return None;
        }
        match card.response_id() {
            Some(id) => Some((card.key, id)),
            None => {
                self.notify(Notification::warning(
                    "This result has not been saved yet; try again in a moment",
                ));
                None
            }
        }
    }

    pub fn confirm_selected(&mut self) {
        let Some((key, response_id)) = self.actionable() else {
            return;
        };
        let (Some(sheet_id), Some(column)) = (self.sheet_id.clone(), self.analysis_column.clone())
        else {
            self.notify(Notification::warning("Select a sheet and an analysis column first"));
            return;
        };
        let Some(card) = self.selected_card() else {
            return;
        };
        let Some(row_index) = card.row_index else {
            self.notify(Notification::error(format!(
                "Row for '{}' not found in the sheet",
                card.product_name()
            )));
            return;
        };
        let write = WriteBack {
            sheet_id,
            row_index,
            column_name: column,
            new_value: card.confirm_text(),
        };
        self.busy.insert(key);
        self.requests.push(ApiRequest::Confirm {
            key,
            response_id,
            write,
        });
    }

    pub fn reject_selected(&mut self) {
        let Some((key, response_id)) = self.actionable() else {
            return;
        };
        self.busy.insert(key);
        self.requests.push(ApiRequest::Reject { key, response_id });
    }

    pub fn begin_feedback(&mut self) {
        if self.actionable().is_some() {
            self.input.clear();
            self.mode = Mode::Feedback;
        }
    }

    pub fn submit_feedback(&mut self) {
        let text = self.input.trim().to_owned();
        self.mode = Mode::Normal;
        if text.is_empty() {
            self.notify(Notification::warning("Feedback is empty"));
            return;
        }
        let Some((key, _)) = self.actionable() else {
            return;
        };
        let Some(card) = self.selected_card() else {
            return;
        };
        let result = Box::new(card.result.clone());
        self.input.clear();
        self.busy.insert(key);
        self.requests.push(ApiRequest::Feedback { key, result, text });
    }

    pub fn begin_sheet_input(&mut self) {
        self.input = self.sheet_id.clone().unwrap_or_default();
        self.mode = Mode::SheetInput;
    }

    /// Replaces the typed sheet id with the next (or previous) saved sheet.
    pub fn cycle_saved_sheet(&mut self, forward: bool) {
        let len = self.saved_sheets.len();
        if len == 0 {
            return;
        }
        let current = self
            .saved_sheets
            .iter()
            .position(|s| s.sheet_id == self.input.trim());
        let next = match current {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.input = self.saved_sheets[next].sheet_id.clone();
    }

    /// Saved sheet matching the typed id.
    pub fn saved_sheet_for_input(&self) -> Option<&SavedSheet> {
        let typed = self.input.trim();
        self.saved_sheets.iter().find(|s| s.sheet_id == typed)
    }

    pub fn submit_sheet_input(&mut self) {
        let sheet_id = std::mem::take(&mut self.input);
        self.mode = Mode::Normal;
        self.set_sheet_id(&sheet_id);
    }

    pub fn cancel_input(&mut self) {
        self.input.clear();
        self.mode = Mode::Normal;
    }

    pub fn apply_confirmed(&mut self, key: Uuid, write: &WriteBack) {
        self.remove_card(key);
        if let Some(sheet) = self.sheet.as_mut() {
            sheet.set_cell(write.row_index, &write.column_name, &write.new_value);
        }
        self.requests.push(ApiRequest::LoadBacklog);
    }

    pub fn apply_rejected(&mut self, key: Uuid) {
        self.remove_card(key);
    }

    pub fn apply_action_done(&mut self, key: Uuid) {
        self.busy.remove(&key);
    }

    pub fn reload_backlog(&mut self) {
        self.requests.push(ApiRequest::LoadBacklog);
    }

    pub fn apply_backlog(&mut self, entries: Vec<BacklogEntry>) {
        self.backlog = entries;
    }

    // ─────────────────────────────────────────────────────────────
    // Review
    // ─────────────────────────────────────────────────────────────

    pub fn open_review(&mut self) {
        let Some(card) = self.selected_card() else {
            return;
        };
        let review = ActiveReview {
            card: card.key,
            product_name: card.product_name().to_owned(),
            session: card.review_session(),
            selected: 0,
        };
        if review.session.pending().is_empty() {
            self.notify(Notification::info("No suggestions to review"));
        }
        self.review = Some(review);
        self.tab = Tab::Review;
    }

    pub fn review_select_next(&mut self) {
        if let Some(review) = self.review.as_mut() {
            let last = review.session.pending().len().saturating_sub(1);
            review.selected = (review.selected + 1).min(last);
        }
    }

    pub fn review_select_prev(&mut self) {
        if let Some(review) = self.review.as_mut() {
            review.selected = review.selected.saturating_sub(1);
        }
    }

    fn clamp_review_selection(review: &mut ActiveReview) {
        let len = review.session.pending().len();
        review.selected = review.selected.min(len.saturating_sub(1));
    }

    pub fn review_accept(&mut self) {
        let Some(review) = self.review.as_mut() else {
            return;
        };
        let outcome = review.session.accept(review.selected);
        Self::clamp_review_selection(review);
        match outcome {
            Ok(AcceptOutcome::Applied { .. }) => {}
            Ok(AcceptOutcome::Stale { suggestion }) => self.notify(Notification::warning(format!(
                "'{}' no longer occurs; suggestion dropped",
                suggestion.original
            ))),
            Err(e) => self.notify(Notification::error(e.to_string())),
        }
    }

    pub fn review_reject(&mut self) {
        let Some(review) = self.review.as_mut() else {
            return;
        };
        let outcome = review.session.reject(review.selected);
        Self::clamp_review_selection(review);
        if let Err(e) = outcome {
            self.notify(Notification::error(e.to_string()));
        }
    }

    pub fn review_undo(&mut self) {
        let Some(review) = self.review.as_mut() else {
            return;
        };
        let outcome = review.session.undo();
        Self::clamp_review_selection(review);
        if let Err(e) = outcome {
            self.notify(Notification::info(e.to_string()));
        }
    }

    pub fn begin_document_edit(&mut self) {
        if let Some(review) = &self.review {
            self.input = review.session.document().to_owned();
            self.mode = Mode::EditDocument;
        }
    }

    pub fn commit_document_edit(&mut self) {
        let text = std::mem::take(&mut self.input);
        self.mode = Mode::Normal;
        let Some(review) = self.review.as_mut() else {
            return;
        };
        let outcome = review.session.edit_document(text);
        Self::clamp_review_selection(review);
        match outcome {
            Ok(pruned) if !pruned.is_empty() => self.notify(Notification::info(format!(
                "{} suggestion(s) no longer apply",
                pruned.len()
            ))),
            Ok(_) => {}
            Err(e) => self.notify(Notification::error(e.to_string())),
        }
    }

    /// Stores the reviewed document on its card as the current text.
    pub fn apply_review_to_card(&mut self) {
        let Some(review) = &self.review else {
            return;
        };
        let key = review.card;
        let document = review.session.document().to_owned();
        let policy = self.version_policy;
        let saved = self.card_mut(key).and_then(|card| {
            card.begin_edit();
            if let Some(buffer) = card.edit_buffer_mut() {
                *buffer = document;
            }
            card.save_edit(policy)
        });
        match saved {
            Some(version) => {
                self.notify(Notification::success(format!(
                    "Reviewed text saved as version {}",
                    version.version_number
                )));
                self.tab = Tab::Results;
            }
            None => self.notify(Notification::warning("The reviewed result is gone")),
        }
    }
}

#[cfg(test)]
mod tests {
    use catcheck_core::notify::{RecordingNotifier, Severity};
    use serde_json::json;

    use super::*;

    fn state() -> (AppState, RecordingNotifier) {
        let recorder = RecordingNotifier::new();
        let config = Config {
            default_sheet: Some("sheet-1".into()),
            page_size: 2,
            ..Config::default()
        };
        (AppState::new(&config, Arc::new(recorder.clone())), recorder)
    }

    fn sheet() -> SheetData {
        serde_json::from_value(json!({
            "columns": ["Číslo položky", "Název", "Popis"],
            "data": [
                {"Číslo položky": "1001", "Název": "Chair", "Popis": "The producct is red"},
                {"Číslo položky": "1002", "Název": "Table", "Popis": "Sturdy tabel"},
                {"Číslo položky": "1003", "Název": "Lamp", "Popis": ""}
            ]
        }))
        .unwrap()
    }

    fn result(name: &str, row: usize) -> AnalysisResult {
        serde_json::from_value(json!({
            "status": "completed",
            "row_index": row,
            "product_name": name,
            "product_description": {
                "original": "The producct is red",
                "improved": "The <change original=\"producct\">product</change> is red",
                "changes": []
            }
        }))
        .unwrap()
    }

    fn ready() -> (AppState, RecordingNotifier) {
        let (mut app, rec) = state();
        app.startup();
        app.apply_sheet("sheet-1", sheet());
        app.apply_assistants(vec![
            Assistant {
                name: "Broken".into(),
                id: None,
            },
            Assistant {
                name: "Grammar".into(),
                id: Some("asst_1".into()),
            },
        ]);
        app.take_requests();
        (app, rec)
    }

    fn start_run(app: &mut AppState) -> RunId {
        app.run_analysis();
        match app.take_requests().as_slice() {
            [ApiRequest::RunAnalysis { run, .. }] => *run,
            other => panic!("unexpected requests: {other:?}"),
        }
    }

    #[test]
    fn sheet_load_selects_default_columns() {
        let (app, _) = ready();
        assert_eq!(app.product_column.as_deref(), Some("Název"));
        assert_eq!(app.analysis_column.as_deref(), Some("Popis"));
        assert_eq!(app.selected_assistant().unwrap().name, "Grammar");
    }

    #[test]
    fn run_requires_full_selection() {
        let (mut app, rec) = state();
        app.run_analysis();
        assert!(app.take_requests().is_empty());
        assert_eq!(rec.take()[0].severity, Severity::Warning);
    }

    #[test]
    fn analysis_counts_expected_rows_and_saves_each_result() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        assert_eq!(app.progress(), Some((0, 2)));

        app.apply_analysis_result(run, result("Chair", 0));
        let requests = app.take_requests();
        assert!(matches!(requests.as_slice(), [ApiRequest::SaveResult { .. }]));
        assert_eq!(app.cards[0].item_number.as_deref(), Some("1001"));

        app.apply_row_failed(run);
        assert_eq!(app.progress(), Some((2, 2)));
        app.apply_analysis_finished(run);
        assert_eq!(app.progress(), None);
    }

    #[test]
    fn restarting_discards_results_of_the_old_run() {
        let (mut app, _) = ready();
        let first = start_run(&mut app);
        app.apply_analysis_result(first, result("Chair", 0));
        app.take_requests();
        let second = start_run(&mut app);
        assert!(app.cards.is_empty());

        app.apply_analysis_result(first, result("Table", 1));
        assert!(app.cards.is_empty());
        app.apply_analysis_result(second, result("Table", 1));
        assert_eq!(app.cards.len(), 1);
    }

    #[test]
    fn cards_are_revealed_a_page_at_a_time() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        for i in 0..5 {
            app.apply_analysis_result(run, result("Chair", i));
        }
        assert_eq!(app.visible_cards().len(), 2);
        app.load_more();
        assert_eq!(app.visible_cards().len(), 4);
        app.load_more();
        assert_eq!(app.visible_cards().len(), 5);
        assert!(!app.has_hidden_cards());
    }

    #[test]
    fn confirm_needs_a_saved_response() {
        let (mut app, rec) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        app.take_requests();

        app.confirm_selected();
        assert!(app.take_requests().is_empty());
        assert_eq!(rec.take()[0].severity, Severity::Warning);
    }

    #[test]
    fn confirm_writes_clean_text_and_removes_card() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        let key = app.cards[0].key;
        app.apply_saved(key, Some(42));
        app.take_requests();

        app.confirm_selected();
        let write = match app.take_requests().as_slice() {
            [ApiRequest::Confirm {
                response_id: 42,
                write,
                ..
            }] => write.clone(),
            other => panic!("unexpected requests: {other:?}"),
        };
        assert_eq!(write.new_value, "The product is red");
        assert_eq!(write.column_name, "Popis");
        assert_eq!(write.row_index, 0);
        assert!(app.busy.contains(&key));

        app.apply_confirmed(key, &write);
        assert!(app.cards.is_empty());
        assert!(app.busy.is_empty());
        let sheet = app.sheet.as_ref().unwrap();
        assert_eq!(sheet.rows[0]["Popis"], "The product is red");
        assert!(matches!(app.take_requests().as_slice(), [ApiRequest::LoadBacklog]));
    }

    #[test]
    fn reject_removes_card_on_success_only() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        let key = app.cards[0].key;
        app.apply_saved(key, Some(7));
        app.take_requests();

        app.reject_selected();
        assert!(matches!(
            app.take_requests().as_slice(),
            [ApiRequest::Reject { response_id: 7, .. }]
        ));
        app.apply_action_done(key);
        assert_eq!(app.cards.len(), 1);
        app.apply_rejected(key);
        assert!(app.cards.is_empty());
    }

    #[test]
    fn last_responses_replace_the_list() {
        let (mut app, _) = ready();
        app.load_last_responses(1);
        assert!(matches!(
            app.take_requests().as_slice(),
            [ApiRequest::LoadLastResponses { page: 1, per_page: 10, .. }]
        ));

        let page: ResponsePage = serde_json::from_value(json!({
            "responses": [{"id": 1, "product_name": {"original": "Table"}, "product_description": {"original": "x", "improved": "y", "changes": []}}],
            "page": 1, "per_page": 10, "total_pages": 3, "total": 21
        }))
        .unwrap();
        app.apply_last_responses(page);
        assert_eq!(app.cards.len(), 1);
        assert_eq!(app.cards[0].row_index, Some(1));
        app.next_page();
        assert!(matches!(
            app.take_requests().as_slice(),
            [ApiRequest::LoadLastResponses { page: 2, .. }]
        ));
    }

    #[test]
    fn review_accept_and_apply_to_card() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        app.open_review();
        assert_eq!(app.tab, Tab::Review);
        assert_eq!(app.review.as_ref().unwrap().session.pending().len(), 1);

        app.review_accept();
        assert_eq!(
            app.review.as_ref().unwrap().session.document(),
            "The product is red"
        );
        app.apply_review_to_card();
        assert_eq!(app.cards[0].current_text(), "The product is red");
        assert_eq!(app.tab, Tab::Results);
    }

    #[test]
    fn edit_saves_through_the_buffer() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        app.begin_edit();
        assert_eq!(app.mode, Mode::EditCard);
        app.input_buffer_mut().unwrap().push('!');
        app.save_edit();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.cards[0].current_text(), "The product is red!");
    }

    #[test]
    fn feedback_needs_a_saved_response() {
        let (mut app, rec) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        app.take_requests();

        app.begin_feedback();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(rec.take().last().map(|n| n.severity), Some(Severity::Warning));

        // Typed text is still refused while the id is missing.
        app.mode = Mode::Feedback;
        app.input = "too formal".into();
        app.submit_feedback();
        assert!(app.take_requests().is_empty());
        assert_eq!(rec.take().last().map(|n| n.severity), Some(Severity::Warning));
    }

    #[test]
    fn feedback_sends_once_per_card() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        let key = app.cards[0].key;
        app.apply_saved(key, Some(7));
        app.take_requests();

        app.begin_feedback();
        app.input = "too formal".into();
        app.submit_feedback();
        match app.take_requests().as_slice() {
            [ApiRequest::Feedback { result, text, .. }] => {
                assert_eq!(result.id, Some(7));
                assert_eq!(text, "too formal");
            }
            other => panic!("unexpected requests: {other:?}"),
        }

        app.begin_feedback();
        assert_eq!(app.mode, Mode::Normal);
        app.input = "again".into();
        app.submit_feedback();
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn results_stored_with_the_sheet_fill_the_list() {
        let (mut app, _) = state();
        app.startup();
        app.take_requests();
        let mut data = sheet();
        data.analysis_results = vec![serde_json::from_value(json!({
            "id": 5,
            "product_name": {"original": "Table"},
            "product_description": {"original": "Sturdy tabel", "improved": "Sturdy table", "changes": []}
        }))
        .unwrap()];

        app.apply_sheet("sheet-1", data);
        assert_eq!(app.cards.len(), 1);
        assert_eq!(app.cards[0].response_id(), Some(5));
        assert_eq!(app.cards[0].row_index, Some(1));
        assert_eq!(app.cards[0].item_number.as_deref(), Some("1002"));
        assert!(app.sheet.as_ref().unwrap().analysis_results.is_empty());
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn stored_results_leave_a_running_analysis_alone() {
        let (mut app, _) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        let mut data = sheet();
        data.analysis_results = vec![result("Table", 1)];

        app.apply_sheet("sheet-1", data);
        assert_eq!(app.cards.len(), 1);
        assert_eq!(app.cards[0].product_name(), "Chair");
    }

    #[test]
    fn edit_follows_its_card_when_another_is_removed() {
        let (mut app, rec) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        app.apply_analysis_result(run, result("Table", 1));
        let (chair, table) = (app.cards[0].key, app.cards[1].key);
        app.apply_saved(chair, Some(1));
        app.reject_selected();
        app.take_requests();

        app.select_next();
        app.begin_edit();
        app.apply_rejected(chair);
        assert_eq!(app.mode, Mode::EditCard);
        assert_eq!(app.selected_card().map(|c| c.key), Some(table));
        assert_eq!(app.edited_card().map(|c| c.key), Some(table));

        app.input_buffer_mut().unwrap().push('!');
        app.save_edit();
        assert_eq!(app.cards[0].current_text(), "The product is red!");
        let last = rec.take().into_iter().last().map(|n| n.severity);
        assert_eq!(last, Some(Severity::Success));
    }

    #[test]
    fn removing_the_edited_card_ends_the_edit() {
        let (mut app, rec) = ready();
        let run = start_run(&mut app);
        app.apply_analysis_result(run, result("Chair", 0));
        let key = app.cards[0].key;
        app.begin_edit();

        app.apply_rejected(key);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.edited_card().is_none());
        assert!(app.input_buffer_mut().is_none());
        assert_eq!(rec.take().last().map(|n| n.severity), Some(Severity::Warning));
    }

    #[test]
    fn refresh_reloads_quietly() {
        let (mut app, _) = ready();
        app.refresh_due();
        assert!(matches!(
            app.take_requests().as_slice(),
            [ApiRequest::LoadSheet { quiet: true, .. }]
        ));
        app.refresh_due();
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn saved_sheets_cycle_through_the_input() {
        let (mut app, _) = state();
        app.apply_api(ApiEvent::SavedSheetsLoaded(vec![
            SavedSheet {
                id: Some(1),
                sheet_id: "a".into(),
                name: "Chairs".into(),
                url: String::new(),
            },
            SavedSheet {
                id: Some(2),
                sheet_id: "b".into(),
                name: "Tables".into(),
                url: String::new(),
            },
        ]));
        app.input.clear();
        app.cycle_saved_sheet(true);
        assert_eq!(app.input, "a");
        app.cycle_saved_sheet(true);
        assert_eq!(app.saved_sheet_for_input().unwrap().name, "Tables");
        app.cycle_saved_sheet(true);
        assert_eq!(app.input, "a");
        app.cycle_saved_sheet(false);
        assert_eq!(app.input, "b");
    }
}
