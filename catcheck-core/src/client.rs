//! Typed HTTP client for the catalog checker backend.
//!
//! Every endpoint answers JSON. Success is signalled inconsistently: some
//! bodies carry `"status": "success"`, some only data, failures may come back
//! as `{"status": "error", "message": …}` or `{"error": …}` with or without a
//! non-2xx status. [`BackendClient`] folds all of these into [`Error`] so
//! callers only see typed payloads.

use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::{AnalysisResult, ChangeNote, ProductName, ResponseId, ResultStatus, Version};
use crate::sheet::{SavedSheet, SheetData};
use crate::stream::AnalysisStream;
use crate::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An assistant the backend can run; `id` is `None` when it is not configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assistant {
    pub name: String,
    pub id: Option<String>,
}

/// Columns and assistant an analysis runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisParams {
    pub sheet_id: String,
    pub product_name_column: String,
    pub analysis_column: String,
    pub assistant_id: String,
}

/// Body of `/save_gpt_response`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest {
    #[serde(flatten)]
    pub params: AnalysisParams,
    pub product_name: String,
    pub original_text: String,
    pub improved_text: String,
    pub changes: Vec<ChangeNote>,
}

impl SaveRequest {
    pub fn new(params: AnalysisParams, result: &AnalysisResult) -> Self {
        let changes = result
            .versions
            .first()
            .map(|v| v.changes.clone())
            .unwrap_or_else(|| result.product_description.changes.clone());
        Self {
            params,
            product_name: result.product_name.as_str().to_owned(),
            original_text: result.product_description.original.clone(),
            improved_text: result.product_description.improved.clone(),
            changes,
        }
    }
}

/// Body of `/update_sheet_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteBack {
    pub sheet_id: String,
    pub row_index: usize,
    pub column_name: String,
    pub new_value: String,
}

/// One page of `/get_last_responses`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePage {
    #[serde(default)]
    pub responses: Vec<AnalysisResult>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total: u64,
}

fn first_page() -> u32 {
    1
}

impl ResponsePage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub feedback_text: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// One persisted response as listed in the backlog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BacklogEntry {
    pub id: ResponseId,
    #[serde(default)]
    pub product_name: ProductName,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub analysis_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub versions: Vec<Version>,
    #[serde(default)]
    pub feedbacks: Vec<Feedback>,
}

#[derive(Debug, Deserialize)]
struct SavedResponse {
    #[serde(default)]
    response_id: Option<ResponseId>,
}

#[derive(Debug, Deserialize)]
struct Backlog {
    #[serde(default)]
    responses: Vec<BacklogEntry>,
}

#[derive(Debug, Deserialize)]
struct ImprovedText {
    improved_text: String,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
}

impl BackendClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// `InvalidUrl` when `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| Error::InvalidUrl {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        tracing::debug!(path, "GET");
        let response = self.http.get(self.endpoint(path)?).query(query).send().await?;
        read_json(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        tracing::debug!(path, "POST");
        let response = self.http.post(self.endpoint(path)?).json(body).send().await?;
        read_json(response).await
    }

    // ─────────────────────────────────────────────────────────────
    // Sheets
    // ─────────────────────────────────────────────────────────────

    pub async fn fetch_sheet(&self, sheet_id: &str) -> Result<SheetData> {
        let sheet: SheetData = self
            .post("get_sheet_data", &json!({ "sheet_id": sheet_id }))
            .await?;
        tracing::info!(sheet_id, rows = sheet.rows.len(), "sheet loaded");
        Ok(sheet)
    }

    pub async fn list_sheets(&self) -> Result<Vec<SavedSheet>> {
        self.get("get-saved-sheets", &[]).await
    }

    pub async fn add_sheet(&self, sheet: &SavedSheet) -> Result<()> {
        let _: Value = self
            .post(
                "add_sheet",
                &json!({ "sheet_id": sheet.sheet_id, "name": sheet.name, "url": sheet.url }),
            )
            .await?;
        Ok(())
    }

    /// Writes `new_value` into one cell of the spreadsheet.
    pub async fn update_sheet_data(&self, write: &WriteBack) -> Result<()> {
        let _: Value = self.post("update_sheet_data", write).await?;
        tracing::info!(row = write.row_index, column = %write.column_name, "cell written back");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Assistants and analysis
    // ─────────────────────────────────────────────────────────────

    pub async fn list_assistants(&self) -> Result<Vec<Assistant>> {
        let pairs: Vec<(String, Option<String>)> = self.get("get_assistants", &[]).await?;
        Ok(pairs
            .into_iter()
            .map(|(name, id)| Assistant {
                name,
                id: id.filter(|id| !id.is_empty()),
            })
            .collect())
    }

    /// Opens the streamed analysis of every row of the sheet.
    pub async fn open_analysis(&self, params: &AnalysisParams) -> Result<AnalysisStream> {
        let response = self
            .http
            .get(self.endpoint("analyze")?)
            .query(params)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        tracing::info!(sheet_id = %params.sheet_id, "analysis stream opened");
        Ok(AnalysisStream::from_response(response))
    }

    /// Checks one piece of text; returns the improved markup.
    pub async fn analyze_text(&self, text: &str, assistant_id: &str) -> Result<String> {
        let body: ImprovedText = self
            .post(
                "analyze_text",
                &json!({ "text": text, "assistant_id": assistant_id }),
            )
            .await?;
        Ok(body.improved_text)
    }

    // ─────────────────────────────────────────────────────────────
    // Persisted responses
    // ─────────────────────────────────────────────────────────────

    /// Persists a streamed result as a pending response.
    pub async fn save_gpt_response(&self, request: &SaveRequest) -> Result<Option<ResponseId>> {
        let saved: SavedResponse = self.post("save_gpt_response", request).await?;
        Ok(saved.response_id)
    }

    /// Pending responses previously saved for the same sheet, columns and
    /// assistant, newest first.
    pub async fn get_last_responses(
        &self,
        params: &AnalysisParams,
        page: u32,
        per_page: u32,
    ) -> Result<ResponsePage> {
        let query = [
            ("sheet_id", params.sheet_id.clone()),
            ("product_name_column", params.product_name_column.clone()),
            ("analysis_column", params.analysis_column.clone()),
            ("assistant_id", params.assistant_id.clone()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        self.get("get_last_responses", &query).await
    }

    pub async fn update_status(&self, response_id: ResponseId, status: ResultStatus) -> Result<()> {
        if status == ResultStatus::Pending {
            return Err(Error::backend("a response can only be confirmed or rejected"));
        }
        let _: Value = self
            .post(
                "update_gpt_response_status",
                &json!({ "response_id": response_id, "status": status.as_str() }),
            )
            .await?;
        tracing::info!(response_id, status = status.as_str(), "response status updated");
        Ok(())
    }

    pub async fn save_feedback(&self, result: &AnalysisResult, feedback: &str) -> Result<()> {
        let _: Value = self
            .post("save_feedback", &json!({ "result": result, "feedback": feedback }))
            .await?;
        Ok(())
    }

    /// Every persisted response with its versions and feedback.
    pub async fn get_gpt_responses(&self) -> Result<Vec<BacklogEntry>> {
        let backlog: Backlog = self.get("get_gpt_responses", &[]).await?;
        Ok(backlog.responses)
    }
}

/// Reads a JSON body and maps backend-reported failures to errors.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    let value: Option<Value> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        let message = value
            .as_ref()
            .and_then(failure_message)
            .unwrap_or_else(|| fallback_message(status, &text));
        tracing::warn!(status = status.as_u16(), "backend request failed: {}", message);
        return Err(Error::Status {
            status: status.as_u16(),
            message,
        });
    }

    let value = match value {
        Some(value) => value,
        None => serde_json::from_str(&text)?,
    };
    if let Some(message) = failure_message(&value) {
        tracing::warn!("backend reported failure: {}", message);
        return Err(Error::backend(message));
    }
    Ok(serde_json::from_value(value)?)
}

/// Message of a logical failure body, `None` for success bodies.
fn failure_message(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        return Some(value_text(error));
    }
    match object.get("status").and_then(Value::as_str) {
        Some(status) if status != "success" => Some(
            object
                .get("message")
                .map(value_text)
                .unwrap_or_else(|| format!("request failed with status '{status}'")),
        ),
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn fallback_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    } else {
        body.chars().take(200).collect()
    }
}

async fn status_error(response: Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .as_ref()
        .and_then(failure_message)
        .unwrap_or_else(|| fallback_message(status, &text));
    Error::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_shapes_are_recognized() {
        assert_eq!(
            failure_message(&json!({"status": "error", "message": "Sheet not found"})).as_deref(),
            Some("Sheet not found")
        );
        assert_eq!(
            failure_message(&json!({"error": "Missing data"})).as_deref(),
            Some("Missing data")
        );
        assert_eq!(failure_message(&json!({"status": "success", "data": []})), None);
        assert_eq!(failure_message(&json!([["Grammar", "asst_1"]])), None);
        assert_eq!(failure_message(&json!({"improved_text": "x"})), None);
    }

    #[test]
    fn base_url_is_normalized_and_validated() {
        let client = BackendClient::new("http://localhost:5000/api").unwrap();
        assert_eq!(
            client.endpoint("analyze").unwrap().as_str(),
            "http://localhost:5000/api/analyze"
        );
        assert!(matches!(
            BackendClient::new("ftp://example.com"),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            BackendClient::new("not a url"),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn save_request_flattens_params() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "product_name": "Chair",
            "product_description": {"original": "a", "improved": "b", "changes": []}
        }))
        .unwrap();
        let params = AnalysisParams {
            sheet_id: "s".into(),
            product_name_column: "Název".into(),
            analysis_column: "Popis".into(),
            assistant_id: "asst".into(),
        };
        let body = serde_json::to_value(SaveRequest::new(params, &result.normalized())).unwrap();
        assert_eq!(body["sheet_id"], "s");
        assert_eq!(body["product_name"], "Chair");
        assert_eq!(body["improved_text"], "b");
        assert!(body["changes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn page_reports_more() {
        let page: ResponsePage =
            serde_json::from_value(json!({"status": "success", "responses": [], "page": 1, "per_page": 10, "total_pages": 3, "total": 25}))
                .unwrap();
        assert!(page.has_more());
    }
}
