//! Spreadsheet data as served by the backend.
//!
//! Rows are JSON records keyed by column header. The catalog sheets use Czech
//! headers; the defaults below match them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::AnalysisResult;

/// Column holding the catalog item number.
pub const ITEM_NUMBER_COLUMN: &str = "Číslo položky";
/// Default product-name column.
pub const PRODUCT_NAME_COLUMN: &str = "Název";
/// Default analysis (description) column.
pub const DESCRIPTION_COLUMN: &str = "Popis";

pub type Row = Map<String, Value>;

/// Body of a successful `/get_sheet_data` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetData {
    #[serde(default, rename = "data")]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub analysis_results: Vec<AnalysisResult>,
}

/// A spreadsheet registered with the backend (`/get-saved-sheets`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSheet {
    #[serde(default)]
    pub id: Option<i64>,
    pub sheet_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Text content of one cell; missing and null cells are empty.
pub fn cell_text(row: &Row, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl SheetData {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Product-name column preselected after a load.
    pub fn default_product_name_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.as_str() == PRODUCT_NAME_COLUMN)
            .map(String::as_str)
    }

    /// Analysis column preselected after a load.
    pub fn default_analysis_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.as_str() == DESCRIPTION_COLUMN)
            .map(String::as_str)
    }

    /// Number of rows an analysis over these two columns will produce.
    pub fn rows_to_analyze(&self, product_column: &str, analysis_column: &str) -> usize {
        self.rows
            .iter()
            .filter(|row| {
                !cell_text(row, product_column).is_empty()
                    && !cell_text(row, analysis_column).is_empty()
            })
            .count()
    }

    /// Index of the first row whose product name matches `name`, ignoring case
    /// and surrounding whitespace.
    pub fn find_row_by_product_name(&self, product_column: &str, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.rows
            .iter()
            .position(|row| cell_text(row, product_column).trim().to_lowercase() == wanted)
    }

    pub fn item_number(&self, row_index: usize) -> Option<String> {
        self.rows
            .get(row_index)
            .map(|row| cell_text(row, ITEM_NUMBER_COLUMN))
            .filter(|n| !n.is_empty())
    }

    /// Updates one cell locally after a successful write-back.
    pub fn set_cell(&mut self, row_index: usize, column: &str, value: &str) -> bool {
        match self.rows.get_mut(row_index) {
            Some(row) => {
                row.insert(column.to_owned(), Value::String(value.to_owned()));
                true
            }
            None => false,
        }
    }
}
