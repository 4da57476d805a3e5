use serde::{Deserialize, Serialize};

/// A spreadsheet as returned by `spreadsheets.create`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Spreadsheet {
    #[serde(rename = "spreadsheetId")]
    pub spreadsheet_id: String,
    #[serde(rename = "spreadsheetUrl", default)]
    pub spreadsheet_url: String,
}

/// A block of cell values addressed by A1 range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueRange {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    pub fn single(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            values: vec![vec![value.into()]],
        }
    }
}

/// How the API interprets written values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueInputOption {
    #[serde(rename = "RAW")]
    Raw,
    #[serde(rename = "USER_ENTERED")]
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRequest<'a> {
    pub properties: CreateProperties<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateProperties<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ValuesBody<'a> {
    pub values: &'a [Vec<String>],
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchUpdateRequest<'a> {
    #[serde(rename = "valueInputOption")]
    pub value_input_option: ValueInputOption,
    pub data: &'a [ValueRange],
}

/// `values.get` response. Trailing empty cells and rows are omitted by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ValuesResponse {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValuesResponse {
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
