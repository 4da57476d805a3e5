pub mod error;
pub mod types;

pub use error::{Result, SheetsError};
pub use types::{Spreadsheet, ValueInputOption, ValueRange};

use std::time::Duration;

use reqwest::{Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use types::{BatchUpdateRequest, CreateProperties, CreateRequest, ValuesBody, ValuesResponse};

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsClient {
    client: reqwest::Client,
    access_token: String,
}

impl SheetsClient {
    /// Client whose every request is bounded by `timeout`.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SheetsError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            access_token: access_token.into(),
        })
    }

    fn base_url() -> Result<Url> {
        Url::parse(BASE_URL).map_err(|e| SheetsError::InvalidUrl(e.to_string()))
    }

    /// `{base}/{spreadsheet_id}/values/{range}{suffix}` with the range percent-encoded.
    fn values_url(&self, spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url> {
        let mut url = Self::base_url()?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(BASE_URL.to_string()))?
            .push(spreadsheet_id)
            .push("values")
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned + Default>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        if self.access_token.is_empty() {
            return Err(SheetsError::MissingToken);
        }

        tracing::debug!(%method, url = %url, "Sheets request");
        let mut req = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Create a spreadsheet and write `header` into row 1 of `sheet`.
    pub async fn create_spreadsheet(
        &self,
        title: &str,
        sheet: &str,
        header: &[&str],
    ) -> Result<Spreadsheet> {
        let url = Self::base_url()?;
        let body = CreateRequest {
            properties: CreateProperties { title },
        };
        let created: Option<Spreadsheet> = self.send(Method::POST, url, Some(&body)).await?;
        let created = created.ok_or_else(|| {
            SheetsError::Parse("spreadsheets.create returned an empty body".to_string())
        })?;

        let header_range = format!("{sheet}!A1:{}1", column_letter(header.len()));
        let header_row = vec![header.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
        self.update_values(
            &created.spreadsheet_id,
            &header_range,
            &header_row,
            ValueInputOption::Raw,
        )
        .await?;

        tracing::info!(spreadsheet_id = %created.spreadsheet_id, title, "Spreadsheet created");
        Ok(created)
    }

    /// Overwrite the cells of `range`.
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
        input: ValueInputOption,
    ) -> Result<()> {
        let mut url = self.values_url(spreadsheet_id, range, "")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());
        let _: serde_json::Value = self
            .send(Method::PUT, url, Some(&ValuesBody { values }))
            .await?;
        Ok(())
    }

    /// Read every populated row of `range`. Rows may be shorter than the range width.
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(spreadsheet_id, range, "")?;
        let resp: ValuesResponse = self.send::<(), _>(Method::GET, url, None).await?;
        Ok(resp.into_rows())
    }

    /// Append rows after the last populated row of `range`.
    pub async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
        input: ValueInputOption,
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut url = self.values_url(spreadsheet_id, range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());
        let _: serde_json::Value = self
            .send(Method::POST, url, Some(&ValuesBody { values }))
            .await?;
        tracing::debug!(spreadsheet_id, rows = values.len(), "Rows appended");
        Ok(())
    }

    /// Write several disjoint ranges in one call.
    pub async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: &[ValueRange],
        input: ValueInputOption,
    ) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let mut url = Self::base_url()?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(BASE_URL.to_string()))?
            .push(spreadsheet_id)
            .push("values:batchUpdate");
        let body = BatchUpdateRequest {
            value_input_option: input,
            data,
        };
        let _: serde_json::Value = self.send(Method::POST, url, Some(&body)).await?;
        tracing::debug!(spreadsheet_id, ranges = data.len(), "Ranges updated");
        Ok(())
    }
}

/// 1-based column number to A1 letters (1 → A, 13 → M, 27 → AA).
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Public URL of a spreadsheet.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}")
}
