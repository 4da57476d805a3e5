//! CSV export of a store.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use creatorscout_common::SHEET_HEADERS;

use crate::error::{DiscoveryError, Stage};
use crate::infra::{with_retry, RetryPolicy};
use crate::traits::TabularStore;

/// Every row of the store as CSV, newline-separated with no trailing
/// newline. An empty store renders as the header row alone.
pub async fn export_csv(
    store: &dyn TabularStore,
    store_id: &str,
    retry: RetryPolicy,
) -> Result<String, DiscoveryError> {
    let rows = with_retry(retry, "read_rows", || store.read_rows(store_id))
        .await
        .map_err(DiscoveryError::upstream(Stage::StoreRead))?;

    let csv = if rows.is_empty() {
        render(std::iter::once(SHEET_HEADERS.to_vec()))?
    } else {
        render(rows.iter())?
    };

    info!(store_id, rows = rows.len().max(1), "CSV export generated");
    Ok(csv)
}

fn render<R, F>(rows: impl IntoIterator<Item = R>) -> Result<String, DiscoveryError>
where
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    // Rows read back from a sheet can be ragged.
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| DiscoveryError::Export(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DiscoveryError::Export(e.to_string()))?;
    let mut csv = String::from_utf8(bytes).map_err(|e| DiscoveryError::Export(e.to_string()))?;
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStore;

    async fn export(rows: Vec<Vec<&str>>) -> String {
        let store = MockStore::new();
        store.put_rows(
            "sheet",
            rows.into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect(),
        );
        export_csv(&store, "sheet", RetryPolicy::none()).await.unwrap()
    }

    #[tokio::test]
    async fn empty_store_exports_header() {
        assert_eq!(export(vec![]).await, SHEET_HEADERS.join(","));
    }

    #[tokio::test]
    async fn rows_are_joined_by_newlines() {
        let csv = export(vec![vec!["Channel Name", "Notes"], vec!["Bread, Lab", "ok"]]).await;
        assert_eq!(csv, "Channel Name,Notes\n\"Bread, Lab\",ok");
    }

    #[tokio::test]
    async fn quotes_and_line_breaks_are_escaped() {
        let csv = export(vec![vec!["say \"hi\"", "line\nbreak"]]).await;
        assert_eq!(csv, "\"say \"\"hi\"\"\",\"line\nbreak\"");
    }

    #[tokio::test]
    async fn carriage_return_is_quoted() {
        let csv = export(vec![vec!["Bread\rLab", "ok"]]).await;
        assert_eq!(csv, "\"Bread\rLab\",ok");
    }

    #[tokio::test]
    async fn ragged_rows_are_kept_as_is() {
        let csv = export(vec![vec!["a", "b", "c"], vec!["d"]]).await;
        assert_eq!(csv, "a,b,c\nd");
    }
}
