use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use creatorscout_common::{
    channel_row, format_timestamp, ChannelResult, COL_LAST_UPDATED, COL_SUBSCRIBERS, COL_URL,
    FIRST_DATA_ROW,
};

use crate::traits::CellUpdate;

/// A data row already in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRow {
    /// 1-based sheet row.
    pub row: usize,
    pub cells: Vec<String>,
}

/// Snapshot of the store keyed by channel URL. Built once per run, read-only.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    rows: HashMap<String, ExistingRow>,
}

impl RowIndex {
    /// Index rows as returned by the store, header included. Rows without a
    /// URL are ignored; when a URL repeats, the last occurrence wins.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut index = HashMap::new();
        for (offset, cells) in rows.iter().enumerate().skip(FIRST_DATA_ROW - 1) {
            let Some(url) = cells.get(COL_URL).map(|u| u.trim()) else {
                continue;
            };
            if url.is_empty() {
                continue;
            }
            index.insert(
                url.to_string(),
                ExistingRow {
                    row: offset + 1,
                    cells: cells.clone(),
                },
            );
        }
        Self { rows: index }
    }

    pub fn get(&self, channel_url: &str) -> Option<&ExistingRow> {
        self.rows.get(channel_url)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Refresh of an existing row. Only these two fields are ever rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberUpdate {
    pub row: usize,
    pub subscriber_count: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub appends: Vec<Vec<String>>,
    pub updates: Vec<SubscriberUpdate>,
    pub skipped: usize,
}

impl ReconcilePlan {
    pub fn added(&self) -> usize {
        self.appends.len()
    }

    pub fn updated(&self) -> usize {
        self.updates.len()
    }

    /// Cell writes for every update: subscriber count and timestamp.
    pub fn cell_updates(&self) -> Vec<CellUpdate> {
        self.updates
            .iter()
            .flat_map(|u| {
                [
                    CellUpdate {
                        row: u.row,
                        column: COL_SUBSCRIBERS,
                        value: u.subscriber_count.to_string(),
                    },
                    CellUpdate {
                        row: u.row,
                        column: COL_LAST_UPDATED,
                        value: format_timestamp(&u.last_updated),
                    },
                ]
            })
            .collect()
    }
}

/// Split results into appends and updates against the snapshot.
///
/// Results with no channel id, or whose URL was already planned earlier in
/// this batch, are counted as skipped and written nowhere.
pub fn reconcile(results: &[ChannelResult], index: &RowIndex) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut planned = HashSet::new();

    for result in results {
        if result.channel_id.trim().is_empty() || !planned.insert(result.channel_url.as_str()) {
            plan.skipped += 1;
            continue;
        }
        match index.get(&result.channel_url) {
            Some(existing) => plan.updates.push(SubscriberUpdate {
                row: existing.row,
                subscriber_count: result.subscriber_count,
                last_updated: result.last_updated,
            }),
            None => plan.appends.push(channel_row(result)),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{channel, result_for};
    use creatorscout_common::{SHEET_HEADERS, COL_NAME};

    fn header() -> Vec<String> {
        SHEET_HEADERS.iter().map(|h| h.to_string()).collect()
    }

    fn stored(name: &str, url: &str) -> Vec<String> {
        let mut row = vec![String::new(); SHEET_HEADERS.len()];
        row[COL_NAME] = name.into();
        row[COL_URL] = url.into();
        row
    }

    #[test]
    fn index_uses_sheet_row_numbers() {
        let rows = vec![
            header(),
            stored("A", "https://www.youtube.com/channel/A"),
            stored("", ""),
            stored("B", "https://www.youtube.com/channel/B"),
        ];
        let index = RowIndex::from_rows(&rows);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("https://www.youtube.com/channel/A").unwrap().row, 2);
        assert_eq!(index.get("https://www.youtube.com/channel/B").unwrap().row, 4);
    }

    #[test]
    fn header_only_store_is_empty() {
        assert!(RowIndex::from_rows(&[header()]).is_empty());
        assert!(RowIndex::from_rows(&[]).is_empty());
    }

    #[test]
    fn repeated_url_keeps_later_row() {
        let url = "https://www.youtube.com/channel/A";
        let rows = vec![header(), stored("first", url), stored("second", url)];
        let index = RowIndex::from_rows(&rows);
        assert_eq!(index.get(url).unwrap().row, 3);
    }

    #[test]
    fn known_channel_becomes_update() {
        let rows = vec![header(), stored("X", "https://www.youtube.com/channel/X")];
        let index = RowIndex::from_rows(&rows);
        let results = vec![result_for(channel("X", 1500, 10)), result_for(channel("Y", 20, 3))];

        let plan = reconcile(&results, &index);

        assert_eq!(plan.updated(), 1);
        assert_eq!(plan.updates[0].row, 2);
        assert_eq!(plan.updates[0].subscriber_count, 1500);
        assert_eq!(plan.added(), 1);
        assert_eq!(plan.appends[0][COL_URL], "https://www.youtube.com/channel/Y");
    }

    #[test]
    fn update_writes_only_subscribers_and_timestamp() {
        let rows = vec![header(), stored("X", "https://www.youtube.com/channel/X")];
        let plan = reconcile(&[result_for(channel("X", 1500, 10))], &RowIndex::from_rows(&rows));

        let cells = plan.cell_updates();
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.row == 2));
        let columns: Vec<_> = cells.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec![COL_SUBSCRIBERS, COL_LAST_UPDATED]);
        assert_eq!(cells[0].value, "1500");
    }

    #[test]
    fn duplicates_and_blank_ids_are_skipped() {
        let results = vec![
            result_for(channel("X", 1, 1)),
            result_for(channel("X", 2, 2)),
            result_for(channel("", 3, 3)),
        ];
        let plan = reconcile(&results, &RowIndex::default());
        assert_eq!(plan.added(), 1);
        assert_eq!(plan.skipped, 2);
        assert_eq!(plan.added() + plan.updated() + plan.skipped, results.len());
    }
}
