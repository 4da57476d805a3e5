//! Store layout. Column order is load-bearing: updates address cells by position.

use chrono::SecondsFormat;

use crate::types::ChannelResult;

pub const SHEET_NAME: &str = "Sheet1";

pub const SHEET_HEADERS: [&str; 13] = [
    "Channel Name",
    "YouTube Channel URL",
    "One-line Description",
    "Subscriber Count",
    "Video Count",
    "Instagram",
    "TikTok",
    "Blog / Website",
    "Newsletter",
    "Category",
    "Subcategory",
    "Confidence",
    "Last Updated",
];

pub const COLUMN_COUNT: usize = SHEET_HEADERS.len();

// 0-based positions within a row.
pub const COL_NAME: usize = 0;
pub const COL_URL: usize = 1;
pub const COL_SUBSCRIBERS: usize = 3;
pub const COL_LAST_UPDATED: usize = 12;

/// Row number of the first data row; row 1 holds the headers.
pub const FIRST_DATA_ROW: usize = 2;

/// A1 range covering every column of the store.
pub fn full_range() -> String {
    format!("{SHEET_NAME}!A:M")
}

/// A1 address of one cell, `column` 0-based, `row` 1-based.
pub fn cell_address(column: usize, row: usize) -> String {
    let letter = (b'A' + column as u8) as char;
    format!("{SHEET_NAME}!{letter}{row}")
}

pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Full store row for a newly discovered channel.
pub fn channel_row(result: &ChannelResult) -> Vec<String> {
    let ai = result.ai.as_ref();
    let text = |v: Option<&String>| v.cloned().unwrap_or_default();

    vec![
        result.channel_title.clone(),
        result.channel_url.clone(),
        text(ai.and_then(|a| a.one_liner.as_ref())),
        result.subscriber_count.to_string(),
        result.video_count.to_string(),
        text(result.instagram.as_ref()),
        text(result.tiktok.as_ref()),
        text(result.website.as_ref()),
        text(result.newsletter.as_ref()),
        text(ai.and_then(|a| a.category.as_ref())),
        text(ai.and_then(|a| a.subcategory.as_ref())),
        ai.map(|a| a.confidence.to_string()).unwrap_or_default(),
        format_timestamp(&result.last_updated),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelAnnotation;
    use chrono::TimeZone;

    fn result(ai: Option<ChannelAnnotation>) -> ChannelResult {
        ChannelResult {
            channel_id: "UC1".into(),
            channel_title: "Bread Lab".into(),
            channel_url: "https://www.youtube.com/channel/UC1".into(),
            description: "desc".into(),
            subscriber_count: 1200,
            video_count: 40,
            instagram: Some("https://instagram.com/breadlab".into()),
            tiktok: None,
            website: None,
            newsletter: Some("https://breadlab.substack.com".into()),
            ai,
            last_updated: chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn headers_fix_positional_columns() {
        assert_eq!(COLUMN_COUNT, 13);
        assert_eq!(SHEET_HEADERS[COL_URL], "YouTube Channel URL");
        assert_eq!(SHEET_HEADERS[COL_SUBSCRIBERS], "Subscriber Count");
        assert_eq!(SHEET_HEADERS[COL_LAST_UPDATED], "Last Updated");
    }

    #[test]
    fn cell_addresses() {
        assert_eq!(cell_address(COL_SUBSCRIBERS, 7), "Sheet1!D7");
        assert_eq!(cell_address(COL_LAST_UPDATED, 7), "Sheet1!M7");
    }

    #[test]
    fn row_without_annotation_leaves_ai_columns_blank() {
        let row = channel_row(&result(None));
        assert_eq!(row.len(), COLUMN_COUNT);
        assert_eq!(row[2], "");
        assert_eq!(row[9], "");
        assert_eq!(row[11], "");
        assert_eq!(row[12], "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn row_with_annotation() {
        let row = channel_row(&result(Some(ChannelAnnotation {
            category: Some("Food".into()),
            subcategory: None,
            one_liner: Some("Bakes bread.".into()),
            confidence: 0.9,
        })));
        assert_eq!(row[2], "Bakes bread.");
        assert_eq!(row[3], "1200");
        assert_eq!(row[5], "https://instagram.com/breadlab");
        assert_eq!(row[8], "https://breadlab.substack.com");
        assert_eq!(row[9], "Food");
        assert_eq!(row[10], "");
        assert_eq!(row[11], "0.9");
    }
}
