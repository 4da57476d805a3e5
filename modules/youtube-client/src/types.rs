use serde::Deserialize;

// --- Normalized types ---

/// One page of a video search, reduced to the uploading channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Channel ids in order of first appearance, duplicates removed.
    pub channel_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// A channel with the statistics discovery filters on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: u64,
    pub video_count: u64,
}

// --- search.list ---

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchItem {
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchSnippet {
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

impl SearchResponse {
    pub fn into_page(self) -> SearchPage {
        let mut channel_ids: Vec<String> = Vec::new();
        for id in self
            .items
            .into_iter()
            .filter_map(|item| item.snippet.and_then(|s| s.channel_id))
            .filter(|id| !id.is_empty())
        {
            if !channel_ids.contains(&id) {
                channel_ids.push(id);
            }
        }
        SearchPage {
            channel_ids,
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

// --- channels.list ---

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelsResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelItem {
    pub id: Option<String>,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// The API encodes counts as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
}

fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

impl ChannelItem {
    pub fn into_channel(self) -> Option<Channel> {
        let channel_id = self.id.filter(|id| !id.is_empty())?;
        let snippet = self.snippet;
        let stats = self.statistics;
        Some(Channel {
            channel_id,
            title: snippet
                .as_ref()
                .and_then(|s| s.title.clone())
                .unwrap_or_default(),
            description: snippet
                .and_then(|s| s.description)
                .unwrap_or_default(),
            subscriber_count: parse_count(
                stats.as_ref().and_then(|s| s.subscriber_count.as_deref()),
            ),
            video_count: parse_count(stats.as_ref().and_then(|s| s.video_count.as_deref())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_page_dedups_channels_and_drops_missing_snippets() {
        let resp: SearchResponse = serde_json::from_str(
            r#"{
                "nextPageToken": "CAUQAA",
                "items": [
                    {"snippet": {"channelId": "UC1"}},
                    {"snippet": {}},
                    {"snippet": {"channelId": "UC2"}},
                    {"snippet": {"channelId": "UC1"}}
                ]
            }"#,
        )
        .unwrap();
        let page = resp.into_page();
        assert_eq!(page.channel_ids, vec!["UC1", "UC2"]);
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
    }

    #[test]
    fn empty_token_means_last_page() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"items": [], "nextPageToken": ""}"#).unwrap();
        assert_eq!(resp.into_page().next_page_token, None);
    }

    #[test]
    fn channel_counts_parse_from_strings() {
        let resp: ChannelsResponse = serde_json::from_str(
            r#"{"items": [{
                "id": "UC1",
                "snippet": {"title": "Bread Lab", "description": "Sourdough daily"},
                "statistics": {"subscriberCount": "15400", "videoCount": "212"}
            }]}"#,
        )
        .unwrap();
        let channel = resp.items.into_iter().next().unwrap().into_channel().unwrap();
        assert_eq!(channel.subscriber_count, 15_400);
        assert_eq!(channel.video_count, 212);
        assert_eq!(channel.title, "Bread Lab");
    }

    #[test]
    fn hidden_statistics_default_to_zero() {
        let item: ChannelItem =
            serde_json::from_str(r#"{"id": "UC9", "snippet": {"title": "Quiet"}}"#).unwrap();
        let channel = item.into_channel().unwrap();
        assert_eq!(channel.subscriber_count, 0);
        assert_eq!(channel.video_count, 0);
        assert_eq!(channel.description, "");
    }

    #[test]
    fn item_without_id_is_dropped() {
        let item: ChannelItem = serde_json::from_str(r#"{"snippet": {"title": "x"}}"#).unwrap();
        assert!(item.into_channel().is_none());
    }
}
