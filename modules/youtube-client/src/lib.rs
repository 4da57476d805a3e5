pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::{Channel, SearchPage};

use std::time::Duration;

use serde::de::DeserializeOwned;
use types::{ChannelsResponse, SearchResponse};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Upper bound on ids per `channels.list` call.
pub const MAX_IDS_PER_LOOKUP: usize = 50;

pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
}

impl YouTubeClient {
    /// Client whose every request is bounded by `timeout`.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| YouTubeError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        if self.api_key.is_empty() {
            return Err(YouTubeError::MissingApiKey);
        }

        let url = format!("{BASE_URL}/{path}");
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Search recent videos and return the channels that uploaded them.
    pub async fn search_video_channels(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let max_results = max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("order", "date"),
            ("q", query),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let resp: SearchResponse = self.get("search", &params).await?;
        let page = resp.into_page();
        tracing::debug!(
            query,
            channels = page.channel_ids.len(),
            has_next = page.next_page_token.is_some(),
            "YouTube search page fetched"
        );
        Ok(page)
    }

    /// Look up channels by id. Unknown ids are absent from the result.
    ///
    /// Ids are sent in chunks of [`MAX_IDS_PER_LOOKUP`].
    pub async fn fetch_channels(&self, channel_ids: &[String]) -> Result<Vec<Channel>> {
        let mut channels = Vec::with_capacity(channel_ids.len());

        for chunk in channel_ids.chunks(MAX_IDS_PER_LOOKUP) {
            let ids = chunk.join(",");
            let max_results = MAX_IDS_PER_LOOKUP.to_string();
            let resp: ChannelsResponse = self
                .get(
                    "channels",
                    &[
                        ("part", "snippet,statistics"),
                        ("id", ids.as_str()),
                        ("maxResults", max_results.as_str()),
                    ],
                )
                .await?;
            channels.extend(resp.items.into_iter().filter_map(|item| item.into_channel()));
        }

        tracing::info!(
            requested = channel_ids.len(),
            found = channels.len(),
            "Fetched YouTube channels"
        );
        Ok(channels)
    }
}
