// Trait seams for the discovery pipeline's collaborators.
//
// ChannelSearch + ChannelSource wrap the video platform, Classifier wraps the
// AI endpoint, TabularStore wraps the spreadsheet, Cache is the shared TTL store.
// Production impls for the HTTP clients live here; in-memory mocks in `testing`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use ai_client::{ChatModel, Mino};
use creatorscout_common::{
    cell_address, full_range, ChannelRecord, SHEET_HEADERS, SHEET_NAME,
};
use sheets_client::{spreadsheet_url, SheetsClient, ValueInputOption, ValueRange};
use youtube_client::YouTubeClient;

use crate::error::UpstreamError;

// ---------------------------------------------------------------------------
// Video platform
// ---------------------------------------------------------------------------

/// One page of search results, reduced to channel ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePage {
    pub channel_ids: Vec<String>,
    /// Absent on the last page.
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait ChannelSearch: Send + Sync {
    async fn search_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<CandidatePage, UpstreamError>;
}

#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Full records for `ids`. Unknown ids are silently omitted.
    async fn fetch_channels(&self, ids: &[String]) -> Result<Vec<ChannelRecord>, UpstreamError>;
}

#[async_trait]
impl ChannelSearch for YouTubeClient {
    async fn search_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<CandidatePage, UpstreamError> {
        let page = self
            .search_video_channels(query, page_size, page_token)
            .await?;
        Ok(CandidatePage {
            channel_ids: page.channel_ids,
            next_page_token: page.next_page_token,
        })
    }
}

#[async_trait]
impl ChannelSource for YouTubeClient {
    async fn fetch_channels(&self, ids: &[String]) -> Result<Vec<ChannelRecord>, UpstreamError> {
        let channels = YouTubeClient::fetch_channels(self, ids).await?;
        Ok(channels
            .into_iter()
            .map(|c| ChannelRecord {
                channel_id: c.channel_id,
                title: c.title,
                description: c.description,
                subscriber_count: c.subscriber_count,
                video_count: c.video_count,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// AI classifier
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Raw model reply for a prompt. Callers decode it tolerantly.
    async fn complete(&self, prompt: &str) -> ai_client::Result<String>;
}

#[async_trait]
impl Classifier for Mino {
    async fn complete(&self, prompt: &str) -> ai_client::Result<String> {
        ChatModel::complete(self, prompt).await
    }
}

// ---------------------------------------------------------------------------
// Tabular store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    pub store_id: String,
    pub store_url: String,
}

/// One cell write. `row` is 1-based (row 1 is the header), `column` 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Create an empty store with the header row written.
    async fn create_store(&self) -> Result<StoreInfo, UpstreamError>;

    /// Every row including the header, in sheet order.
    async fn read_rows(&self, store_id: &str) -> Result<Vec<Vec<String>>, UpstreamError>;

    async fn append_rows(&self, store_id: &str, rows: &[Vec<String>])
        -> Result<(), UpstreamError>;

    async fn update_cells(&self, store_id: &str, updates: &[CellUpdate])
        -> Result<(), UpstreamError>;
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn create_store(&self) -> Result<StoreInfo, UpstreamError> {
        let title = format!("CreatorScout {}", Utc::now().to_rfc3339());
        let created = self
            .create_spreadsheet(&title, SHEET_NAME, &SHEET_HEADERS)
            .await?;
        let store_url = if created.spreadsheet_url.is_empty() {
            spreadsheet_url(&created.spreadsheet_id)
        } else {
            created.spreadsheet_url
        };
        Ok(StoreInfo {
            store_id: created.spreadsheet_id,
            store_url,
        })
    }

    async fn read_rows(&self, store_id: &str) -> Result<Vec<Vec<String>>, UpstreamError> {
        Ok(self.get_values(store_id, &full_range()).await?)
    }

    async fn append_rows(
        &self,
        store_id: &str,
        rows: &[Vec<String>],
    ) -> Result<(), UpstreamError> {
        Ok(self
            .append_values(store_id, &full_range(), rows, ValueInputOption::UserEntered)
            .await?)
    }

    async fn update_cells(
        &self,
        store_id: &str,
        updates: &[CellUpdate],
    ) -> Result<(), UpstreamError> {
        let data: Vec<ValueRange> = updates
            .iter()
            .map(|u| ValueRange::single(cell_address(u.column, u.row), u.value.clone()))
            .collect();
        Ok(self
            .batch_update_values(store_id, &data, ValueInputOption::UserEntered)
            .await?)
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Process-wide TTL cache, injected into the stages that memoize upstream calls.
///
/// A stored `Value::Null` is a cached negative result, distinct from a miss.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);

    /// Drop every expired entry and return how many went. Stores that expire
    /// on their own can keep the default.
    fn evict_expired(&self) -> usize {
        0
    }
}
