// Test mocks for the discovery pipeline.
//
// One mock per trait seam:
// - MockSearch (ChannelSearch): pages keyed by continuation token
// - MockChannels (ChannelSource): fixed record set
// - MockClassifier (Classifier): prompt-substring → reply, with failure/hang/delay knobs
// - MockStore (TabularStore): stateful in-memory sheets
//
// Plus helpers for building channels, results and stored rows.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use ai_client::AiError;
use creatorscout_common::{
    channel_url, ChannelRecord, ChannelResult, LinkBuckets, LinkSuggestion, COL_NAME, COL_URL,
    SHEET_HEADERS,
};

use crate::error::UpstreamError;
use crate::traits::{
    CandidatePage, CellUpdate, ChannelSearch, ChannelSource, Classifier, StoreInfo, TabularStore,
};

// ---------------------------------------------------------------------------
// MockSearch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Failure {
    Fatal,
    /// Transient for this many more calls, then succeeds.
    Transient(u32),
}

/// Search pages keyed by the token that requests them (`None` = first page).
/// Unregistered tokens return an empty final page.
#[derive(Default)]
pub struct MockSearch {
    pages: HashMap<Option<String>, CandidatePage>,
    failures: Mutex<HashMap<Option<String>, Failure>>,
    queries: Mutex<Vec<(String, u32)>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, token: Option<&str>, ids: &[&str], next: Option<&str>) -> Self {
        self.pages.insert(
            token.map(String::from),
            CandidatePage {
                channel_ids: ids.iter().map(|s| s.to_string()).collect(),
                next_page_token: next.map(String::from),
            },
        );
        self
    }

    /// Every request for `token` fails non-transiently.
    pub fn fail_on(self, token: Option<&str>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(token.map(String::from), Failure::Fatal);
        self
    }

    /// The first `times` requests for `token` fail transiently.
    pub fn flaky_on(self, token: Option<&str>, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(token.map(String::from), Failure::Transient(times));
        self
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSearch for MockSearch {
    async fn search_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<CandidatePage, UpstreamError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), page_size));

        let key = page_token.map(String::from);
        if let Some(failure) = self.failures.lock().unwrap().get_mut(&key) {
            match failure {
                Failure::Fatal => return Err(UpstreamError::fatal("search quota exceeded")),
                Failure::Transient(n) if *n > 0 => {
                    *n -= 1;
                    return Err(UpstreamError::transient("search unavailable"));
                }
                Failure::Transient(_) => {}
            }
        }
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockChannels
// ---------------------------------------------------------------------------

/// Fixed channel set. Ids it doesn't know are silently omitted.
pub struct MockChannels {
    channels: HashMap<String, ChannelRecord>,
    calls: AtomicUsize,
    fail: bool,
}

impl MockChannels {
    pub fn new(channels: Vec<ChannelRecord>) -> Self {
        Self {
            channels: channels
                .into_iter()
                .map(|c| (c.channel_id.clone(), c))
                .collect(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelSource for MockChannels {
    async fn fetch_channels(&self, ids: &[String]) -> Result<Vec<ChannelRecord>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::fatal("channel lookup forbidden"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.channels.get(id).cloned())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Replies chosen by prompt substring, first rule wins. With no matching rule
/// and no default, the call fails like an upstream 500.
#[derive(Default)]
pub struct MockClassifier {
    rules: Vec<(String, Result<String, u16>)>,
    default: Option<String>,
    hang: bool,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    pub fn fail_when(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Err(500)));
        self
    }

    pub fn default_reply(mut self, reply: &str) -> Self {
        self.default = Some(reply.to_string());
        self
    }

    /// Never answer. Only a caller-side timeout gets out.
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn reply_for(&self, prompt: &str) -> ai_client::Result<String> {
        let rule = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()));
        match (rule, &self.default) {
            (Some((_, Ok(reply))), _) => Ok(reply.clone()),
            (Some((_, Err(status))), _) => Err(AiError::Api {
                status: *status,
                message: "mock failure".into(),
            }),
            (None, Some(reply)) => Ok(reply.clone()),
            (None, None) => Err(AiError::Api {
                status: 500,
                message: "no mock reply".into(),
            }),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn complete(&self, prompt: &str) -> ai_client::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hang {
            futures::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply_for(prompt)
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory sheets. Appends and cell updates are applied to the stored rows,
/// so a test can read back exactly what a run left behind.
#[derive(Default)]
pub struct MockStore {
    sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
    created: AtomicUsize,
    appends: Mutex<Vec<Vec<Vec<String>>>>,
    updates: Mutex<Vec<Vec<CellUpdate>>>,
    fail_reads: bool,
    fail_appends: bool,
    flaky_updates: Mutex<u32>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, store_id: &str, rows: Vec<Vec<String>>) -> Self {
        self.put_rows(store_id, rows);
        self
    }

    pub fn put_rows(&self, store_id: &str, rows: Vec<Vec<String>>) {
        self.sheets
            .lock()
            .unwrap()
            .insert(store_id.to_string(), rows);
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_appends(mut self) -> Self {
        self.fail_appends = true;
        self
    }

    /// The first `times` cell updates fail transiently.
    pub fn flaky_updates(self, times: u32) -> Self {
        *self.flaky_updates.lock().unwrap() = times;
        self
    }

    pub fn rows(&self, store_id: &str) -> Vec<Vec<String>> {
        self.sheets
            .lock()
            .unwrap()
            .get(store_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.appends.lock().unwrap().len()
    }

    pub fn update_calls(&self) -> Vec<Vec<CellUpdate>> {
        self.updates.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.append_calls() + self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl TabularStore for MockStore {
    async fn create_store(&self) -> Result<StoreInfo, UpstreamError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let store_id = format!("store-{n}");
        self.put_rows(&store_id, vec![header_row()]);
        Ok(StoreInfo {
            store_id,
            store_url: String::new(),
        })
    }

    async fn read_rows(&self, store_id: &str) -> Result<Vec<Vec<String>>, UpstreamError> {
        if self.fail_reads {
            return Err(UpstreamError::fatal("permission denied"));
        }
        self.sheets
            .lock()
            .unwrap()
            .get(store_id)
            .cloned()
            .ok_or_else(|| UpstreamError::fatal("Requested entity was not found"))
    }

    async fn append_rows(&self, store_id: &str, rows: &[Vec<String>]) -> Result<(), UpstreamError> {
        if self.fail_appends {
            return Err(UpstreamError::fatal("append rejected"));
        }
        self.appends.lock().unwrap().push(rows.to_vec());
        self.sheets
            .lock()
            .unwrap()
            .entry(store_id.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }

    async fn update_cells(&self, store_id: &str, updates: &[CellUpdate]) -> Result<(), UpstreamError> {
        {
            let mut flaky = self.flaky_updates.lock().unwrap();
            if *flaky > 0 {
                *flaky -= 1;
                return Err(UpstreamError::transient("backend error"));
            }
        }
        self.updates.lock().unwrap().push(updates.to_vec());

        let mut sheets = self.sheets.lock().unwrap();
        let rows = sheets.entry(store_id.to_string()).or_default();
        for update in updates {
            let index = update.row - 1;
            if rows.len() <= index {
                rows.resize(index + 1, Vec::new());
            }
            let row = &mut rows[index];
            if row.len() <= update.column {
                row.resize(update.column + 1, String::new());
            }
            row[update.column] = update.value.clone();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn channel(id: &str, subscribers: u64, videos: u64) -> ChannelRecord {
    ChannelRecord {
        channel_id: id.to_string(),
        title: format!("Channel {id}"),
        description: String::new(),
        subscriber_count: subscribers,
        video_count: videos,
    }
}

pub fn channel_with_description(id: &str, description: &str) -> ChannelRecord {
    ChannelRecord {
        description: description.to_string(),
        ..channel(id, 1_000, 10)
    }
}

/// Result with no links and no annotation, stamped now.
pub fn result_for(channel: ChannelRecord) -> ChannelResult {
    ChannelResult::assemble(
        channel,
        LinkBuckets::default(),
        LinkSuggestion::default(),
        None,
        Utc::now(),
    )
}

pub fn header_row() -> Vec<String> {
    SHEET_HEADERS.iter().map(|h| h.to_string()).collect()
}

/// Full-width stored row for `id`; every cell but name and URL holds a marker
/// so tests can tell whether a write touched it.
pub fn stored_row(id: &str, subscribers: u64) -> Vec<String> {
    let mut row: Vec<String> = (0..SHEET_HEADERS.len())
        .map(|i| format!("kept-{i}"))
        .collect();
    row[COL_NAME] = format!("Channel {id}");
    row[COL_URL] = channel_url(id);
    row[creatorscout_common::COL_SUBSCRIBERS] = subscribers.to_string();
    row
}
