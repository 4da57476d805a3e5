use std::time::Duration;

use tracing::{debug, info, warn};

use creatorscout_common::{ChannelRecord, DiscoveryRequest, SubscriberRange};

use crate::error::{DiscoveryError, Stage};
use crate::infra::{cache_key, with_retry, RetryPolicy};
use crate::traits::{Cache, ChannelSource};

const CHANNEL_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Numeric gate applied to fetched channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelFilter {
    pub min_video_count: u64,
    pub subscriber_range: SubscriberRange,
}

impl ChannelFilter {
    pub fn from_request(request: &DiscoveryRequest) -> Self {
        Self {
            min_video_count: request.min_video_count,
            subscriber_range: request.subscriber_range,
        }
    }

    pub fn matches(&self, channel: &ChannelRecord) -> bool {
        channel.video_count >= self.min_video_count
            && self.subscriber_range.contains(channel.subscriber_count)
    }
}

/// Fetch full records for `ids` and keep those passing `filter`.
///
/// Fetches are memoized for a few minutes keyed by the sorted id set, so
/// back-to-back runs over the same candidates don't re-spend quota.
pub async fn fetch_and_filter(
    source: &dyn ChannelSource,
    cache: &dyn Cache,
    ids: &[String],
    filter: &ChannelFilter,
    retry: RetryPolicy,
) -> Result<Vec<ChannelRecord>, DiscoveryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut sorted = ids.to_vec();
    sorted.sort();
    let key = cache_key("channels", &sorted);

    let cached = cache
        .get(&key)
        .and_then(|value| match serde_json::from_value::<Vec<ChannelRecord>>(value) {
            Ok(channels) => Some(channels),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable channel cache entry");
                None
            }
        });

    let channels = match cached {
        Some(channels) => {
            debug!(count = channels.len(), "Channel fetch served from cache");
            channels
        }
        None => {
            let channels = with_retry(retry, "fetch_channels", || source.fetch_channels(ids))
                .await
                .map_err(DiscoveryError::upstream(Stage::ChannelFetch))?;
            if let Ok(value) = serde_json::to_value(&channels) {
                cache.set(&key, value, CHANNEL_CACHE_TTL);
            }
            channels
        }
    };

    let fetched = channels.len();
    let kept: Vec<ChannelRecord> = channels.into_iter().filter(|c| filter.matches(c)).collect();
    info!(
        candidates = ids.len(),
        fetched,
        kept = kept.len(),
        "Channels enriched and filtered"
    );
    Ok(kept)
}
