//! AI annotation stage.
//!
//! Each channel gets two lookups: a pick among its leftover links and a
//! descriptive classification. Both are memoized in the shared cache and both
//! degrade to "nothing" on failure, so one bad reply never sinks a run.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use ai_client::{decode_json, AiError};
use creatorscout_common::{ChannelAnnotation, ChannelRecord, ChannelResult, LinkSuggestion};

use crate::infra::cache_key;
use crate::links::{classify_links, extract_links};
use crate::traits::{Cache, Classifier};

const SUCCESS_TTL: Duration = Duration::from_secs(12 * 60 * 60);
const FAILURE_TTL: Duration = Duration::from_secs(10 * 60);

/// Description prefix that participates in the annotation cache key.
const DESCRIPTION_KEY_CHARS: usize = 200;

pub struct Annotator {
    classifier: Arc<dyn Classifier>,
    cache: Arc<dyn Cache>,
    call_timeout: Duration,
}

impl Annotator {
    pub fn new(classifier: Arc<dyn Classifier>, cache: Arc<dyn Cache>, call_timeout: Duration) -> Self {
        Self {
            classifier,
            cache,
            call_timeout,
        }
    }

    /// Annotate every channel with at most `workers` channels in flight.
    ///
    /// Output order is unspecified; each result carries its channel id.
    pub async fn annotate_all(&self, channels: Vec<ChannelRecord>, workers: usize) -> Vec<ChannelResult> {
        let evicted = self.cache.evict_expired();
        if evicted > 0 {
            debug!(evicted, "Evicted expired cache entries");
        }
        if channels.is_empty() {
            return Vec::new();
        }
        let total = channels.len();
        let workers = workers.clamp(1, total);
        let queue = Mutex::new(VecDeque::from(channels));
        let queue = &queue;

        let pool = (0..workers).map(move |_| async move {
            let mut done = Vec::new();
            loop {
                let next = queue.lock().await.pop_front();
                let Some(channel) = next else { break };
                done.push(self.annotate(channel).await);
            }
            done
        });

        let results: Vec<ChannelResult> = join_all(pool).await.into_iter().flatten().collect();
        let annotated = results.iter().filter(|r| r.ai.is_some()).count();
        info!(total, annotated, workers, "Annotation stage complete");
        results
    }

    /// Rule-based link buckets, the AI link pick, then the AI classification.
    pub async fn annotate(&self, channel: ChannelRecord) -> ChannelResult {
        let buckets = classify_links(&extract_links(&channel.description));
        let suggestion = self.suggest_links(&buckets.remaining).await;
        let ai = self.analyze_channel(&channel.title, &channel.description).await;
        debug!(
            channel_id = channel.channel_id.as_str(),
            leftover_links = buckets.remaining.len(),
            annotated = ai.is_some(),
            "Channel annotated"
        );
        ChannelResult::assemble(channel, buckets, suggestion, ai, Utc::now())
    }

    /// Descriptive classification for one channel. `None` when the model
    /// failed, timed out, or answered out of shape.
    pub async fn analyze_channel(&self, title: &str, description: &str) -> Option<ChannelAnnotation> {
        let prefix: String = description.chars().take(DESCRIPTION_KEY_CHARS).collect();
        let key = cache_key("annotation", &(title, prefix));
        let prompt = annotation_prompt(title, description);

        self.memoized("annotation", &key, &prompt, |annotation: ChannelAnnotation| {
            if annotation.is_well_formed() {
                Ok(annotation.suppress_low_confidence())
            } else {
                Err(AiError::Parse("annotation out of bounds".into()))
            }
        })
        .await
    }

    /// AI pick of one blog and one newsletter among `links`.
    pub async fn suggest_links(&self, links: &[String]) -> LinkSuggestion {
        if links.is_empty() {
            return LinkSuggestion::default();
        }
        let key = cache_key("links", links);
        let prompt = link_prompt(links);

        self.memoized("links", &key, &prompt, |suggestion: LinkSuggestion| {
            let valid = |v: &Option<String>| v.as_deref().is_none_or(|s| Url::parse(s).is_ok());
            if valid(&suggestion.blog) && valid(&suggestion.newsletter) {
                Ok(suggestion)
            } else {
                Err(AiError::Parse("suggested link is not a URL".into()))
            }
        })
        .await
        .unwrap_or_default()
    }

    /// Cache-first lookup. Failures are cached as `null` for a shorter TTL
    /// and come back as `None` until they expire.
    async fn memoized<T, F>(&self, kind: &'static str, key: &str, prompt: &str, check: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(T) -> ai_client::Result<T>,
    {
        if let Some(hit) = self.cache.get(key) {
            if hit.is_null() {
                debug!(kind, "Cached failure, skipping AI call");
                return None;
            }
            match serde_json::from_value(hit) {
                Ok(value) => return Some(value),
                Err(e) => warn!(kind, error = %e, "Discarding unreadable cache entry"),
            }
        }

        let outcome = match self.ask(prompt).await {
            Ok(text) => decode_json::<T>(&text).and_then(check),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => {
                if let Ok(json) = serde_json::to_value(&value) {
                    self.cache.set(key, json, SUCCESS_TTL);
                }
                Some(value)
            }
            Err(e) => {
                warn!(kind, error = %e, "AI lookup failed");
                self.cache.set(key, serde_json::Value::Null, FAILURE_TTL);
                None
            }
        }
    }

    async fn ask(&self, prompt: &str) -> ai_client::Result<String> {
        tokio::time::timeout(self.call_timeout, self.classifier.complete(prompt))
            .await
            .map_err(|_| AiError::Timeout(self.call_timeout))?
    }
}

// =============================================================================
// Prompts
// =============================================================================

pub fn annotation_prompt(title: &str, description: &str) -> String {
    let description = if description.trim().is_empty() {
        "No description."
    } else {
        description
    };
    [
        "Return JSON only. No markdown, no explanations, no emojis.",
        "Do not include personal claims.",
        "If unsure about any field, use null.",
        "One-line description must be max 20 words.",
        "If confidence is below 0.85, set category, subcategory, one_liner to null.",
        "JSON schema:",
        "{",
        "  \"category\": string | null,",
        "  \"subcategory\": string | null,",
        "  \"one_liner\": string | null,",
        "  \"confidence\": number",
        "}",
        "",
        &format!("Channel title: {title}"),
        &format!("Channel description: {description}"),
    ]
    .join("\n")
}

pub fn link_prompt(links: &[String]) -> String {
    let mut lines = vec![
        "Return JSON only. No markdown, no explanations, no emojis.".to_string(),
        "Do not include personal claims.".to_string(),
        "Pick at most one blog/website link and one newsletter link.".to_string(),
        "If unsure, use null.".to_string(),
        "JSON schema:".to_string(),
        "{".to_string(),
        "  \"blog\": string | null,".to_string(),
        "  \"newsletter\": string | null".to_string(),
        "}".to_string(),
        "Links:".to_string(),
    ];
    lines.extend(links.iter().cloned());
    lines.join("\n")
}
