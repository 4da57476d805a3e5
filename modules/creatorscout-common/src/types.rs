use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ValidationError;

// --- Request bounds ---

/// Results requested per search page. Upstream quota caps this at 50.
pub const PAGE_SIZE_MAX: u32 = 50;

/// Search pages fetched per run.
pub const MAX_PAGES_MAX: u32 = 5;

pub const MIN_VIDEO_COUNT_MAX: u64 = 1_000_000;

/// Annotations below this confidence keep their score but lose their descriptive fields.
pub const CONFIDENCE_THRESHOLD: f64 = 0.85;

// --- Request ---

/// Inclusive subscriber bounds. `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl SubscriberRange {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, subscribers: u64) -> bool {
        self.min.is_none_or(|min| subscribers >= min)
            && self.max.is_none_or(|max| subscribers <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct DiscoveryRequest {
    #[builder(setter(into))]
    pub query: String,
    #[builder(setter(into))]
    pub category: String,
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub subcategory: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub subscriber_range: SubscriberRange,
    #[builder(default)]
    #[serde(default)]
    pub min_video_count: u64,
    #[builder(default = 20)]
    pub page_size: u32,
    #[builder(default = 1)]
    pub max_pages: u32,
    /// Existing store to reconcile against. A new store is created when absent.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub store_id: Option<String>,
}

impl DiscoveryRequest {
    /// Search string sent upstream: category, subcategory and free text, blanks dropped.
    pub fn composed_query(&self) -> String {
        [
            Some(self.category.as_str()),
            self.subcategory.as_deref(),
            Some(self.query.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Reject requests that would fan out unbounded or are malformed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("query", &self.query, 2, 120)?;
        check_length("category", &self.category, 2, 60)?;
        if let Some(sub) = &self.subcategory {
            check_length("subcategory", sub, 2, 60)?;
        }
        check_range(
            "min_video_count",
            self.min_video_count,
            0,
            MIN_VIDEO_COUNT_MAX,
        )?;
        check_range("page_size", self.page_size as u64, 1, PAGE_SIZE_MAX as u64)?;
        check_range("max_pages", self.max_pages as u64, 1, MAX_PAGES_MAX as u64)?;
        if let (Some(min), Some(max)) = (self.subscriber_range.min, self.subscriber_range.max) {
            if min > max {
                return Err(ValidationError::InvertedRange { min, max });
            }
        }
        Ok(())
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length {
            field,
            min,
            max,
            len,
        });
    }
    Ok(())
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

// --- Channels ---

/// A channel as fetched from the video platform. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: u64,
    pub video_count: u64,
}

impl ChannelRecord {
    /// Public URL, also the natural key in the store.
    pub fn channel_url(&self) -> String {
        channel_url(&self.channel_id)
    }
}

pub fn channel_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/channel/{channel_id}")
}

// --- Links ---

/// Links found in a channel description, sorted into known slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBuckets {
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub newsletter: Option<String>,
    pub website: Option<String>,
    /// Links no rule claimed, in extraction order.
    pub remaining: Vec<String>,
}

/// AI pick among the links no rule claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSuggestion {
    pub blog: Option<String>,
    pub newsletter: Option<String>,
}

// --- Annotation ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnnotation {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub one_liner: Option<String>,
    pub confidence: f64,
}

impl ChannelAnnotation {
    pub fn is_confident(&self) -> bool {
        self.confidence >= CONFIDENCE_THRESHOLD
    }

    /// Null the descriptive fields below the confidence threshold. The score is kept.
    pub fn suppress_low_confidence(self) -> Self {
        if self.is_confident() {
            return self;
        }
        Self {
            category: None,
            subcategory: None,
            one_liner: None,
            confidence: self.confidence,
        }
    }

    /// Shape checks on model output: labels 2-80 chars, summary at most
    /// 160 chars and 20 words, confidence within [0, 1].
    pub fn is_well_formed(&self) -> bool {
        let label_ok = |v: &Option<String>| {
            v.as_ref()
                .is_none_or(|s| (2..=80).contains(&s.chars().count()))
        };
        let summary_ok = self.one_liner.as_ref().is_none_or(|s| {
            s.chars().count() <= 160 && s.split_whitespace().count() <= 20
        });
        label_ok(&self.category)
            && label_ok(&self.subcategory)
            && summary_ok
            && (0.0..=1.0).contains(&self.confidence)
    }
}

// --- Results ---

/// A fully enriched channel, the unit persisted to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel_id: String,
    pub channel_title: String,
    pub channel_url: String,
    pub description: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub website: Option<String>,
    pub newsletter: Option<String>,
    pub ai: Option<ChannelAnnotation>,
    pub last_updated: DateTime<Utc>,
}

impl ChannelResult {
    /// Merge rule-based buckets with the AI suggestion. Rule matches win.
    pub fn assemble(
        channel: ChannelRecord,
        buckets: LinkBuckets,
        suggestion: LinkSuggestion,
        ai: Option<ChannelAnnotation>,
        now: DateTime<Utc>,
    ) -> Self {
        let channel_url = channel.channel_url();
        Self {
            channel_id: channel.channel_id,
            channel_title: channel.title,
            channel_url,
            description: channel.description,
            subscriber_count: channel.subscriber_count,
            video_count: channel.video_count,
            instagram: buckets.instagram,
            tiktok: buckets.tiktok,
            website: buckets.website.or(suggestion.blog),
            newsletter: buckets.newsletter.or(suggestion.newsletter),
            ai,
            last_updated: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub store_id: String,
    pub store_url: String,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub pages_processed: u32,
    pub results: Vec<ChannelResult>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(confidence: f64) -> ChannelAnnotation {
        ChannelAnnotation {
            category: Some("Food".into()),
            subcategory: Some("Baking".into()),
            one_liner: Some("Weekly sourdough experiments.".into()),
            confidence,
        }
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = SubscriberRange::new(Some(1_000), Some(5_000));
        assert!(range.contains(1_000));
        assert!(range.contains(5_000));
        assert!(!range.contains(999));
        assert!(!range.contains(5_001));
    }

    #[test]
    fn unbounded_range_accepts_zero() {
        assert!(SubscriberRange::default().contains(0));
        assert!(SubscriberRange::new(None, Some(0)).contains(0));
    }

    #[test]
    fn composed_query_skips_missing_subcategory() {
        let req = DiscoveryRequest::builder()
            .query(" sourdough ")
            .category("cooking")
            .build();
        assert_eq!(req.composed_query(), "cooking sourdough");

        let req = DiscoveryRequest::builder()
            .query("sourdough")
            .category("cooking")
            .subcategory("baking")
            .build();
        assert_eq!(req.composed_query(), "cooking baking sourdough");
    }

    #[test]
    fn low_confidence_nulls_descriptive_fields() {
        let suppressed = annotation(0.84).suppress_low_confidence();
        assert_eq!(suppressed.category, None);
        assert_eq!(suppressed.subcategory, None);
        assert_eq!(suppressed.one_liner, None);
        assert_eq!(suppressed.confidence, 0.84);
    }

    #[test]
    fn threshold_confidence_is_kept() {
        let kept = annotation(0.85).suppress_low_confidence();
        assert_eq!(kept, annotation(0.85));
    }

    #[test]
    fn long_summary_is_malformed() {
        let mut a = annotation(0.9);
        a.one_liner = Some(vec!["word"; 21].join(" "));
        assert!(!a.is_well_formed());
    }

    #[test]
    fn confidence_outside_unit_interval_is_malformed() {
        assert!(!annotation(1.2).is_well_formed());
        assert!(!annotation(-0.1).is_well_formed());
        assert!(annotation(1.0).is_well_formed());
    }

    #[test]
    fn assemble_prefers_rule_links_over_suggestion() {
        let channel = ChannelRecord {
            channel_id: "UC1".into(),
            title: "Bread Lab".into(),
            description: String::new(),
            subscriber_count: 10,
            video_count: 3,
        };
        let buckets = LinkBuckets {
            website: Some("https://breadlab.example".into()),
            ..Default::default()
        };
        let suggestion = LinkSuggestion {
            blog: Some("https://other.example".into()),
            newsletter: Some("https://news.example".into()),
        };
        let result = ChannelResult::assemble(channel, buckets, suggestion, None, Utc::now());
        assert_eq!(result.website.as_deref(), Some("https://breadlab.example"));
        assert_eq!(result.newsletter.as_deref(), Some("https://news.example"));
        assert_eq!(result.channel_url, "https://www.youtube.com/channel/UC1");
    }
}
