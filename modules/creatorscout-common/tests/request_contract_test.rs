//! Request contract tests.
//!
//! These pin down what the pipeline may assume about its input:
//! - Fan-out bounds (page size, page count) are enforced before any upstream call
//! - Subscriber bounds use `None` for "unbounded", never a sentinel number
//! - Requests survive a JSON round trip from the CLI/HTTP layer with defaults applied

use creatorscout_common::*;
use serde_json::json;

fn base() -> DiscoveryRequest {
    DiscoveryRequest::builder()
        .query("sourdough")
        .category("cooking")
        .build()
}

// =========================================================================
// Bounds
// =========================================================================

#[test]
fn builder_defaults_are_valid() {
    let req = base();
    assert_eq!(req.page_size, 20);
    assert_eq!(req.max_pages, 1);
    assert!(req.validate().is_ok());
}

#[test]
fn page_size_above_fifty_is_rejected() {
    let mut req = base();
    req.page_size = PAGE_SIZE_MAX + 1;
    assert!(matches!(
        req.validate(),
        Err(ValidationError::OutOfRange { field: "page_size", .. })
    ));
}

#[test]
fn zero_pages_is_rejected() {
    let mut req = base();
    req.max_pages = 0;
    assert!(matches!(
        req.validate(),
        Err(ValidationError::OutOfRange { field: "max_pages", .. })
    ));
}

#[test]
fn six_pages_is_rejected() {
    let mut req = base();
    req.max_pages = MAX_PAGES_MAX + 1;
    assert!(req.validate().is_err());
}

#[test]
fn one_char_query_is_rejected() {
    let mut req = base();
    req.query = "x".into();
    assert!(matches!(
        req.validate(),
        Err(ValidationError::Length { field: "query", .. })
    ));
}

#[test]
fn short_subcategory_is_rejected_only_when_present() {
    let mut req = base();
    req.subcategory = Some("a".into());
    assert!(req.validate().is_err());
    req.subcategory = None;
    assert!(req.validate().is_ok());
}

#[test]
fn inverted_subscriber_range_is_rejected() {
    let mut req = base();
    req.subscriber_range = SubscriberRange::new(Some(10_000), Some(100));
    assert_eq!(
        req.validate(),
        Err(ValidationError::InvertedRange {
            min: 10_000,
            max: 100
        })
    );
}

#[test]
fn zero_minimum_is_a_real_filter() {
    let range = SubscriberRange::new(Some(0), Some(0));
    assert!(range.contains(0));
    assert!(!range.contains(1));
}

// =========================================================================
// Wire shape
// =========================================================================

#[test]
fn json_request_with_null_bounds() {
    let req: DiscoveryRequest = serde_json::from_value(json!({
        "query": "sourdough",
        "category": "cooking",
        "subscriber_range": {"min": null, "max": 50000},
        "min_video_count": 10,
        "page_size": 25,
        "max_pages": 2
    }))
    .unwrap();

    assert_eq!(req.subscriber_range.min, None);
    assert_eq!(req.subscriber_range.max, Some(50_000));
    assert_eq!(req.store_id, None);
    assert!(req.validate().is_ok());
}
