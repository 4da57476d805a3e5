use std::collections::HashSet;

use tracing::info;

use crate::error::{DiscoveryError, Stage};
use crate::infra::{with_retry, RetryPolicy};
use crate::traits::ChannelSearch;

/// Deduplicated candidate ids, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub channel_ids: Vec<String>,
    pub pages_processed: u32,
}

/// Walk search pages until the page cap or the last page.
///
/// Pages are fetched strictly in sequence since each needs the previous
/// continuation token. Any page failure (after retries) aborts the walk.
pub async fn collect_candidates(
    search: &dyn ChannelSearch,
    query: &str,
    page_size: u32,
    max_pages: u32,
    retry: RetryPolicy,
) -> Result<Candidates, DiscoveryError> {
    let mut seen = HashSet::new();
    let mut channel_ids = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages_processed = 0;

    while pages_processed < max_pages {
        let token = page_token.as_deref();
        let page = with_retry(retry, "search", || search.search_page(query, page_size, token))
            .await
            .map_err(DiscoveryError::upstream(Stage::Search))?;
        pages_processed += 1;

        let before = channel_ids.len();
        for id in page.channel_ids {
            if seen.insert(id.clone()) {
                channel_ids.push(id);
            }
        }
        info!(
            page = pages_processed,
            new_ids = channel_ids.len() - before,
            has_next = page.next_page_token.is_some(),
            "Search page processed"
        );

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    Ok(Candidates {
        channel_ids,
        pages_processed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSearch;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn stops_at_last_page() {
        let search = MockSearch::new()
            .page(None, &["a", "b"], Some("p2"))
            .page(Some("p2"), &["b", "c"], None);

        let got = collect_candidates(&search, "q", 20, 5, RetryPolicy::none())
            .await
            .unwrap();

        assert_eq!(got.channel_ids, ids(&["a", "b", "c"]));
        assert_eq!(got.pages_processed, 2);
    }

    #[tokio::test]
    async fn stops_at_page_cap() {
        let search = MockSearch::new()
            .page(None, &["a"], Some("p2"))
            .page(Some("p2"), &["b"], Some("p3"))
            .page(Some("p3"), &["c"], None);

        let got = collect_candidates(&search, "q", 20, 2, RetryPolicy::none())
            .await
            .unwrap();

        assert_eq!(got.channel_ids, ids(&["a", "b"]));
        assert_eq!(got.pages_processed, 2);
        assert_eq!(search.calls(), 2);
    }

    #[tokio::test]
    async fn forwards_query_and_page_size() {
        let search = MockSearch::new().page(None, &["a"], None);
        collect_candidates(&search, "cooking sourdough", 7, 1, RetryPolicy::none())
            .await
            .unwrap();
        assert_eq!(search.queries(), vec![("cooking sourdough".to_string(), 7)]);
    }

    #[tokio::test]
    async fn page_failure_aborts() {
        let search = MockSearch::new()
            .page(None, &["a"], Some("p2"))
            .fail_on(Some("p2"));

        let err = collect_candidates(&search, "q", 20, 5, RetryPolicy::none())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DiscoveryError::Upstream {
                stage: Stage::Search,
                ..
            }
        ));
    }
}
