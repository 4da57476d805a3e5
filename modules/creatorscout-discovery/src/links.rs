//! Rule-based link extraction and bucketing for channel descriptions.
//!
//! Pure functions, no I/O. Whatever no rule claims ends up in
//! `LinkBuckets::remaining` for the AI suggestion pass.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use creatorscout_common::LinkBuckets;

// =============================================================================
// Regex Patterns
// =============================================================================

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(https?://(?:www\.)?[^\s)]+)|(www\.[^\s)]+)").unwrap()
});
static RE_INSTAGRAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(www\.)?instagram\.com/[a-z0-9._-]+/?").unwrap()
});
static RE_TIKTOK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://(www\.)?tiktok\.com/[@a-z0-9._-]+/?").unwrap());

/// Hosts whose pages are newsletters. Matched as a substring of the hostname.
const NEWSLETTER_HOSTS: &[&str] = &[
    "substack.com",
    "beehiiv.com",
    "convertkit.com",
    "mailchi.mp",
    "campaign-archive.com",
    "tinyletter.com",
];

// =============================================================================
// Extraction
// =============================================================================

/// Every URL-looking token in `text`, in order of first appearance.
/// Bare `www.` hits get an `https://` prefix; duplicates collapse to the first.
pub fn extract_links(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    RE_URL
        .find_iter(text)
        .map(|m| normalize(m.as_str()))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

fn normalize(raw: &str) -> String {
    if raw.len() >= 4 && raw[..4].eq_ignore_ascii_case("http") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Sort links into slots. First match wins each slot and there is no
/// backtracking: a link claimed early is never reconsidered.
pub fn classify_links(links: &[String]) -> LinkBuckets {
    let mut buckets = LinkBuckets::default();

    for link in links {
        if buckets.instagram.is_none() && RE_INSTAGRAM.is_match(link) {
            buckets.instagram = Some(link.clone());
            continue;
        }
        if buckets.tiktok.is_none() && RE_TIKTOK.is_match(link) {
            buckets.tiktok = Some(link.clone());
            continue;
        }

        let Ok(url) = Url::parse(link) else {
            buckets.remaining.push(link.clone());
            continue;
        };

        if buckets.newsletter.is_none() && is_newsletter_host(&url) {
            buckets.newsletter = Some(link.clone());
        } else if buckets.website.is_none() {
            buckets.website = Some(link.clone());
        } else {
            buckets.remaining.push(link.clone());
        }
    }

    buckets
}

fn is_newsletter_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| NEWSLETTER_HOSTS.iter().any(|n| host.contains(n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_in_order_and_dedups() {
        let text = "Shop: https://shop.example.com (new) and https://shop.example.com again, \
                    plus www.blog.example.com/posts.";
        assert_eq!(
            extract_links(text),
            links(&[
                "https://shop.example.com",
                "https://www.blog.example.com/posts."
            ])
        );
    }

    #[test]
    fn stops_at_closing_paren_and_whitespace() {
        let text = "(see https://a.example/x) then\nhttp://b.example";
        assert_eq!(
            extract_links(text),
            links(&["https://a.example/x", "http://b.example"])
        );
    }

    #[test]
    fn text_without_links_is_empty() {
        assert!(extract_links("just words here").is_empty());
    }

    #[test]
    fn social_then_website() {
        let text = "Follow https://instagram.com/abc and visit https://example.com";
        let buckets = classify_links(&extract_links(text));
        assert_eq!(buckets.instagram.as_deref(), Some("https://instagram.com/abc"));
        assert_eq!(buckets.website.as_deref(), Some("https://example.com"));
        assert_eq!(buckets.tiktok, None);
        assert_eq!(buckets.newsletter, None);
        assert!(buckets.remaining.is_empty());
    }

    #[test]
    fn newsletter_hosts_match_subdomains() {
        let buckets = classify_links(&links(&[
            "https://breadlab.substack.com/p/first",
            "https://www.tiktok.com/@breadlab",
        ]));
        assert_eq!(
            buckets.newsletter.as_deref(),
            Some("https://breadlab.substack.com/p/first")
        );
        assert_eq!(buckets.tiktok.as_deref(), Some("https://www.tiktok.com/@breadlab"));
    }

    #[test]
    fn first_match_wins_and_overflow_goes_to_remaining() {
        let buckets = classify_links(&links(&[
            "https://one.example",
            "https://two.example",
            "https://instagram.com/first",
            "https://instagram.com/second",
        ]));
        assert_eq!(buckets.website.as_deref(), Some("https://one.example"));
        assert_eq!(buckets.instagram.as_deref(), Some("https://instagram.com/first"));
        // A second social link is treated like any other URL.
        assert_eq!(
            buckets.remaining,
            links(&["https://two.example", "https://instagram.com/second"])
        );
    }

    #[test]
    fn unparseable_links_are_remaining() {
        let buckets = classify_links(&links(&["https://exa mple", "not a url"]));
        assert_eq!(buckets.website, None);
        assert_eq!(buckets.remaining.len(), 2);
    }

    #[test]
    fn classification_is_idempotent() {
        let text = "https://instagram.com/a https://x.substack.com www.site.example \
                    https://other.example https://tiktok.com/@b";
        let once = classify_links(&extract_links(text));
        let twice = classify_links(&extract_links(text));
        assert_eq!(once, twice);
    }
}
