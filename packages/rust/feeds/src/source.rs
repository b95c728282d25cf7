//! Feed fetching and Atom/RSS parsing.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::Entry;
use reqwest::Client;
use tracing::{debug, instrument};

use curator_shared::{CuratorError, FeedEntry, ImageKind, Result};

use crate::USER_AGENT;
use crate::image::{ImagePolicy, first_image_src};

/// Something that yields the current entries of a feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch at most `max_items` entries of `feed_url`, in feed order.
    async fn fetch(&self, feed_url: &str, max_items: usize) -> Result<Vec<FeedEntry>>;
}

/// HTTP feed source backed by `reqwest` and `feed-rs`.
pub struct HttpFeedSource {
    client: Client,
    images: ImagePolicy,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration, images: ImagePolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| CuratorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, images })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    #[instrument(skip_all, fields(feed = %feed_url))]
    async fn fetch(&self, feed_url: &str, max_items: usize) -> Result<Vec<FeedEntry>> {
        let response = self
            .client
            .get(feed_url)
            .send()
            .await
            .map_err(|e| CuratorError::Network(format!("{feed_url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CuratorError::Network(format!(
                "{feed_url}: HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CuratorError::Network(format!("{feed_url}: {e}")))?;

        let entries = parse_feed(&bytes, feed_url, max_items, &self.images)?;
        debug!(count = entries.len(), "feed fetched");
        Ok(entries)
    }
}

/// Parse an Atom or RSS document into feed entries.
///
/// Entries keep feed order and are capped at `max_items`. Entries without a
/// title or link are passed through; the selector discards them.
pub fn parse_feed(
    bytes: &[u8],
    feed_url: &str,
    max_items: usize,
    images: &ImagePolicy,
) -> Result<Vec<FeedEntry>> {
    let feed = feed_rs::parser::parse(Cursor::new(bytes))
        .map_err(|e| CuratorError::parse(format!("{feed_url}: {e}")))?;

    let feed_category = subreddit_from_url(feed_url);

    Ok(feed
        .entries
        .into_iter()
        .take(max_items)
        .map(|entry| convert_entry(entry, feed_url, feed_category.as_deref(), images))
        .collect())
}

fn convert_entry(
    entry: Entry,
    feed_url: &str,
    feed_category: Option<&str>,
    images: &ImagePolicy,
) -> FeedEntry {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    let link = select_entry_link(&entry);
    let summary_html = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .unwrap_or_default();
    let content_html = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .unwrap_or_default();

    let image = first_image_src(&content_html).or_else(|| first_image_src(&summary_html));
    let image_url = images.filter(image);
    let image_kind = if image_url.is_some() {
        ImageKind::FeedContent
    } else {
        ImageKind::None
    };

    let subreddit = subreddit_from_url(&link)
        .or_else(|| feed_category.map(str::to_string))
        .or_else(|| {
            entry
                .categories
                .iter()
                .find_map(|c| c.label.as_deref().and_then(strip_subreddit_prefix))
        });

    FeedEntry {
        title,
        link,
        summary: summary_html.trim().to_string(),
        published: entry.published.or(entry.updated),
        source_feed_id: feed_url.to_string(),
        subreddit,
        score: None,
        comment_count: None,
        image_url,
        image_kind,
    }
}

fn select_entry_link(entry: &Entry) -> String {
    for link in &entry.links {
        let href = link.href.trim();
        if href.is_empty() {
            continue;
        }
        let rel = link.rel.as_deref().unwrap_or("");
        if rel.is_empty() || rel.eq_ignore_ascii_case("alternate") {
            return href.to_string();
        }
    }
    if let Some(link) = entry.links.iter().find(|l| !l.href.trim().is_empty()) {
        return link.href.trim().to_string();
    }
    let id = entry.id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        return id.to_string();
    }
    String::new()
}

/// Extract `<name>` from a `/r/<name>` path segment.
pub fn subreddit_from_url(url: &str) -> Option<String> {
    let mut segments = url.split('/').skip_while(|s| *s != "r");
    segments.next()?;
    let name = segments.next()?.trim();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}

fn strip_subreddit_prefix(label: &str) -> Option<String> {
    label
        .trim()
        .strip_prefix("r/")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<u8> {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/feeds/reddit.atom.xml");
        std::fs::read(&path).expect("fixture should exist")
    }

    const FEED_URL: &str = "https://www.reddit.com/r/technology/.rss";

    #[test]
    fn parses_reddit_atom_fixture() {
        let policy = ImagePolicy::new(["i.redd.it"]);
        let entries = parse_feed(&fixture(), FEED_URL, 25, &policy).unwrap();
        assert_eq!(entries.len(), 4);

        let first = &entries[0];
        assert_eq!(first.title, "AI chip breakthrough");
        assert_eq!(
            first.link,
            "https://www.reddit.com/r/technology/comments/1abc01/ai_chip_breakthrough/"
        );
        assert_eq!(first.subreddit.as_deref(), Some("technology"));
        assert_eq!(first.source_feed_id, FEED_URL);
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://i.redd.it/chip01.jpeg?width=640&format=pjpg")
        );
        assert_eq!(first.image_kind, ImageKind::FeedContent);
        assert!(first.published.is_some());
    }

    #[test]
    fn non_allowlisted_image_is_dropped() {
        let policy = ImagePolicy::new(["i.redd.it"]);
        let entries = parse_feed(&fixture(), FEED_URL, 25, &policy).unwrap();
        let rocket = &entries[1];
        assert_eq!(rocket.image_url, None);
        assert_eq!(rocket.image_kind, ImageKind::None);
    }

    #[test]
    fn linkless_entry_is_passed_through_malformed() {
        let policy = ImagePolicy::default();
        let entries = parse_feed(&fixture(), FEED_URL, 25, &policy).unwrap();
        assert!(!entries[2].is_well_formed());
        assert!(entries[3].is_well_formed());
    }

    #[test]
    fn max_items_caps_entries() {
        let policy = ImagePolicy::default();
        let entries = parse_feed(&fixture(), FEED_URL, 2, &policy).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_feed(b"<html>nope", FEED_URL, 5, &ImagePolicy::default()).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn subreddit_extraction() {
        assert_eq!(
            subreddit_from_url("https://www.reddit.com/r/rust/comments/x/y/").as_deref(),
            Some("rust")
        );
        assert_eq!(subreddit_from_url("https://www.reddit.com/r/rust/.rss").as_deref(), Some("rust"));
        assert_eq!(subreddit_from_url("https://example.com/news/1"), None);
    }

    #[tokio::test]
    async fn fetches_over_http() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/r/technology/.rss"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_raw(fixture(), "application/atom+xml"),
            )
            .mount(&server)
            .await;

        let source =
            HttpFeedSource::new(Duration::from_secs(5), ImagePolicy::new(["i.redd.it"])).unwrap();
        let url = format!("{}/r/technology/.rss", server.uri());
        let entries = source.fetch(&url, 3).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].source_feed_id, url);
    }

    #[tokio::test]
    async fn http_error_is_network_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(Duration::from_secs(5), ImagePolicy::default()).unwrap();
        let err = source.fetch(&server.uri(), 3).await.unwrap_err();
        assert!(matches!(err, CuratorError::Network(_)));
        assert!(err.to_string().contains("503"));
    }
}
