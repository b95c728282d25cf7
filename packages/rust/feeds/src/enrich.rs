//! Engagement-signal enrichment.
//!
//! Feeds carry no popularity data. An [`Enricher`] looks a candidate up and
//! returns an [`EngagementSignal`]; lookups that fail degrade to the default
//! signal in the selector.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use curator_shared::{CuratorError, FeedEntry, Result};

use crate::USER_AGENT;
use crate::image::ImagePolicy;

/// Engagement data for one candidate. The default is "nothing known".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementSignal {
    pub score: Option<i64>,
    pub comment_count: Option<i64>,
    pub subreddit: Option<String>,
    /// Marked adult / NSFW by the source platform.
    pub adult: bool,
    /// Allowlisted preview image, already filtered.
    pub image_url: Option<String>,
}

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, entry: &FeedEntry) -> Result<EngagementSignal>;
}

/// Enricher that never looks anything up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnricher;

#[async_trait]
impl Enricher for NoopEnricher {
    async fn enrich(&self, _entry: &FeedEntry) -> Result<EngagementSignal> {
        Ok(EngagementSignal::default())
    }
}

/// Reads a Reddit post's public `.json` listing.
pub struct RedditJsonEnricher {
    client: Client,
    images: ImagePolicy,
    hosts: Vec<String>,
}

impl RedditJsonEnricher {
    pub fn new(timeout: Duration, images: ImagePolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| CuratorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            images,
            hosts: vec!["reddit.com".into()],
        })
    }

    /// Treat links on `host` as Reddit links (for integration tests with mock servers).
    #[cfg(test)]
    pub fn with_host(mut self, host: &str) -> Self {
        self.hosts.push(host.to_string());
        self
    }

    /// The `.json` endpoint for `link`, or `None` if it is not a Reddit post.
    fn json_url(&self, link: &str) -> Option<Url> {
        let mut url = Url::parse(link.trim()).ok()?;
        let host = url.host_str()?.to_lowercase();
        let is_reddit = self
            .hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{h}")));
        if !is_reddit || !url.path().contains("/comments/") {
            return None;
        }
        let path = format!("{}.json", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        Some(url)
    }
}

#[async_trait]
impl Enricher for RedditJsonEnricher {
    #[instrument(skip_all, fields(link = %entry.link))]
    async fn enrich(&self, entry: &FeedEntry) -> Result<EngagementSignal> {
        let Some(url) = self.json_url(&entry.link) else {
            debug!("not a reddit post, default signal");
            return Ok(EngagementSignal::default());
        };

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| CuratorError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CuratorError::Network(format!(
                "{url}: HTTP {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CuratorError::parse(format!("{url}: {e}")))?;

        parse_listing(&body, &self.images)
    }
}

/// Pull the engagement signal out of a post listing document.
pub fn parse_listing(body: &Value, images: &ImagePolicy) -> Result<EngagementSignal> {
    let post = body
        .pointer("/0/data/children/0/data")
        .or_else(|| body.pointer("/data/children/0/data"))
        .ok_or_else(|| CuratorError::parse("post listing has no post data"))?;

    let preview = post
        .pointer("/preview/images/0/source/url")
        .and_then(Value::as_str)
        .map(|u| u.replace("&amp;", "&"));

    Ok(EngagementSignal {
        score: post.get("score").and_then(Value::as_i64),
        comment_count: post.get("num_comments").and_then(Value::as_i64),
        subreddit: post
            .get("subreddit")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        adult: post.get("over_18").and_then(Value::as_bool).unwrap_or(false),
        image_url: images.filter(preview),
    })
}
