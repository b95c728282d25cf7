//! Core domain types for Curator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Momentum score: `score + 2 × comment_count`, missing signals counting as zero.
pub fn momentum(score: Option<i64>, comment_count: Option<i64>) -> i64 {
    score
        .unwrap_or(0)
        .saturating_add(comment_count.unwrap_or(0).saturating_mul(2))
}

// ---------------------------------------------------------------------------
// ImageKind
// ---------------------------------------------------------------------------

/// Where a hero image reference came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// No image.
    #[default]
    None,
    /// First `<img>` of the feed entry's content, on an allowlisted host.
    FeedContent,
    /// Preview image returned by the enrichment lookup, on an allowlisted host.
    Enrichment,
}

// ---------------------------------------------------------------------------
// FeedEntry
// ---------------------------------------------------------------------------

/// One entry fetched from a feed. Produced fresh each run; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    /// Raw link as it appeared in the feed.
    pub link: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
    /// Feed identifier (URL) the entry was fetched from.
    pub source_feed_id: String,
    /// Category the entry belongs to (a subreddit for Reddit feeds).
    pub subreddit: Option<String>,
    pub score: Option<i64>,
    pub comment_count: Option<i64>,
    pub image_url: Option<String>,
    pub image_kind: ImageKind,
}

impl FeedEntry {
    /// Momentum of this entry given its current signals.
    pub fn momentum(&self) -> i64 {
        momentum(self.score, self.comment_count)
    }

    /// An entry needs both a title and a link to be considered at all.
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && !self.link.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// A published article, persisted in the article history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// `<YYYY-MM-DD>-<slug>`, unique across the history.
    pub id: String,
    pub title: String,
    /// Site-relative output path, e.g. `/articles/2026-10-17-some-title.html`.
    pub path: String,
    pub published_ts: DateTime<Utc>,
    /// The entry link as received from the feed.
    pub source_url: String,
    /// Feed the entry came from.
    #[serde(default)]
    pub feed_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub summary: String,
    /// Sanitized article body.
    pub body_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub hero_image_kind: ImageKind,
}

impl Article {
    /// Momentum of this article, zero when no engagement signal was recorded.
    pub fn momentum(&self) -> i64 {
        momentum(self.score, self.comment_count)
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Outcome of a single pipeline run, overwritten on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Time-sortable identifier of the run.
    pub run_id: Uuid,
    pub updated_utc: DateTime<Utc>,
    pub homepage_url: String,
    pub created: bool,
    #[serde(default)]
    pub article_url: String,
    #[serde(default)]
    pub article_path: String,
    #[serde(default)]
    pub article_title: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}
