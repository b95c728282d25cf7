//! Feed and enrichment collaborators for Curator.
//!
//! - [`FeedSource`] / [`HttpFeedSource`]: fetch and parse Atom/RSS feeds
//! - [`Enricher`] / [`RedditJsonEnricher`] / [`NoopEnricher`]: engagement signals
//! - [`ImagePolicy`]: hero image host allowlist

pub mod enrich;
pub mod image;
pub mod source;

pub use enrich::{EngagementSignal, Enricher, NoopEnricher, RedditJsonEnricher, parse_listing};
pub use image::{ImagePolicy, first_image_src};
pub use source::{FeedSource, HttpFeedSource, parse_feed, subreddit_from_url};

/// User-Agent string for feed and enrichment requests.
pub(crate) const USER_AGENT: &str = concat!("Curator/", env!("CARGO_PKG_VERSION"));
