//! Core pipeline orchestration and domain logic for Curator.
//!
//! This crate ties together feed selection, article generation, state
//! persistence and site assembly into the daily run ([`run_once`]).

pub mod article;
pub mod generation;
pub mod pipeline;
pub mod selector;

pub use article::{article_path, build_article, slugify, unique_article_id};
pub use generation::{ChatCompletionsGenerator, ContentGenerator, GeneratedArticle};
pub use pipeline::{
    NO_CANDIDATE_NOTE, ProgressReporter, RunContext, RunOutcome, SilentProgress, preview_candidate,
    rebuild_site, run_at, run_once, site_output_dir,
};
pub use selector::{Candidate, Selection, SelectionConfig, SelectionStats, Selector};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use curator_feeds::{EngagementSignal, Enricher, FeedSource};
    use curator_shared::{Article, CuratorError, FeedEntry, ImageKind, Result, normalize_url};

    use crate::article::{article_path, slugify};
    use crate::generation::{ContentGenerator, GeneratedArticle};
    use crate::selector::Candidate;

    /// In-memory feeds keyed by feed URL.
    #[derive(Default)]
    pub struct FakeFeeds {
        entries: HashMap<String, Vec<FeedEntry>>,
        failing: HashSet<String>,
    }

    impl FakeFeeds {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, feed_url: &str, entries: Vec<FeedEntry>) -> Self {
            self.entries.insert(feed_url.to_string(), entries);
            self
        }

        pub fn failing(mut self, feed_url: &str) -> Self {
            self.failing.insert(feed_url.to_string());
            self
        }
    }

    #[async_trait]
    impl FeedSource for FakeFeeds {
        async fn fetch(&self, feed_url: &str, max_items: usize) -> Result<Vec<FeedEntry>> {
            if self.failing.contains(feed_url) {
                return Err(CuratorError::Network(format!("{feed_url}: connection refused")));
            }
            Ok(self
                .entries
                .get(feed_url)
                .map(|entries| {
                    entries
                        .iter()
                        .take(max_items)
                        .cloned()
                        .map(|mut e| {
                            e.source_feed_id = feed_url.to_string();
                            e
                        })
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    /// Engagement signals keyed by entry link.
    #[derive(Default)]
    pub struct FakeEnricher {
        signals: HashMap<String, EngagementSignal>,
        failing: HashSet<String>,
    }

    impl FakeEnricher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn score(mut self, link: &str, score: i64) -> Self {
            self.signals.entry(link.to_string()).or_default().score = Some(score);
            self
        }

        pub fn adult(mut self, link: &str) -> Self {
            self.signals.entry(link.to_string()).or_default().adult = true;
            self
        }

        pub fn image(mut self, link: &str, url: &str) -> Self {
            self.signals.entry(link.to_string()).or_default().image_url = Some(url.to_string());
            self
        }

        pub fn failing(mut self, link: &str) -> Self {
            self.failing.insert(link.to_string());
            self
        }
    }

    #[async_trait]
    impl Enricher for FakeEnricher {
        async fn enrich(&self, entry: &FeedEntry) -> Result<EngagementSignal> {
            if self.failing.contains(&entry.link) {
                return Err(CuratorError::Network("HTTP 503".into()));
            }
            Ok(self.signals.get(&entry.link).cloned().unwrap_or_default())
        }
    }

    /// Returns a fixed body, or always fails. Counts calls.
    pub struct FakeGenerator {
        body: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        pub fn html(body: &str) -> Self {
            Self {
                body: Some(body.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                body: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentGenerator for FakeGenerator {
        async fn generate(&self, _candidate: &Candidate) -> Result<GeneratedArticle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Some(body) => Ok(GeneratedArticle {
                    title: None,
                    body_html: body.clone(),
                }),
                None => Err(CuratorError::Generation("HTTP 500: upstream unavailable".into())),
            }
        }
    }

    pub fn entry(title: &str, link: &str) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: link.to_string(),
            summary: format!("<p>{title}</p>"),
            ..Default::default()
        }
    }

    pub fn candidate(title: &str, link: &str) -> Candidate {
        let entry = entry(title, link);
        Candidate {
            canonical_link: normalize_url(link),
            momentum: entry.momentum(),
            entry,
        }
    }

    /// A previously published article with a unique id derived from its title.
    pub fn history_article(title: &str) -> Article {
        let slug = slugify(title);
        let id = format!("2026-10-01-{slug}");
        let published: DateTime<Utc> = "2026-10-01T08:00:00Z".parse().expect("valid timestamp");
        Article {
            path: article_path(&id),
            id,
            title: title.to_string(),
            published_ts: published,
            source_url: format!("https://example.com/history/{slug}"),
            feed_url: "feed-a".into(),
            subreddit: None,
            score: None,
            comment_count: None,
            summary: String::new(),
            body_html: format!("<p>{title}</p>"),
            hero_image: None,
            hero_image_kind: ImageKind::None,
        }
    }
}
