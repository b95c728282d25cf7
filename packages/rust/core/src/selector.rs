//! Candidate selection.
//!
//! Walks every configured feed in order and returns the single best entry
//! that is well formed, not yet processed, safe, and not a near-duplicate of
//! an existing article. Filters run in this order:
//!
//! 1. malformed (missing title or link)
//! 2. already processed, or already seen earlier in this run
//! 3. blocked keyword or blocked category
//! 4. near-duplicate title
//! 5. (momentum strategy) enrichment, which may reveal an adult flag or a
//!    blocked category
//!
//! Survivors are ranked by momentum, stable on feed order, or kept in feed
//! order under the recency strategy.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use curator_feeds::{EngagementSignal, Enricher, FeedSource};
use curator_shared::{
    AppConfig, Article, FeedEntry, ImageKind, SelectionStrategy, jaccard, normalize_url, tokenize,
};
use curator_storage::ProcessedLog;

/// Selection settings, lower-cased and ready to match against.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub feeds: Vec<String>,
    pub max_items_per_feed: usize,
    pub blocked_keywords: Vec<String>,
    pub blocked_categories: Vec<String>,
    pub similarity_threshold: f64,
    pub strategy: SelectionStrategy,
    pub enrich_limit: usize,
}

impl SelectionConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        let lowered = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            feeds: config.feeds.urls.clone(),
            max_items_per_feed: config.feeds.max_items_per_feed,
            blocked_keywords: lowered(&config.safety.blocked_keywords),
            blocked_categories: lowered(&config.safety.blocked_categories),
            similarity_threshold: config.selection.similarity_threshold,
            strategy: config.selection.strategy,
            enrich_limit: config.selection.enrich_limit,
        }
    }

    fn title_blocked(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.blocked_keywords.iter().any(|kw| title.contains(kw.as_str()))
    }

    fn category_blocked(&self, category: Option<&str>) -> bool {
        category.is_some_and(|c| {
            let c = c.trim().to_lowercase();
            self.blocked_categories.iter().any(|b| *b == c)
        })
    }
}

/// The chosen entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub entry: FeedEntry,
    /// Canonical form of `entry.link`, the dedup key.
    pub canonical_link: String,
    pub momentum: i64,
}

/// Why entries were dropped, for logs and the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub feeds_failed: usize,
    pub fetched: usize,
    pub malformed: usize,
    pub processed: usize,
    pub repeated: usize,
    pub unsafe_entries: usize,
    pub near_duplicates: usize,
    pub enriched: usize,
    pub eligible: usize,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub candidate: Option<Candidate>,
    pub stats: SelectionStats,
}

pub struct Selector<'a> {
    config: SelectionConfig,
    feeds: &'a dyn FeedSource,
    enricher: &'a dyn Enricher,
}

impl<'a> Selector<'a> {
    pub fn new(config: SelectionConfig, feeds: &'a dyn FeedSource, enricher: &'a dyn Enricher) -> Self {
        Self {
            config,
            feeds,
            enricher,
        }
    }

    /// Pick the best candidate, or `None` when nothing qualifies.
    ///
    /// Never fails: a feed that cannot be fetched or parsed is skipped, and
    /// an enrichment failure degrades to the default signal.
    #[instrument(skip_all, fields(feeds = self.config.feeds.len(), strategy = ?self.config.strategy))]
    pub async fn select(&self, processed: &ProcessedLog, history: &[Article]) -> Selection {
        let mut stats = SelectionStats::default();
        let history_tokens: Vec<HashSet<String>> = history
            .iter()
            .map(|a| tokenize(&a.title))
            .filter(|t| !t.is_empty())
            .collect();

        let mut seen: HashSet<String> = HashSet::new();
        let mut survivors: Vec<Candidate> = Vec::new();

        for feed_url in &self.config.feeds {
            let entries = match self.feeds.fetch(feed_url, self.config.max_items_per_feed).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(feed = %feed_url, error = %e, "feed fetch failed, skipping");
                    stats.feeds_failed += 1;
                    continue;
                }
            };
            stats.fetched += entries.len();

            for entry in entries {
                if !entry.is_well_formed() {
                    debug!(title = %entry.title, "malformed entry");
                    stats.malformed += 1;
                    continue;
                }
                let canonical_link = normalize_url(&entry.link);
                if canonical_link.is_empty() {
                    stats.malformed += 1;
                    continue;
                }

                if processed.contains(&canonical_link) {
                    debug!(link = %canonical_link, "already processed");
                    stats.processed += 1;
                    continue;
                }
                if !seen.insert(canonical_link.clone()) {
                    stats.repeated += 1;
                    continue;
                }

                if self.config.title_blocked(&entry.title)
                    || self.config.category_blocked(entry.subreddit.as_deref())
                {
                    debug!(title = %entry.title, "blocked entry");
                    stats.unsafe_entries += 1;
                    continue;
                }

                let tokens = tokenize(&entry.title);
                let near_duplicate = history_tokens
                    .iter()
                    .any(|prev| jaccard(&tokens, prev) >= self.config.similarity_threshold);
                if near_duplicate {
                    debug!(title = %entry.title, "near-duplicate of an existing article");
                    stats.near_duplicates += 1;
                    continue;
                }

                let momentum = entry.momentum();
                survivors.push(Candidate {
                    entry,
                    canonical_link,
                    momentum,
                });
            }
        }

        if self.config.strategy == SelectionStrategy::Momentum {
            survivors = self.enrich(survivors, &mut stats).await;
            // Stable: equal momentum keeps feed order.
            survivors.sort_by(|a, b| b.momentum.cmp(&a.momentum));
        }

        stats.eligible = survivors.len();
        let candidate = survivors.into_iter().next();

        match &candidate {
            Some(c) => info!(
                title = %c.entry.title,
                link = %c.canonical_link,
                momentum = c.momentum,
                eligible = stats.eligible,
                "candidate selected"
            ),
            None => info!(?stats, "no candidate found"),
        }

        Selection { candidate, stats }
    }

    /// Enrich the first `enrich_limit` survivors, dropping any revealed unsafe.
    async fn enrich(&self, survivors: Vec<Candidate>, stats: &mut SelectionStats) -> Vec<Candidate> {
        let mut kept = Vec::with_capacity(survivors.len());

        for (i, mut candidate) in survivors.into_iter().enumerate() {
            if i >= self.config.enrich_limit {
                kept.push(candidate);
                continue;
            }

            let signal = match self.enricher.enrich(&candidate.entry).await {
                Ok(signal) => signal,
                Err(e) => {
                    warn!(link = %candidate.entry.link, error = %e, "enrichment failed, using default signal");
                    EngagementSignal::default()
                }
            };
            stats.enriched += 1;

            if signal.adult {
                debug!(title = %candidate.entry.title, "flagged adult");
                stats.unsafe_entries += 1;
                continue;
            }

            apply_signal(&mut candidate.entry, signal);

            if self.config.category_blocked(candidate.entry.subreddit.as_deref()) {
                stats.unsafe_entries += 1;
                continue;
            }

            candidate.momentum = candidate.entry.momentum();
            kept.push(candidate);
        }

        kept
    }
}

fn apply_signal(entry: &mut FeedEntry, signal: EngagementSignal) {
    if signal.score.is_some() {
        entry.score = signal.score;
    }
    if signal.comment_count.is_some() {
        entry.comment_count = signal.comment_count;
    }
    if signal.subreddit.is_some() {
        entry.subreddit = signal.subreddit;
    }
    if entry.image_url.is_none() && signal.image_url.is_some() {
        entry.image_url = signal.image_url;
        entry.image_kind = ImageKind::Enrichment;
    }
}
