//! Derived views over the article history.

use std::collections::HashSet;

use curator_shared::{Article, RelatedSection, jaccard, tokenize};

/// Number of articles in the ranking and recency lists.
pub const VIEW_LIMIT: usize = 10;

/// Top articles by momentum.
///
/// Ties break by newest first, then by id. Articles without signals score
/// zero, so a signal-less history ranks by recency.
pub fn ranking_view(articles: &[Article]) -> Vec<&Article> {
    let mut ranked: Vec<&Article> = articles.iter().collect();
    ranked.sort_by(|a, b| {
        b.momentum()
            .cmp(&a.momentum())
            .then_with(|| b.published_ts.cmp(&a.published_ts))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(VIEW_LIMIT);
    ranked
}

/// Newest articles first, ties broken by id.
pub fn recency_view(articles: &[Article]) -> Vec<&Article> {
    let mut recent: Vec<&Article> = articles.iter().collect();
    recent.sort_by(|a, b| {
        b.published_ts
            .cmp(&a.published_ts)
            .then_with(|| a.id.cmp(&b.id))
    });
    recent.truncate(VIEW_LIMIT);
    recent
}

/// Title token sets for a history, computed once per build.
pub struct TitleIndex<'a> {
    entries: Vec<(&'a Article, HashSet<String>)>,
}

impl<'a> TitleIndex<'a> {
    pub fn new(articles: &'a [Article]) -> Self {
        Self {
            entries: articles.iter().map(|a| (a, tokenize(&a.title))).collect(),
        }
    }

    /// Articles related to `current`, best match first.
    ///
    /// Score is title similarity plus a bonus when both share a category.
    /// Only scores strictly above the minimum are kept.
    pub fn related(&self, current: &Article, config: &RelatedSection) -> Vec<&'a Article> {
        let current_tokens = tokenize(&current.title);
        let current_category = current.subreddit.as_deref().map(str::to_lowercase);

        let mut scored: Vec<(f64, &'a Article)> = self
            .entries
            .iter()
            .filter(|(a, _)| a.id != current.id)
            .map(|(a, tokens)| {
                let mut score = jaccard(&current_tokens, tokens);
                let same_category = matches!(
                    (&current_category, a.subreddit.as_deref()),
                    (Some(mine), Some(theirs)) if *mine == theirs.to_lowercase()
                );
                if same_category {
                    score += config.category_bonus;
                }
                (score, *a)
            })
            .collect();

        scored.sort_by(|x, y| y.0.total_cmp(&x.0));

        scored
            .into_iter()
            .filter(|(score, _)| *score > config.min_similarity)
            .take(config.limit)
            .map(|(_, a)| a)
            .collect()
    }
}

/// Related articles for a single article, see [`TitleIndex::related`].
pub fn related_articles<'a>(
    current: &Article,
    all: &'a [Article],
    config: &RelatedSection,
) -> Vec<&'a Article> {
    TitleIndex::new(all).related(current, config)
}
