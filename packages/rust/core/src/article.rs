//! Turning a selected candidate and its generated body into an [`Article`].

use chrono::{DateTime, Utc};

use curator_shared::Article;

use crate::selector::Candidate;

/// Maximum slug length, in characters.
const MAX_SLUG_CHARS: usize = 80;

/// Lower-case ASCII slug: alphanumeric runs joined by single dashes.
///
/// Non-ASCII characters are dropped. Truncated to 80 characters without a
/// trailing dash.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c.is_ascii_punctuation() {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_CHARS {
        slug.truncate(MAX_SLUG_CHARS);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Article id `<YYYY-MM-DD>-<slug>`, suffixed `-2`, `-3`, ... until unique.
pub fn unique_article_id(title: &str, now: DateTime<Utc>, history: &[Article]) -> String {
    let slug = match slugify(title) {
        s if s.is_empty() => format!("post-{}", now.timestamp()),
        s => s,
    };
    let base = format!("{}-{slug}", now.format("%Y-%m-%d"));

    let taken = |id: &str| {
        let path = article_path(id);
        history.iter().any(|a| a.id == id || a.path == path)
    };

    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let id = format!("{base}-{n}");
        if !taken(&id) {
            return id;
        }
        n += 1;
    }
}

pub fn article_path(id: &str) -> String {
    format!("/articles/{id}.html")
}

/// Assemble the persisted record for a freshly generated article.
pub fn build_article(
    candidate: &Candidate,
    body_html: String,
    now: DateTime<Utc>,
    history: &[Article],
) -> Article {
    let entry = &candidate.entry;
    let id = unique_article_id(&entry.title, now, history);
    Article {
        path: article_path(&id),
        id,
        title: entry.title.clone(),
        published_ts: now,
        source_url: entry.link.clone(),
        feed_url: entry.source_feed_id.clone(),
        subreddit: entry.subreddit.clone(),
        score: entry.score,
        comment_count: entry.comment_count,
        summary: curator_sanitize::plain_text(&entry.summary),
        body_html,
        hero_image: entry.image_url.clone(),
        hero_image_kind: entry.image_kind,
    }
}
