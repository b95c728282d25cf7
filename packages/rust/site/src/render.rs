//! HTML page rendering through askama templates (`templates/*.html`).
//!
//! Article bodies, ad snippets and the policy block are trusted HTML and are
//! marked `|safe` in the templates. Everything else is auto-escaped.

use askama::Template;
use chrono::{DateTime, SecondsFormat, Utc};

use curator_sanitize::plain_text;
use curator_shared::{Article, CuratorError, Result};

use crate::config::SiteConfig;

/// Static informational pages: `(slug, title)`.
pub const STATIC_PAGES: &[(&str, &str)] = &[
    ("about", "About"),
    ("privacy", "Privacy"),
    ("terms", "Terms"),
    ("disclaimer", "Disclaimer"),
    ("contact", "Contact"),
];

/// Maximum length of a meta description.
const DESCRIPTION_CHARS: usize = 160;

/// A titled link, optionally dated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkItem {
    pub url: String,
    pub title: String,
    pub date: String,
}

impl LinkItem {
    fn for_article(cfg: &SiteConfig, article: &Article) -> Self {
        Self {
            url: cfg.url_for(&article.path),
            title: article.title.clone(),
            date: article.published_ts.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Lists shown next to every page.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    pub ranking: Vec<LinkItem>,
    pub recent: Vec<LinkItem>,
}

impl Sidebar {
    pub fn new(cfg: &SiteConfig, ranking: &[&Article], recent: &[&Article]) -> Self {
        Self {
            ranking: links(cfg, ranking),
            recent: links(cfg, recent),
        }
    }
}

/// Values shared by every page: head metadata, header, sidebar, footer.
struct Chrome<'a> {
    lang: &'a str,
    site_title: &'a str,
    tagline: &'a str,
    home_url: String,
    feed_url: String,
    style_url: String,
    script_url: String,
    page_title: String,
    description: String,
    canonical: String,
    og_type: &'static str,
    image: Option<&'a str>,
    ad_top: Option<&'a str>,
    ad_mid: Option<&'a str>,
    ad_bottom: Option<&'a str>,
    ranking: &'a [LinkItem],
    recent: &'a [LinkItem],
    footer: Vec<LinkItem>,
    updated: String,
}

struct PageMeta<'a> {
    title: String,
    description: String,
    canonical: String,
    og_type: &'static str,
    image: Option<&'a str>,
}

impl<'a> Chrome<'a> {
    fn new(cfg: &'a SiteConfig, sidebar: &'a Sidebar, meta: PageMeta<'a>, built_at: DateTime<Utc>) -> Self {
        let footer = STATIC_PAGES
            .iter()
            .map(|(slug, title)| LinkItem {
                url: cfg.url_for(&format!("{slug}.html")),
                title: (*title).to_string(),
                date: String::new(),
            })
            .collect();

        Self {
            lang: &cfg.language,
            site_title: &cfg.title,
            tagline: &cfg.description,
            home_url: cfg.homepage_url(),
            feed_url: cfg.url_for("feed.xml"),
            style_url: cfg.url_for("assets/style.css"),
            script_url: cfg.url_for("assets/fx.js"),
            page_title: meta.title,
            description: meta.description,
            canonical: meta.canonical,
            og_type: meta.og_type,
            image: meta.image,
            ad_top: ad_slot(&cfg.ads.top),
            ad_mid: ad_slot(&cfg.ads.mid),
            ad_bottom: ad_slot(&cfg.ads.bottom),
            ranking: &sidebar.ranking,
            recent: &sidebar.recent,
            footer,
            updated: built_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

struct IndexEntry {
    url: String,
    title: String,
    byline: String,
    excerpt: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage<'a> {
    chrome: Chrome<'a>,
    entries: Vec<IndexEntry>,
}

#[derive(Template)]
#[template(path = "article.html")]
struct ArticlePage<'a> {
    chrome: Chrome<'a>,
    title: &'a str,
    byline: String,
    body_html: &'a str,
    source_url: &'a str,
    related: Vec<LinkItem>,
    policy_block: &'a str,
}

/// Body selector for `static.html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaticKind {
    About,
    Privacy,
    Terms,
    Disclaimer,
    Contact,
}

impl StaticKind {
    fn from_slug(slug: &str) -> Self {
        match slug {
            "about" => Self::About,
            "privacy" => Self::Privacy,
            "terms" => Self::Terms,
            "disclaimer" => Self::Disclaimer,
            _ => Self::Contact,
        }
    }
}

#[derive(Template)]
#[template(path = "static.html")]
struct StaticPage<'a> {
    chrome: Chrome<'a>,
    kind: StaticKind,
    heading: &'a str,
    contact_email: &'a str,
}

fn render_template(template: &impl Template) -> Result<String> {
    template
        .render()
        .map_err(|e| CuratorError::Render(e.to_string()))
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

pub fn render_index(
    cfg: &SiteConfig,
    recent: &[&Article],
    sidebar: &Sidebar,
    built_at: DateTime<Utc>,
) -> Result<String> {
    let entries = recent
        .iter()
        .map(|article| IndexEntry {
            url: cfg.url_for(&article.path),
            title: article.title.clone(),
            byline: byline(article),
            excerpt: excerpt(&plain_text(&article.summary), DESCRIPTION_CHARS),
        })
        .collect();

    let meta = PageMeta {
        title: cfg.title.clone(),
        description: cfg.description.clone(),
        canonical: cfg.homepage_url(),
        og_type: "website",
        image: None,
    };
    render_template(&IndexPage {
        chrome: Chrome::new(cfg, sidebar, meta, built_at),
        entries,
    })
}

pub fn render_article(
    cfg: &SiteConfig,
    article: &Article,
    related: &[&Article],
    sidebar: &Sidebar,
    built_at: DateTime<Utc>,
) -> Result<String> {
    let summary = plain_text(&article.summary);
    let description = if summary.is_empty() {
        excerpt(&plain_text(&article.body_html), DESCRIPTION_CHARS)
    } else {
        excerpt(&summary, DESCRIPTION_CHARS)
    };

    let meta = PageMeta {
        title: format!("{} | {}", article.title, cfg.title),
        description,
        canonical: cfg.url_for(&article.path),
        og_type: "article",
        image: article.hero_image.as_deref(),
    };
    render_template(&ArticlePage {
        chrome: Chrome::new(cfg, sidebar, meta, built_at),
        title: &article.title,
        byline: byline(article),
        body_html: &article.body_html,
        source_url: &article.source_url,
        related: links(cfg, related),
        policy_block: &cfg.policy_block,
    })
}

pub fn render_static(
    cfg: &SiteConfig,
    slug: &str,
    title: &str,
    sidebar: &Sidebar,
    built_at: DateTime<Utc>,
) -> Result<String> {
    let meta = PageMeta {
        title: format!("{title} | {}", cfg.title),
        description: cfg.description.clone(),
        canonical: cfg.url_for(&format!("{slug}.html")),
        og_type: "website",
        image: None,
    };
    render_template(&StaticPage {
        chrome: Chrome::new(cfg, sidebar, meta, built_at),
        kind: StaticKind::from_slug(slug),
        heading: title,
        contact_email: &cfg.contact_email,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn links(cfg: &SiteConfig, articles: &[&Article]) -> Vec<LinkItem> {
    articles.iter().map(|a| LinkItem::for_article(cfg, a)).collect()
}

/// Blank snippets render no slot at all.
fn ad_slot(snippet: &str) -> Option<&str> {
    let trimmed = snippet.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn byline(article: &Article) -> String {
    let mut parts = vec![article.published_ts.format("%Y-%m-%d").to_string()];
    if let Some(sub) = &article.subreddit {
        parts.push(format!("r/{sub}"));
    }
    if article.score.is_some() || article.comment_count.is_some() {
        parts.push(format!(
            "{} points, {} comments",
            article.score.unwrap_or(0),
            article.comment_count.unwrap_or(0)
        ));
    }
    parts.join(" · ")
}

/// Truncate to at most `max` characters on a word boundary.
pub(crate) fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > max / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end())
}
