//! Static site assembler.
//!
//! [`render_site`] is a pure function of `(SiteConfig, articles, built_at)`;
//! [`assemble_site`] writes its output atomically and reports a checksum per
//! file. Output layout:
//!
//! ```text
//! <output_dir>/
//! ├── index.html
//! ├── articles/<id>.html
//! ├── about.html, privacy.html, terms.html, disclaimer.html, contact.html
//! ├── sitemap.xml
//! ├── robots.txt
//! ├── feed.xml
//! └── assets/style.css, assets/fx.js
//! ```

pub mod config;
pub mod feed;
pub mod render;
pub mod views;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use curator_shared::{Article, CuratorError, Result};

pub use config::{SiteConfig, default_policy_block};
pub use views::{TitleIndex, ranking_view, recency_view, related_articles};

use render::{STATIC_PAGES, Sidebar};

const STYLE_CSS: &str = include_str!("../static/style.css");
const FX_JS: &str = include_str!("../static/fx.js");

/// One rendered output file, path relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    pub path: String,
    pub content: String,
}

/// Metadata for a single written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputMeta {
    pub path: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Output from a successful site build.
#[derive(Debug, Clone)]
pub struct SiteBuild {
    pub output_dir: PathBuf,
    pub article_count: usize,
    pub files: Vec<OutputMeta>,
}

/// Render every output file in memory.
#[instrument(skip_all, fields(articles = articles.len()))]
pub fn render_site(
    cfg: &SiteConfig,
    articles: &[Article],
    built_at: DateTime<Utc>,
) -> Result<Vec<SiteFile>> {
    let ranking = ranking_view(articles);
    let recent = recency_view(articles);
    let sidebar = Sidebar::new(cfg, &ranking, &recent);
    let index = TitleIndex::new(articles);

    let mut files = Vec::with_capacity(articles.len() + STATIC_PAGES.len() + 6);

    files.push(SiteFile {
        path: "index.html".into(),
        content: render::render_index(cfg, &recent, &sidebar, built_at)?,
    });

    for article in articles {
        let path = article_file_path(article)?;
        let related = index.related(article, &cfg.related);
        files.push(SiteFile {
            path,
            content: render::render_article(cfg, article, &related, &sidebar, built_at)?,
        });
    }

    for (slug, title) in STATIC_PAGES {
        files.push(SiteFile {
            path: format!("{slug}.html"),
            content: render::render_static(cfg, slug, title, &sidebar, built_at)?,
        });
    }

    // The feed lists the newest articles first, however many there are.
    let mut newest: Vec<&Article> = articles.iter().collect();
    newest.sort_by(|a, b| {
        b.published_ts
            .cmp(&a.published_ts)
            .then_with(|| a.id.cmp(&b.id))
    });

    files.push(SiteFile {
        path: "feed.xml".into(),
        content: feed::render_rss(cfg, &newest, built_at)?,
    });
    files.push(SiteFile {
        path: "sitemap.xml".into(),
        content: feed::render_sitemap(cfg, articles)?,
    });
    files.push(SiteFile {
        path: "robots.txt".into(),
        content: feed::render_robots(cfg),
    });
    files.push(SiteFile {
        path: "assets/style.css".into(),
        content: STYLE_CSS.to_string(),
    });
    files.push(SiteFile {
        path: "assets/fx.js".into(),
        content: FX_JS.to_string(),
    });

    Ok(files)
}

/// Render the site and write it under `output_dir`.
///
/// Each file is written to a temp file and renamed into place, so readers
/// never observe a partially written page.
#[instrument(skip_all, fields(output_dir = %output_dir.display(), articles = articles.len()))]
pub fn assemble_site(
    cfg: &SiteConfig,
    articles: &[Article],
    output_dir: &Path,
    built_at: DateTime<Utc>,
) -> Result<SiteBuild> {
    let files = render_site(cfg, articles, built_at)?;

    let mut metas = Vec::with_capacity(files.len());
    for file in &files {
        metas.push(write_atomic(output_dir, file)?);
    }

    info!(
        files = metas.len(),
        articles = articles.len(),
        path = %output_dir.display(),
        "site assembly complete"
    );

    Ok(SiteBuild {
        output_dir: output_dir.to_path_buf(),
        article_count: articles.len(),
        files: metas,
    })
}

/// Output path of an article page, rejecting anything outside `articles/`.
fn article_file_path(article: &Article) -> Result<String> {
    let relative = article.path.trim_start_matches('/');
    let valid = relative.starts_with("articles/")
        && relative.ends_with(".html")
        && !relative.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if !valid {
        return Err(CuratorError::validation(format!(
            "article {} has an invalid path: {}",
            article.id, article.path
        )));
    }
    Ok(relative.to_string())
}

fn write_atomic(output_dir: &Path, file: &SiteFile) -> Result<OutputMeta> {
    let target = output_dir.join(&file.path);
    let parent = target.parent().unwrap_or(output_dir);
    std::fs::create_dir_all(parent).map_err(|e| CuratorError::io(parent, e))?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &file.content).map_err(|e| CuratorError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| CuratorError::io(&target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(file.content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    debug!(file = %file.path, size = file.content.len(), "wrote site file");

    Ok(OutputMeta {
        path: file.path.clone(),
        sha256: hash,
        size_bytes: file.content.len(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use curator_shared::{AppConfig, Article, ImageKind};

    use crate::config::SiteConfig;

    pub fn site_config() -> SiteConfig {
        let mut app = AppConfig::default();
        app.site.base_url = "https://news.example.org".into();
        SiteConfig::from_app(&app)
    }

    pub fn article(
        id: &str,
        title: &str,
        published: &str,
        score: Option<i64>,
        comment_count: Option<i64>,
        subreddit: Option<&str>,
    ) -> Article {
        Article {
            id: id.into(),
            title: title.into(),
            path: format!("/articles/{id}.html"),
            published_ts: published.parse().expect("valid timestamp"),
            source_url: format!("https://www.reddit.com/r/test/comments/{id}/"),
            feed_url: String::new(),
            subreddit: subreddit.map(str::to_string),
            score,
            comment_count,
            summary: format!("Summary of {title}"),
            body_html: format!("<p>Body of {title}</p>"),
            hero_image: None,
            hero_image_kind: ImageKind::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{article, site_config};
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("curator-site-test-{}", Uuid::now_v7()))
    }

    fn history() -> Vec<Article> {
        vec![
            article("2026-10-17-gpu", "GPU prices fall", "2026-10-17T08:00:00Z", Some(50), Some(10), Some("hardware")),
            article("2026-10-16-rust", "Rust 2.0 roadmap", "2026-10-16T08:00:00Z", None, None, Some("rust")),
            article("2026-10-15-gpu2", "GPU shortage ends", "2026-10-15T08:00:00Z", Some(5), Some(1), Some("hardware")),
        ]
    }

    fn built_at() -> DateTime<Utc> {
        "2026-10-17T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn writes_expected_layout() {
        let tmp = temp_dir();
        let build = assemble_site(&site_config(), &history(), &tmp, built_at()).unwrap();

        for path in [
            "index.html",
            "articles/2026-10-17-gpu.html",
            "articles/2026-10-16-rust.html",
            "about.html",
            "privacy.html",
            "terms.html",
            "disclaimer.html",
            "contact.html",
            "sitemap.xml",
            "robots.txt",
            "feed.xml",
            "assets/style.css",
            "assets/fx.js",
        ] {
            assert!(tmp.join(path).exists(), "missing {path}");
        }
        assert_eq!(build.article_count, 3);
        assert_eq!(build.files.len(), 3 + 5 + 6);
        assert!(build.files.iter().all(|f| f.sha256.len() == 64));

        // No temp files left behind
        for entry in std::fs::read_dir(tmp.join("articles")).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'));
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let tmp = temp_dir();
        let first = assemble_site(&site_config(), &history(), &tmp, built_at()).unwrap();
        let index_before = std::fs::read(tmp.join("index.html")).unwrap();
        let second = assemble_site(&site_config(), &history(), &tmp, built_at()).unwrap();
        let index_after = std::fs::read(tmp.join("index.html")).unwrap();

        assert_eq!(first.files, second.files);
        assert_eq!(index_before, index_after);
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn only_built_at_changes_output() {
        let cfg = site_config();
        let a = render_site(&cfg, &history(), built_at()).unwrap();
        let b = render_site(&cfg, &history(), "2026-10-18T09:00:00Z".parse().unwrap()).unwrap();
        let css_a = a.iter().find(|f| f.path == "assets/style.css").unwrap();
        let css_b = b.iter().find(|f| f.path == "assets/style.css").unwrap();
        assert_eq!(css_a, css_b);
        let index_b = b.iter().find(|f| f.path == "index.html").unwrap();
        assert!(index_b.content.contains("2026-10-18T09:00:00Z"));
    }

    #[test]
    fn article_page_links_related_same_topic() {
        let files = render_site(&site_config(), &history(), built_at()).unwrap();
        let page = files
            .iter()
            .find(|f| f.path == "articles/2026-10-17-gpu.html")
            .unwrap();
        let related_section = page
            .content
            .split("<h2>Related</h2>")
            .nth(1)
            .and_then(|rest| rest.split("</section>").next())
            .unwrap();
        assert!(related_section.contains("GPU shortage ends"));
        assert!(!related_section.contains("Rust 2.0 roadmap"));
    }

    #[test]
    fn empty_history_still_builds() {
        let files = render_site(&site_config(), &[], built_at()).unwrap();
        assert_eq!(files.len(), 5 + 6);
        let index = files.iter().find(|f| f.path == "index.html").unwrap();
        assert!(index.content.contains("No articles yet"));
    }

    #[test]
    fn traversal_paths_rejected() {
        let mut bad = article("x", "X", "2026-10-17T08:00:00Z", None, None, None);
        bad.path = "/articles/../../etc/passwd.html".into();
        let err = render_site(&site_config(), &[bad], built_at()).unwrap_err();
        assert!(err.to_string().contains("invalid path"));
    }
}
