//! Explicit site configuration passed to the assembler.

use curator_sanitize::escape_attr;
use curator_shared::{AdsSection, AppConfig, RelatedSection};

/// Everything the assembler needs besides the article history.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Public base URL, without trailing slash.
    pub base_url: String,
    pub title: String,
    pub description: String,
    pub contact_email: String,
    pub language: String,
    /// Number of articles in `feed.xml`.
    pub feed_items: usize,
    /// Third-party snippets, injected verbatim.
    pub ads: AdsSection,
    /// Trusted HTML shown under every article.
    pub policy_block: String,
    pub related: RelatedSection,
}

impl SiteConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            title: config.site.title.clone(),
            description: config.site.description.clone(),
            contact_email: config.site.contact_email.clone(),
            language: config.site.language.clone(),
            feed_items: config.site.feed_items,
            ads: config.ads.clone(),
            policy_block: default_policy_block(&config.site.contact_email),
            related: config.related.clone(),
        }
    }

    /// Homepage URL, with trailing slash.
    pub fn homepage_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Absolute URL of a site-relative path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Standard source, attribution and removal policy shown with each article.
pub fn default_policy_block(contact_email: &str) -> String {
    let email = escape_attr(contact_email);
    format!(
        r#"<p><strong>Policy &amp; transparency</strong></p>
<ul>
  <li><strong>Source &amp; attribution:</strong> Each post is based on a public community feed item. We always link to the original post and do not claim ownership of third-party content.</li>
  <li><strong>Original value:</strong> We add commentary, context and takeaways. Anything uncertain is labeled as speculation.</li>
  <li><strong>No manipulation:</strong> No cloaking, hidden text or misleading metadata. Titles and summaries reflect the page content.</li>
  <li><strong>Safety filters:</strong> Items with adult, self-harm or gore keywords are skipped.</li>
  <li><strong>Ads:</strong> Third-party scripts may show ads we do not directly control. Report problematic ads and we will adjust.</li>
  <li><strong>Removal requests:</strong> Email us with the URL and justification.</li>
</ul>
<p>Contact: <a href="mailto:{email}">{email}</a></p>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_app_strips_trailing_slash() {
        let mut app = AppConfig::default();
        app.site.base_url = "https://news.example.org/".into();
        let cfg = SiteConfig::from_app(&app);
        assert_eq!(cfg.base_url, "https://news.example.org");
        assert_eq!(cfg.homepage_url(), "https://news.example.org/");
        assert_eq!(
            cfg.url_for("/articles/a.html"),
            "https://news.example.org/articles/a.html"
        );
    }

    #[test]
    fn policy_block_escapes_email() {
        let block = default_policy_block("a\"b@example.com");
        assert!(block.contains("mailto:a&quot;b@example.com"));
    }
}
