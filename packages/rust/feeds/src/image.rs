//! Hero image extraction and host allowlisting.

use scraper::{Html, Selector};
use url::Url;

use curator_shared::SafetySection;

/// Image-host allowlist. An image is kept only if its host equals an
/// allowlisted host or is a subdomain of one.
#[derive(Debug, Clone, Default)]
pub struct ImagePolicy {
    hosts: Vec<String>,
}

impl ImagePolicy {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().trim_end_matches('.').to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn from_safety(safety: &SafetySection) -> Self {
        Self::new(&safety.image_hosts)
    }

    /// Whether `url` points at an allowlisted host over http(s).
    pub fn allows(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        self.hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
    }

    /// Keep `url` only if allowlisted. Never substitutes another image.
    pub fn filter(&self, url: Option<String>) -> Option<String> {
        url.filter(|u| self.allows(u))
    }
}

/// First `<img src>` in an HTML fragment, if any.
pub fn first_image_src(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("img[src]").ok()?;
    fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}
