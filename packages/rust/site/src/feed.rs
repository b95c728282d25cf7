//! Machine-readable outputs: RSS feed, sitemap and robots.txt.
//!
//! XML is written with `quick_xml::Writer`, which escapes text content.
//! Characters XML 1.0 forbids are removed before they reach the writer.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use curator_sanitize::plain_text;
use curator_shared::{Article, CuratorError, Result};

use crate::config::SiteConfig;
use crate::render::excerpt;

/// Maximum length of an RSS item description.
const ITEM_DESCRIPTION_CHARS: usize = 300;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

type XmlWriter = Writer<Vec<u8>>;

fn xml_error(e: impl Display) -> CuratorError {
    CuratorError::Render(format!("XML write failed: {e}"))
}

/// Drop control characters other than tab, LF and CR, and the two
/// non-characters XML 1.0 rejects.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}

fn new_document() -> Result<XmlWriter> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    Ok(writer)
}

fn finish(writer: XmlWriter) -> Result<String> {
    let mut xml = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
    xml.push('\n');
    Ok(xml)
}

fn start(w: &mut XmlWriter, tag: BytesStart<'_>) -> Result<()> {
    w.write_event(Event::Start(tag)).map_err(xml_error)
}

fn end(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
}

fn text_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    start(w, BytesStart::new(name))?;
    let safe = xml_safe(text);
    w.write_event(Event::Text(BytesText::new(&safe))).map_err(xml_error)?;
    end(w, name)
}

/// RSS 2.0 feed of the `feed_items` most recent articles.
pub fn render_rss(cfg: &SiteConfig, articles: &[&Article], built_at: DateTime<Utc>) -> Result<String> {
    let mut w = new_document()?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    start(&mut w, rss)?;
    start(&mut w, BytesStart::new("channel"))?;
    text_element(&mut w, "title", &cfg.title)?;
    text_element(&mut w, "link", &cfg.homepage_url())?;
    text_element(&mut w, "description", &cfg.description)?;
    text_element(&mut w, "language", &cfg.language)?;
    text_element(&mut w, "lastBuildDate", &built_at.to_rfc2822())?;

    for article in articles.iter().take(cfg.feed_items) {
        let url = cfg.url_for(&article.path);
        let summary = plain_text(&article.summary);
        let description = if summary.is_empty() {
            plain_text(&article.body_html)
        } else {
            summary
        };

        start(&mut w, BytesStart::new("item"))?;
        text_element(&mut w, "title", &article.title)?;
        text_element(&mut w, "link", &url)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        start(&mut w, guid)?;
        w.write_event(Event::Text(BytesText::new(&xml_safe(&url))))
            .map_err(xml_error)?;
        end(&mut w, "guid")?;

        text_element(&mut w, "pubDate", &article.published_ts.to_rfc2822())?;
        text_element(
            &mut w,
            "description",
            &excerpt(&description, ITEM_DESCRIPTION_CHARS),
        )?;
        end(&mut w, "item")?;
    }

    end(&mut w, "channel")?;
    end(&mut w, "rss")?;
    finish(w)
}

/// Sitemap listing the homepage and every article.
pub fn render_sitemap(cfg: &SiteConfig, articles: &[Article]) -> Result<String> {
    let mut w = new_document()?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    start(&mut w, urlset)?;

    start(&mut w, BytesStart::new("url"))?;
    text_element(&mut w, "loc", &cfg.homepage_url())?;
    end(&mut w, "url")?;

    for article in articles {
        start(&mut w, BytesStart::new("url"))?;
        text_element(&mut w, "loc", &cfg.url_for(&article.path))?;
        text_element(
            &mut w,
            "lastmod",
            &article.published_ts.format("%Y-%m-%d").to_string(),
        )?;
        end(&mut w, "url")?;
    }

    end(&mut w, "urlset")?;
    finish(w)
}

pub fn render_robots(cfg: &SiteConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}\n",
        cfg.url_for("sitemap.xml")
    )
}
