//! Sanitation of generated article HTML.
//!
//! Generated bodies are untrusted. [`sanitize_article_html`] turns a raw model
//! answer into a body fragment the site assembler can embed verbatim:
//! 1. strip Markdown code fences around the answer
//! 2. keep only allowlisted tags (attributes dropped, scripts removed)
//! 3. drop a leading heading that restates the article title
//! 4. normalize whitespace
//!
//! Also home to the escaping helpers used by the assembler.

mod allowlist;
mod cleanup;
pub mod escape;

use scraper::Html;
use tracing::{debug, instrument};

pub use escape::{escape_attr, escape_text};

/// Sanitize a generated article body. May return an empty string.
#[instrument(skip_all, fields(raw_len = raw.len()))]
pub fn sanitize_article_html(raw: &str, title: &str) -> String {
    let unfenced = cleanup::strip_code_fences(raw);
    let filtered = allowlist::filter_tags(&unfenced);
    let without_title = cleanup::strip_leading_title_heading(filtered.trim(), title);
    let result = cleanup::normalize_whitespace(&without_title);

    debug!(out_len = result.len(), "article body sanitized");
    result
}

/// Visible text of an HTML fragment, whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a fragment has no visible text.
pub fn is_blank(html: &str) -> bool {
    plain_text(html).is_empty()
}
