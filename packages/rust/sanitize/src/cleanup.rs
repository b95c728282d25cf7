//! Text-level cleanup passes applied around the tag allowlist.
//!
//! Each pass is a function `&str -> String`.

use std::sync::LazyLock;

use regex::Regex;

use curator_shared::title_similarity;

// ---------------------------------------------------------------------------
// Pass 1: Strip code fences
// ---------------------------------------------------------------------------

/// Remove Markdown code fence lines (```` ``` ```` and ```` ```html ````).
///
/// Models often wrap an HTML answer in a fenced block; only the fence lines
/// are dropped, the content between them is kept.
pub(crate) fn strip_code_fences(text: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^[ \t]*(```|~~~)[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("valid regex")
    });

    FENCE_RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Drop a leading heading that restates the title
// ---------------------------------------------------------------------------

/// Title similarity at or above which a leading heading counts as a restatement.
const RESTATEMENT_THRESHOLD: f64 = 0.8;

/// Remove the first heading of `html` if it merely repeats `title`.
///
/// Runs on allowlisted output, where headings carry no attributes.
pub(crate) fn strip_leading_title_heading(html: &str, title: &str) -> String {
    static LEADING_H_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)^\s*<(h[1-6])>(.*?)</h[1-6]>").expect("valid regex")
    });

    let Some(caps) = LEADING_H_RE.captures(html) else {
        return html.to_string();
    };

    let heading = super::plain_text(&caps[2]);
    if !restates(&heading, title) {
        return html.to_string();
    }

    let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
    html[end..].trim_start().to_string()
}

fn restates(heading: &str, title: &str) -> bool {
    let a = comparable(heading);
    let b = comparable(title);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || title_similarity(heading, title) >= RESTATEMENT_THRESHOLD
}

/// Lower-case alphanumeric words joined by single spaces.
fn comparable(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Pass 3: Normalize whitespace between blocks
// ---------------------------------------------------------------------------

/// Collapse blank-line runs and trim the result.
///
/// `<pre>` blocks are copied through untouched.
pub(crate) fn normalize_whitespace(html: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));
    static PRE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<pre\b[^>]*>.*?</pre\s*>").expect("valid regex"));

    let html = html.trim();
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for pre in PRE_RE.find_iter(html) {
        out.push_str(&MULTI_BLANK_RE.replace_all(&html[last..pre.start()], "\n"));
        out.push_str(pre.as_str());
        last = pre.end();
    }
    out.push_str(&MULTI_BLANK_RE.replace_all(&html[last..], "\n"));
    out
}
