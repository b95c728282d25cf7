//! Tag allowlist: re-serializes an HTML fragment keeping only safe markup.

use scraper::{ElementRef, Html};
use url::Url;

use crate::escape::{escape_attr, escape_text};

/// Tags kept as-is (attributes stripped).
const ALLOWED: &[&str] = &[
    "p", "h2", "h3", "h4", "ul", "ol", "li", "strong", "em", "b", "i", "blockquote", "code",
    "pre", "a",
];

/// Void tags kept as-is.
const ALLOWED_VOID: &[&str] = &["br", "hr"];

/// Tags dropped together with everything inside them.
const DROPPED: &[&str] = &[
    "script", "style", "iframe", "noscript", "head", "title", "meta", "link", "object", "embed",
    "form", "input", "button", "select", "textarea", "svg", "math", "template", "img", "video",
    "audio", "source", "canvas",
];

/// Keep allowlisted tags, unwrap unknown ones, drop dangerous ones.
///
/// `<h1>` is demoted to `<h2>`: the page template owns the only `<h1>`.
/// Links keep only an http(s) or mailto `href`.
pub(crate) fn filter_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&escape_text(text));
        } else if let Some(el) = ElementRef::wrap(child) {
            write_element(el, out);
        }
    }
}

fn write_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name().to_ascii_lowercase();
    let name = name.as_str();

    if DROPPED.contains(&name) {
        return;
    }

    if ALLOWED_VOID.contains(&name) {
        out.push('<');
        out.push_str(name);
        out.push('>');
        return;
    }

    let tag = match name {
        "h1" => "h2",
        "h5" | "h6" => "h4",
        other if ALLOWED.contains(&other) => other,
        _ => {
            write_children(el, out);
            return;
        }
    };

    if tag == "a" {
        match el.value().attr("href").and_then(safe_href) {
            Some(href) => {
                out.push_str("<a href=\"");
                out.push_str(&escape_attr(&href));
                out.push_str("\" rel=\"nofollow noopener\">");
            }
            None => {
                write_children(el, out);
                return;
            }
        }
    } else {
        out.push('<');
        out.push_str(tag);
        out.push('>');
    }

    write_children(el, out);

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Absolute http(s) or mailto link, or nothing.
fn safe_href(href: &str) -> Option<String> {
    let url = Url::parse(href.trim()).ok()?;
    match url.scheme() {
        "http" | "https" | "mailto" => Some(url.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allowed_tags_and_strips_attributes() {
        let out = filter_tags(r#"<p class="x" onclick="evil()">Hi <strong style="c">there</strong></p>"#);
        assert_eq!(out, "<p>Hi <strong>there</strong></p>");
    }

    #[test]
    fn drops_scripts_with_content() {
        let out = filter_tags("<p>a</p><script>alert(1)</script><style>p{}</style><p>b</p>");
        assert_eq!(out, "<p>a</p><p>b</p>");
    }

    #[test]
    fn unwraps_unknown_tags() {
        let out = filter_tags("<div><span>text</span></div><section><p>x</p></section>");
        assert_eq!(out, "text<p>x</p>");
    }

    #[test]
    fn demotes_h1() {
        assert_eq!(filter_tags("<h1>Title</h1>"), "<h2>Title</h2>");
    }

    #[test]
    fn javascript_links_unwrapped() {
        let out = filter_tags(r#"<a href="javascript:alert(1)">x</a> <a href="https://example.com/a?b=1&c=2">y</a>"#);
        assert_eq!(
            out,
            r#"x <a href="https://example.com/a?b=1&amp;c=2" rel="nofollow noopener">y</a>"#
        );
    }

    #[test]
    fn text_is_reescaped() {
        assert_eq!(filter_tags("<p>1 &lt; 2 &amp; 3</p>"), "<p>1 &lt; 2 &amp; 3</p>");
    }

    #[test]
    fn full_documents_are_unwrapped() {
        let out = filter_tags("<html><head><title>t</title></head><body><p>x</p><br/></body></html>");
        assert_eq!(out, "<p>x</p><br>");
    }
}
