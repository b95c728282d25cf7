//! URL canonicalization: the dedup key for the processed log.

use url::Url;

/// Query parameters that only track the referrer and never identify a resource.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "mc_cid", "mc_eid", "ref", "ref_src", "share_id", "si", "igshid",
];

fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

/// Normalize a link so the same underlying resource always maps to one key.
///
/// Drops the fragment, tracking query parameters and trailing slashes.
/// Scheme and host case and default ports are normalized by the URL parser.
/// Input that does not parse as a URL is only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.trim_end_matches('/').to_string();
    };

    url.set_fragment(None);

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let mut s = url.to_string();
    if url.query().is_none() {
        while s.ends_with('/') {
            s.pop();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://www.reddit.com/r/rust/comments/abc/title/#comments"),
            "https://www.reddit.com/r/rust/comments/abc/title"
        );
    }

    #[test]
    fn strips_tracking_params_only() {
        assert_eq!(
            normalize_url("https://example.com/post?id=7&utm_source=rss&utm_medium=feed&fbclid=x"),
            "https://example.com/post?id=7"
        );
        assert_eq!(
            normalize_url("https://example.com/post/?utm_campaign=a"),
            "https://example.com/post"
        );
        assert_eq!(
            normalize_url("https://example.com/post/?id=7&UTM_Source=x"),
            "https://example.com/post?id=7"
        );
    }

    #[test]
    fn same_resource_same_key() {
        let a = normalize_url("HTTPS://Example.COM:443/a/b/");
        let b = normalize_url("https://example.com/a/b?ref=home");
        let c = normalize_url("  https://example.com/a/b#top  ");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn root_url() {
        assert_eq!(normalize_url("https://example.com/"), "https://example.com");
    }

    #[test]
    fn unparseable_and_empty() {
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("   "), "");
        assert_eq!(normalize_url("not a url/"), "not a url");
    }

    #[test]
    fn idempotent() {
        let once = normalize_url("https://example.com/x/?utm_source=a&q=1#f");
        assert_eq!(normalize_url(&once), once);
    }
}
