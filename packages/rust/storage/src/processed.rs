//! The processed log: an append-only, ordered set of canonical URLs.

use std::collections::HashSet;

use curator_shared::normalize_url;

/// In-memory view of the processed log.
///
/// Entries keep their file order; membership is checked against the
/// canonical form of a link.
#[derive(Debug, Clone, Default)]
pub struct ProcessedLog {
    entries: Vec<String>,
    index: HashSet<String>,
}

impl ProcessedLog {
    /// Parse the line-oriented file content. Blank lines and repeats are ignored.
    pub fn from_text(text: &str) -> Self {
        let mut log = Self::default();
        for line in text.lines() {
            log.insert(line);
        }
        log
    }

    /// Whether the canonical form of `link` has already been processed.
    pub fn contains(&self, link: &str) -> bool {
        self.index.contains(&normalize_url(link))
    }

    /// Record a link. Returns `false` if it was empty or already present.
    pub fn insert(&mut self, link: &str) -> bool {
        let canonical = normalize_url(link);
        if canonical.is_empty() || !self.index.insert(canonical.clone()) {
            return false;
        }
        self.entries.push(canonical);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_normalizes() {
        let log = ProcessedLog::from_text(
            "https://example.com/a/\n\n  https://example.com/b#frag\nhttps://example.com/a\n",
        );
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.iter().collect::<Vec<_>>(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn membership_uses_canonical_form() {
        let log = ProcessedLog::from_text("https://example.com/post\n");
        assert!(log.contains("https://example.com/post/?utm_source=rss"));
        assert!(!log.contains("https://example.com/other"));
    }

    #[test]
    fn insert_rejects_duplicates_and_empty() {
        let mut log = ProcessedLog::default();
        assert!(log.insert("https://example.com/x"));
        assert!(!log.insert("https://example.com/x/"));
        assert!(!log.insert("   "));
        assert_eq!(log.len(), 1);
    }
}
