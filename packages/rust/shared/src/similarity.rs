//! Title tokenization and Jaccard similarity.
//!
//! Used by the selector for near-duplicate rejection and by the site
//! assembler for related-article matching.

use std::collections::HashSet;

/// Words that carry no topical signal in a headline.
///
/// Common English function words plus headline filler ("major", "announced",
/// "breaking", ...) so that a reworded duplicate still matches its original
/// while two titles sharing only these words do not.
const STOP_WORDS: &[&str] = &[
    // function words
    "a", "an", "the", "and", "or", "but", "nor", "of", "to", "in", "on", "at", "for", "with",
    "by", "from", "as", "into", "onto", "over", "under", "about", "after", "before", "up",
    "down", "out", "off", "than", "then", "so", "if", "not", "no", "is", "are", "was", "were",
    "be", "been", "being", "am", "it", "its", "this", "that", "these", "those", "i", "you",
    "he", "she", "we", "they", "me", "us", "him", "them", "my", "your", "our", "their", "his",
    "her", "what", "how", "why", "when", "where", "who", "which", "has", "have", "had", "do",
    "does", "did", "will", "would", "can", "could", "should", "just", "vs", "via",
    // headline filler
    "major", "announced", "announces", "announce", "breaking", "new", "update", "updated",
    "report", "reports", "says", "said", "finally", "officially", "huge",
];

/// Apostrophes are deleted rather than split on, so "Apple's" stays one word.
const APOSTROPHES: &[char] = &['\'', '\u{2019}', '\u{2018}'];

/// Tokenize a title into a set of lower-cased topical words.
///
/// Apostrophes are removed, every other non-alphanumeric character is a
/// separator. Stop words and single letters are dropped.
pub fn tokenize(title: &str) -> HashSet<String> {
    let lowered: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !APOSTROPHES.contains(c))
        .collect();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .filter(|t| !is_single_letter(t))
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn is_single_letter(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|` in `[0, 1]`.
///
/// Two empty sets have similarity `0.0`: untitled items are never near-duplicates.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Convenience: similarity of two raw titles.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    jaccard(&tokenize(a), &tokenize(b))
}
