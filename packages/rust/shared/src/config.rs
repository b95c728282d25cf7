//! Application configuration for Curator.
//!
//! Config is read from `curator.toml`: an explicit `--config` path, then the
//! working directory, then `~/.curator/curator.toml`. Missing fields fall back
//! to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CuratorError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "curator.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".curator";

// ---------------------------------------------------------------------------
// Config structs (matching curator.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub site: SiteSection,

    /// Third-party ad snippets injected verbatim into every page.
    #[serde(default)]
    pub ads: AdsSection,

    #[serde(default)]
    pub feeds: FeedsSection,

    #[serde(default)]
    pub safety: SafetySection,

    #[serde(default)]
    pub selection: SelectionSection,

    #[serde(default)]
    pub related: RelatedSection,

    #[serde(default)]
    pub generation: GenerationSection,

    #[serde(default)]
    pub state: StateSection,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    /// Public base URL, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_site_title")]
    pub title: String,

    #[serde(default = "default_site_description")]
    pub description: String,

    #[serde(default = "default_contact_email")]
    pub contact_email: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Directory the static site is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Number of articles in `feed.xml`.
    #[serde(default = "default_feed_items")]
    pub feed_items: usize,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            title: default_site_title(),
            description: default_site_description(),
            contact_email: default_contact_email(),
            language: default_language(),
            output_dir: default_output_dir(),
            feed_items: default_feed_items(),
        }
    }
}

fn default_base_url() -> String {
    "https://example.github.io/curator".into()
}
fn default_site_title() -> String {
    "Curator Daily".into()
}
fn default_site_description() -> String {
    "One noteworthy community post a day, with context and takeaways.".into()
}
fn default_contact_email() -> String {
    "contact@example.com".into()
}
fn default_language() -> String {
    "en".into()
}
fn default_output_dir() -> String {
    "site".into()
}
fn default_feed_items() -> usize {
    20
}

/// `[ads]` section. Empty strings disable a slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdsSection {
    #[serde(default)]
    pub top: String,
    #[serde(default)]
    pub mid: String,
    #[serde(default)]
    pub bottom: String,
}

/// `[feeds]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsSection {
    /// Atom/RSS feed URLs, polled in order.
    #[serde(default = "default_feed_urls")]
    pub urls: Vec<String>,

    /// Maximum entries taken from each feed.
    #[serde(default = "default_max_items")]
    pub max_items_per_feed: usize,

    /// HTTP timeout per feed request.
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
}

impl Default for FeedsSection {
    fn default() -> Self {
        Self {
            urls: default_feed_urls(),
            max_items_per_feed: default_max_items(),
            timeout_secs: default_feed_timeout(),
        }
    }
}

fn default_feed_urls() -> Vec<String> {
    vec![
        "https://www.reddit.com/r/technology/.rss".into(),
        "https://www.reddit.com/r/Futurology/.rss".into(),
    ]
}
fn default_max_items() -> usize {
    25
}
fn default_feed_timeout() -> u64 {
    25
}

/// `[safety]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetySection {
    /// Case-insensitive substrings that disqualify a title.
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,

    /// Categories (subreddits) never picked, case-insensitive.
    #[serde(default)]
    pub blocked_categories: Vec<String>,

    /// Hosts a hero image may be served from. Anything else is dropped.
    #[serde(default = "default_image_hosts")]
    pub image_hosts: Vec<String>,
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            blocked_keywords: default_blocked_keywords(),
            blocked_categories: Vec::new(),
            image_hosts: default_image_hosts(),
        }
    }
}

fn default_blocked_keywords() -> Vec<String> {
    ["nsfw", "porn", "nude", "onlyfans", "suicide", "self-harm", "gore"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_image_hosts() -> Vec<String> {
    vec!["i.redd.it".into()]
}

/// Candidate ranking strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Keep feed order (newest / trending first as published by the feed).
    Recency,
    /// Enrich candidates with engagement signals and rank by momentum.
    #[default]
    Momentum,
}

/// `[selection]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSection {
    #[serde(default)]
    pub strategy: SelectionStrategy,

    /// Title similarity at or above which a candidate is a near-duplicate.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Maximum number of candidates enriched per run.
    #[serde(default = "default_enrich_limit")]
    pub enrich_limit: usize,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::default(),
            similarity_threshold: default_similarity_threshold(),
            enrich_limit: default_enrich_limit(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.78
}
fn default_enrich_limit() -> usize {
    15
}

/// `[related]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedSection {
    /// Added to the similarity when both articles share a category.
    #[serde(default = "default_category_bonus")]
    pub category_bonus: f64,

    /// Related items must score strictly above this.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    #[serde(default = "default_related_limit")]
    pub limit: usize,
}

impl Default for RelatedSection {
    fn default() -> Self {
        Self {
            category_bonus: default_category_bonus(),
            min_similarity: default_min_similarity(),
            limit: default_related_limit(),
        }
    }
}

fn default_category_bonus() -> f64 {
    0.08
}
fn default_min_similarity() -> f64 {
    0.05
}
fn default_related_limit() -> usize {
    6
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSection {
    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_target_words")]
    pub target_words: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            target_words: default_target_words(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.deepseek.com/v1".into()
}
fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_temperature() -> f64 {
    0.9
}
fn default_target_words() -> u32 {
    900
}
fn default_max_tokens() -> u32 {
    2400
}
fn default_generation_timeout() -> u64 {
    120
}

/// `[state]` section. Relative file paths resolve against `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSection {
    #[serde(default = "default_state_root")]
    pub root: String,

    #[serde(default = "default_processed_file")]
    pub processed_file: String,

    #[serde(default = "default_articles_file")]
    pub articles_file: String,

    #[serde(default = "default_last_run_file")]
    pub last_run_file: String,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            root: default_state_root(),
            processed_file: default_processed_file(),
            articles_file: default_articles_file(),
            last_run_file: default_last_run_file(),
        }
    }
}

fn default_state_root() -> String {
    ".".into()
}
fn default_processed_file() -> String {
    "processed_urls.txt".into()
}
fn default_articles_file() -> String {
    "data/articles.json".into()
}
fn default_last_run_file() -> String {
    "data/last_run.json".into()
}

impl StateSection {
    /// Resolve a configured file name against the state root.
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.root).join(path)
        }
    }
}

impl AppConfig {
    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.site.base_url.trim().is_empty() {
            return Err(CuratorError::config("site.base_url must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.selection.similarity_threshold) {
            return Err(CuratorError::config(format!(
                "selection.similarity_threshold must be within [0, 1], got {}",
                self.selection.similarity_threshold
            )));
        }
        if self.site.feed_items == 0 {
            return Err(CuratorError::config("site.feed_items must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.curator/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CuratorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.curator/curator.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Locate the config file: explicit path, then `./curator.toml`, then the user config.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(CuratorError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    let user = config_file_path()?;
    if user.exists() {
        return Ok(Some(user));
    }

    Ok(None)
}

/// Load the application config. Returns defaults if no config file exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match resolve_config_path(explicit)? {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!("config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CuratorError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| CuratorError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Write a default config file at `path` (or `./curator.toml`).
/// Returns the path to the created file.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if path.exists() {
        return Err(CuratorError::config(format!(
            "{} already exists, refusing to overwrite",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CuratorError::io(parent, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CuratorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CuratorError::io(&path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path)
}

/// Read the generation API key from the env var named in the config.
pub fn api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.generation.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(CuratorError::config(format!(
            "generation API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("DEEPSEEK_API_KEY"));
        assert!(toml_str.contains("strategy = \"momentum\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.selection.similarity_threshold, 0.78);
        assert_eq!(parsed.related.category_bonus, 0.08);
        assert_eq!(parsed.related.limit, 6);
        assert_eq!(parsed.safety.image_hosts, vec!["i.redd.it".to_string()]);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml_str = r#"
[site]
base_url = "https://news.example.org/"

[feeds]
urls = ["https://www.reddit.com/r/rust/.rss"]

[selection]
strategy = "recency"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.base_url(), "https://news.example.org");
        assert_eq!(config.feeds.urls.len(), 1);
        assert_eq!(config.feeds.max_items_per_feed, 25);
        assert_eq!(config.selection.strategy, SelectionStrategy::Recency);
        assert_eq!(config.site.feed_items, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_threshold_rejected() {
        let mut config = AppConfig::default();
        config.selection.similarity_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn state_paths_resolve_against_root() {
        let state = StateSection {
            root: "/srv/curator".into(),
            ..Default::default()
        };
        assert_eq!(
            state.resolve(&state.articles_file),
            PathBuf::from("/srv/curator/data/articles.json")
        );
        assert_eq!(state.resolve("/abs/file.txt"), PathBuf::from("/abs/file.txt"));
    }

    #[test]
    fn init_and_load_from_file() {
        let dir = std::env::temp_dir().join(format!("curator-config-test-{}", uuid::Uuid::now_v7()));
        let path = dir.join("curator.toml");

        let written = init_config(Some(&path)).expect("init config");
        assert_eq!(written, path);
        assert!(init_config(Some(&path)).is_err(), "must not overwrite");

        let loaded = load_config(Some(&path)).expect("load config");
        assert_eq!(loaded.site.output_dir, "site");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let missing = std::env::temp_dir().join("curator-definitely-missing.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn api_key_missing() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.generation.api_key_env = "CURATOR_TEST_NONEXISTENT_KEY_12345".into();
        let result = api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
