//! File-backed state store.
//!
//! The [`StateStore`] owns the three persisted documents of a Curator
//! installation:
//! - the processed log (`processed_urls.txt`), one canonical URL per line,
//!   only ever appended to
//! - the article history (`data/articles.json`), newest first
//! - the last run report (`data/last_run.json`), overwritten each run
//!
//! **Access rules:**
//! - the orchestrator is the sole writer, via [`StateStore::open`]
//! - previews and rebuilds read through [`StateStore::open_readonly`]
//!
//! There is no locking; callers guarantee a single run at a time.

mod processed;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use curator_shared::{Article, CuratorError, Result, RunReport, StateSection, normalize_url};
use tracing::{debug, info, instrument};

pub use processed::ProcessedLog;

/// Locations of the persisted documents.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub processed: PathBuf,
    pub articles: PathBuf,
    pub last_run: PathBuf,
}

impl From<&StateSection> for StatePaths {
    fn from(section: &StateSection) -> Self {
        Self {
            processed: section.resolve(&section.processed_file),
            articles: section.resolve(&section.articles_file),
            last_run: section.resolve(&section.last_run_file),
        }
    }
}

/// Everything a run reads at start-up.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub processed: ProcessedLog,
    /// Article history, newest first.
    pub articles: Vec<Article>,
}

/// Primary handle over the persisted state documents.
#[derive(Debug, Clone)]
pub struct StateStore {
    paths: StatePaths,
    readonly: bool,
}

impl StateStore {
    /// Open the store in read-write mode, creating parent directories.
    pub fn open(paths: StatePaths) -> Result<Self> {
        for path in [&paths.processed, &paths.articles, &paths.last_run] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| CuratorError::io(parent, e))?;
            }
        }
        Ok(Self {
            paths,
            readonly: false,
        })
    }

    /// Open the store in read-only mode (previews, rebuilds).
    pub fn open_readonly(paths: StatePaths) -> Self {
        Self {
            paths,
            readonly: true,
        }
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(CuratorError::Storage(
                "state store is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Read the processed log. A missing file is an empty log.
    pub fn load_processed(&self) -> Result<ProcessedLog> {
        let text = read_optional(&self.paths.processed)?.unwrap_or_default();
        let log = ProcessedLog::from_text(&text);
        debug!(entries = log.len(), "loaded processed log");
        Ok(log)
    }

    /// Read the article history. A missing file is an empty history.
    pub fn load_articles(&self) -> Result<Vec<Article>> {
        let Some(text) = read_optional(&self.paths.articles)? else {
            return Ok(Vec::new());
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let articles: Vec<Article> = serde_json::from_str(&text).map_err(|e| {
            CuratorError::Storage(format!(
                "invalid article history {}: {e}",
                self.paths.articles.display()
            ))
        })?;
        debug!(count = articles.len(), "loaded article history");
        Ok(articles)
    }

    /// Read processed log and history together.
    #[instrument(skip_all)]
    pub fn load(&self) -> Result<StateSnapshot> {
        Ok(StateSnapshot {
            processed: self.load_processed()?,
            articles: self.load_articles()?,
        })
    }

    /// Read the last run report, if any.
    pub fn load_report(&self) -> Result<Option<RunReport>> {
        let Some(text) = read_optional(&self.paths.last_run)? else {
            return Ok(None);
        };
        let report = serde_json::from_str(&text).map_err(|e| {
            CuratorError::Storage(format!(
                "invalid run report {}: {e}",
                self.paths.last_run.display()
            ))
        })?;
        Ok(Some(report))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persist a newly created article.
    ///
    /// Prepends `article` to `history`, appends its canonical source link to
    /// the processed log, and returns the new history. The history document is
    /// staged to a temp file first and only renamed into place after the log
    /// append succeeded, so a failure leaves either no change or a processed
    /// link without an article, never a partial document.
    #[instrument(skip_all, fields(id = %article.id))]
    pub fn commit_article(
        &self,
        processed: &ProcessedLog,
        history: &[Article],
        article: Article,
    ) -> Result<Vec<Article>> {
        self.check_writable()?;

        let canonical = normalize_url(&article.source_url);
        if canonical.is_empty() {
            return Err(CuratorError::validation("article has an empty source URL"));
        }
        if processed.contains(&canonical) {
            return Err(CuratorError::validation(format!(
                "source {canonical} is already in the processed log"
            )));
        }
        if history
            .iter()
            .any(|a| a.id == article.id || a.path == article.path)
        {
            return Err(CuratorError::validation(format!(
                "article id or path already exists: {}",
                article.id
            )));
        }

        let mut updated = Vec::with_capacity(history.len() + 1);
        updated.push(article);
        updated.extend_from_slice(history);

        let staged = stage_json(&self.paths.articles, &updated)?;

        if let Err(e) = append_line(&self.paths.processed, &canonical) {
            let _ = std::fs::remove_file(&staged);
            return Err(e);
        }

        std::fs::rename(&staged, &self.paths.articles)
            .map_err(|e| CuratorError::io(&self.paths.articles, e))?;

        info!(
            link = %canonical,
            history = updated.len(),
            "article committed"
        );
        Ok(updated)
    }

    /// Overwrite the last run report.
    pub fn write_report(&self, report: &RunReport) -> Result<()> {
        self.check_writable()?;
        let staged = stage_json(&self.paths.last_run, report)?;
        std::fs::rename(&staged, &self.paths.last_run)
            .map_err(|e| CuratorError::io(&self.paths.last_run, e))?;
        debug!(created = report.created, "run report written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CuratorError::io(path, e)),
    }
}

/// Serialize `data` next to `target` as a hidden temp file and return its path.
fn stage_json<T: serde::Serialize + ?Sized>(target: &Path, data: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| CuratorError::Storage(format!("JSON serialization failed: {e}")))?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| CuratorError::validation(format!("not a file path: {}", target.display())))?;
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, format!("{json}\n")).map_err(|e| CuratorError::io(&temp, e))?;
    Ok(temp)
}

/// Append one line to a text file, adding a separating newline if the file lacks one.
fn append_line(path: &Path, line: &str) -> Result<()> {
    let needs_newline = match std::fs::read(path) {
        Ok(bytes) => !bytes.is_empty() && !bytes.ends_with(b"\n"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(CuratorError::io(path, e)),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CuratorError::io(path, e))?;

    let mut buf = String::new();
    if needs_newline {
        buf.push('\n');
    }
    buf.push_str(line);
    buf.push('\n');

    file.write_all(buf.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| CuratorError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use curator_shared::ImageKind;
    use uuid::Uuid;

    fn temp_paths() -> (PathBuf, StatePaths) {
        let root = std::env::temp_dir().join(format!("curator-state-test-{}", Uuid::now_v7()));
        let paths = StatePaths {
            processed: root.join("processed_urls.txt"),
            articles: root.join("data/articles.json"),
            last_run: root.join("data/last_run.json"),
        };
        (root, paths)
    }

    fn article(id: &str, source: &str) -> Article {
        Article {
            id: id.into(),
            title: format!("Title {id}"),
            path: format!("/articles/{id}.html"),
            published_ts: Utc::now(),
            source_url: source.into(),
            feed_url: String::new(),
            subreddit: None,
            score: None,
            comment_count: None,
            summary: String::new(),
            body_html: "<p>x</p>".into(),
            hero_image: None,
            hero_image_kind: ImageKind::None,
        }
    }

    #[test]
    fn empty_state_loads_as_empty() {
        let (root, paths) = temp_paths();
        let store = StateStore::open(paths).unwrap();
        let snapshot = store.load().unwrap();
        assert!(snapshot.processed.is_empty());
        assert!(snapshot.articles.is_empty());
        assert!(store.load_report().unwrap().is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn commit_prepends_and_appends() {
        let (root, paths) = temp_paths();
        let store = StateStore::open(paths.clone()).unwrap();

        let snapshot = store.load().unwrap();
        let history = store
            .commit_article(&snapshot.processed, &snapshot.articles, article("a", "https://example.com/a/"))
            .unwrap();
        assert_eq!(history.len(), 1);

        let snapshot = store.load().unwrap();
        let history = store
            .commit_article(&snapshot.processed, &snapshot.articles, article("b", "https://example.com/b"))
            .unwrap();
        assert_eq!(history[0].id, "b");
        assert_eq!(history[1].id, "a");

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.articles.len(), 2);
        assert_eq!(reloaded.articles[0].id, "b");
        assert_eq!(
            reloaded.processed.iter().collect::<Vec<_>>(),
            vec!["https://example.com/a", "https://example.com/b"]
        );

        // No temp files should remain
        for entry in std::fs::read_dir(root.join("data")).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn commit_rejects_processed_link() {
        let (root, paths) = temp_paths();
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(&paths.processed, "https://example.com/a").unwrap();
        let store = StateStore::open(paths).unwrap();

        let snapshot = store.load().unwrap();
        let err = store
            .commit_article(&snapshot.processed, &snapshot.articles, article("a", "https://example.com/a#x"))
            .unwrap_err();
        assert!(err.to_string().contains("already in the processed log"));
        assert!(store.load_articles().unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn commit_rejects_duplicate_id() {
        let (root, paths) = temp_paths();
        let store = StateStore::open(paths).unwrap();
        let history = vec![article("a", "https://example.com/a")];
        let err = store
            .commit_article(&ProcessedLog::default(), &history, article("a", "https://example.com/other"))
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn append_adds_missing_newline() {
        let (root, paths) = temp_paths();
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(&paths.processed, "https://example.com/old").unwrap();
        let store = StateStore::open(paths.clone()).unwrap();

        let snapshot = store.load().unwrap();
        store
            .commit_article(&snapshot.processed, &snapshot.articles, article("n", "https://example.com/new"))
            .unwrap();

        let text = std::fs::read_to_string(&paths.processed).unwrap();
        assert_eq!(text, "https://example.com/old\nhttps://example.com/new\n");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn corrupt_history_is_a_storage_error() {
        let (root, paths) = temp_paths();
        let store = StateStore::open(paths.clone()).unwrap();
        std::fs::write(&paths.articles, "{ not json").unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, CuratorError::Storage(_)));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn report_roundtrip() {
        let (root, paths) = temp_paths();
        let store = StateStore::open(paths).unwrap();
        let report = RunReport {
            run_id: Uuid::now_v7(),
            updated_utc: Utc::now(),
            homepage_url: "https://example.com/".into(),
            created: false,
            article_url: String::new(),
            article_path: String::new(),
            article_title: String::new(),
            source_url: String::new(),
            note: "No new candidate found. Site rebuilt.".into(),
        };
        store.write_report(&report).unwrap();
        assert_eq!(store.load_report().unwrap(), Some(report));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn readonly_rejects_writes() {
        let (root, paths) = temp_paths();
        let store = StateStore::open_readonly(paths);
        let err = store
            .commit_article(&ProcessedLog::default(), &[], article("a", "https://example.com/a"))
            .unwrap_err();
        assert!(err.to_string().contains("read-only"));
        let _ = std::fs::remove_dir_all(&root);
    }
}
