//! The daily run: select → generate → persist → rebuild → report.
//!
//! All state writes happen here, through the [`StateStore`]. A run that
//! fails during generation leaves every persisted document untouched.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use curator_feeds::{Enricher, FeedSource};
use curator_sanitize::{is_blank, sanitize_article_html};
use curator_shared::{AppConfig, Article, CuratorError, Result, RunReport};
use curator_site::{SiteBuild, SiteConfig, assemble_site};
use curator_storage::StateStore;

use crate::article::build_article;
use crate::generation::ContentGenerator;
use crate::selector::{Selection, SelectionConfig, Selector};

/// Note recorded when a run found nothing to publish.
pub const NO_CANDIDATE_NOTE: &str = "No new candidate found. Site rebuilt.";

/// Collaborators a run needs.
pub struct RunContext<'a> {
    pub config: &'a AppConfig,
    pub store: &'a StateStore,
    pub feeds: &'a dyn FeedSource,
    pub enricher: &'a dyn Enricher,
    pub generator: &'a dyn ContentGenerator,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    /// The article created by this run, if any.
    pub article: Option<Article>,
    pub site: SiteBuild,
    pub selection: Selection,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the run completes.
    fn done(&self, outcome: &RunOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _outcome: &RunOutcome) {}
}

/// Directory the site is written to.
pub fn site_output_dir(config: &AppConfig) -> PathBuf {
    config.state.resolve(&config.site.output_dir)
}

/// Run the pipeline once, stamped with the current time.
pub async fn run_once(ctx: &RunContext<'_>, progress: &dyn ProgressReporter) -> Result<RunOutcome> {
    run_at(ctx, Utc::now().trunc_subsecs(0), progress).await
}

/// Run the pipeline once with an explicit timestamp.
///
/// 1. Load state (processed log, history)
/// 2. Select a candidate
/// 3. If none: rebuild the site and report `created = false`
/// 4. Otherwise generate and sanitize the body, commit the article,
///    rebuild, and report `created = true`
#[instrument(skip_all, fields(run_id = tracing::field::Empty))]
pub async fn run_at(
    ctx: &RunContext<'_>,
    now: DateTime<Utc>,
    progress: &dyn ProgressReporter,
) -> Result<RunOutcome> {
    let start = Instant::now();
    let run_id = Uuid::now_v7();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));
    info!(%run_id, "starting run");

    // --- Phase 1: Load state ---
    progress.phase("Loading state");
    let snapshot = ctx.store.load()?;

    // --- Phase 2: Select ---
    progress.phase("Selecting candidate");
    let selector = Selector::new(
        SelectionConfig::from_app(ctx.config),
        ctx.feeds,
        ctx.enricher,
    );
    let selection = selector.select(&snapshot.processed, &snapshot.articles).await;

    let site_cfg = SiteConfig::from_app(ctx.config);
    let output_dir = site_output_dir(ctx.config);

    let Some(candidate) = selection.candidate.clone() else {
        // --- No candidate: rebuild and report ---
        progress.phase("Rebuilding site");
        let site = assemble_site(&site_cfg, &snapshot.articles, &output_dir, now)?;

        let report = RunReport {
            run_id,
            updated_utc: now,
            homepage_url: site_cfg.homepage_url(),
            created: false,
            article_url: String::new(),
            article_path: String::new(),
            article_title: String::new(),
            source_url: String::new(),
            note: NO_CANDIDATE_NOTE.to_string(),
        };
        ctx.store.write_report(&report)?;

        let outcome = RunOutcome {
            report,
            article: None,
            site,
            selection,
            elapsed: start.elapsed(),
        };
        info!(elapsed_ms = outcome.elapsed.as_millis(), "run finished without a new article");
        progress.done(&outcome);
        return Ok(outcome);
    };

    // --- Phase 3: Generate ---
    progress.phase("Generating article");
    let generated = ctx.generator.generate(&candidate).await?;
    if let Some(suggested) = &generated.title {
        if suggested.trim() != candidate.entry.title.trim() {
            info!(%suggested, "ignoring generated title, keeping the source title");
        }
    }

    let body_html = sanitize_article_html(&generated.body_html, &candidate.entry.title);
    if is_blank(&body_html) {
        warn!(title = %candidate.entry.title, "generated body empty after sanitation");
        return Err(CuratorError::Generation(
            "generated article body is empty after sanitation".into(),
        ));
    }

    // --- Phase 4: Persist ---
    progress.phase("Saving article");
    let article = build_article(&candidate, body_html, now, &snapshot.articles);
    let history = ctx
        .store
        .commit_article(&snapshot.processed, &snapshot.articles, article.clone())?;

    // --- Phase 5: Rebuild and report ---
    progress.phase("Rebuilding site");
    let site = assemble_site(&site_cfg, &history, &output_dir, now)?;

    let report = RunReport {
        run_id,
        updated_utc: now,
        homepage_url: site_cfg.homepage_url(),
        created: true,
        article_url: site_cfg.url_for(&article.path),
        article_path: article.path.clone(),
        article_title: article.title.clone(),
        source_url: article.source_url.clone(),
        note: String::new(),
    };
    ctx.store.write_report(&report)?;

    let outcome = RunOutcome {
        report,
        article: Some(article),
        site,
        selection,
        elapsed: start.elapsed(),
    };

    info!(
        article = %outcome.report.article_path,
        files = outcome.site.files.len(),
        elapsed_ms = outcome.elapsed.as_millis(),
        "run complete"
    );
    progress.done(&outcome);

    Ok(outcome)
}

/// Rebuild the site from the stored history without selecting anything.
#[instrument(skip_all)]
pub fn rebuild_site(config: &AppConfig, store: &StateStore, built_at: DateTime<Utc>) -> Result<SiteBuild> {
    let articles = store.load_articles()?;
    let site_cfg = SiteConfig::from_app(config);
    assemble_site(&site_cfg, &articles, &site_output_dir(config), built_at)
}

/// Run selection only. Nothing is generated or written.
#[instrument(skip_all)]
pub async fn preview_candidate(
    config: &AppConfig,
    store: &StateStore,
    feeds: &dyn FeedSource,
    enricher: &dyn Enricher,
) -> Result<Selection> {
    let snapshot = store.load()?;
    let selector = Selector::new(SelectionConfig::from_app(config), feeds, enricher);
    Ok(selector.select(&snapshot.processed, &snapshot.articles).await)
}
