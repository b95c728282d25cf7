//! Shared types, error model, configuration and text utilities for Curator.
//!
//! This crate is the foundation depended on by all other Curator crates.
//! It provides:
//! - [`CuratorError`], the unified error type
//! - Domain types ([`FeedEntry`], [`Article`], [`RunReport`])
//! - Configuration ([`AppConfig`], config loading)
//! - URL canonicalization ([`normalize_url`]) and title similarity
//!   ([`tokenize`], [`jaccard`])

pub mod canonical;
pub mod config;
pub mod error;
pub mod similarity;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use canonical::normalize_url;
pub use config::{
    AdsSection, AppConfig, FeedsSection, GenerationSection, RelatedSection, SafetySection,
    SelectionSection, SelectionStrategy, SiteSection, StateSection, api_key, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_config_path,
};
pub use error::{CuratorError, Result};
pub use similarity::{jaccard, title_similarity, tokenize};
pub use types::{Article, FeedEntry, ImageKind, RunReport, momentum};
