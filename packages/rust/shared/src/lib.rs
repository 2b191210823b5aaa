//! Shared types, error model, and configuration for certsweep.
//!
//! This crate is the foundation depended on by all other certsweep crates.
//! It provides:
//! - [`CertsweepError`] — the unified error type
//! - Domain types ([`CertKind`], [`KeywordTable`], [`SiteFindings`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, DefaultsConfig, FetchConfig, LimitsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CertsweepError, Result};
pub use types::{CertKind, KeywordTable, SiteFindings, SiteOutcome};
