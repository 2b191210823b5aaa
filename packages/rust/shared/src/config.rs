//! Application configuration for certsweep.
//!
//! User config lives at `~/.certsweep/certsweep.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CertsweepError, Result};
use crate::types::{CertKind, KeywordTable};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "certsweep.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".certsweep";

// ---------------------------------------------------------------------------
// Config structs (matching certsweep.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Crawl defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP fetch behavior.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Resource caps for content extraction.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Per-kind keyword overrides, keyed by kind (`asc`, `bap`, `fos`,
    /// `fip`, `marintrust`). Kinds not listed keep the built-in keywords.
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<String>>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum link distance from the seed URL.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum pages fetched per site.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Pause before each fetch to the same site, in milliseconds.
    #[serde(default = "default_politeness_ms")]
    pub politeness_ms: u64,

    /// Concurrent site crawls per batch. 0 means auto
    /// (`min(10, ceil(sites / 4))`).
    #[serde(default)]
    pub batch_size: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            page_limit: default_page_limit(),
            politeness_ms: default_politeness_ms(),
            batch_size: 0,
        }
    }
}

fn default_max_depth() -> u32 {
    2
}
fn default_page_limit() -> usize {
    50
}
fn default_politeness_ms() -> u64 {
    500
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// TCP connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Total per-request timeout, in seconds.
    #[serde(default = "default_total_timeout_secs")]
    pub total_timeout_secs: u64,

    /// Retry attempts for 429/503 and transport errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Idle connections kept per host in the shared pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            total_timeout_secs: default_total_timeout_secs(),
            max_retries: default_max_retries(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_total_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_pool_size() -> usize {
    20
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// PDF bodies above this size are not scanned.
    #[serde(default = "default_pdf_max_bytes")]
    pub pdf_max_bytes: usize,

    /// At most this many PDF pages are extracted.
    #[serde(default = "default_pdf_max_pages")]
    pub pdf_max_pages: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            pdf_max_bytes: default_pdf_max_bytes(),
            pdf_max_pages: default_pdf_max_pages(),
        }
    }
}

fn default_pdf_max_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_pdf_max_pages() -> usize {
    50
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum link distance from the seed URL.
    pub max_depth: u32,
    /// Maximum pages fetched per site.
    pub page_limit: usize,
    /// Pause before each fetch to the same site.
    pub politeness_delay: Duration,
    /// Concurrent site crawls per batch. 0 means auto.
    pub batch_size: usize,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total per-request timeout.
    pub total_timeout: Duration,
    /// Retry attempts for 429/503 and transport errors.
    pub max_retries: u32,
    /// Idle connections kept per host in the shared pool.
    pub pool_size: usize,
    /// PDF bodies above this size are not scanned.
    pub pdf_max_bytes: usize,
    /// At most this many PDF pages are extracted.
    pub pdf_max_pages: usize,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_depth: config.defaults.max_depth,
            page_limit: config.defaults.page_limit,
            politeness_delay: Duration::from_millis(config.defaults.politeness_ms),
            batch_size: config.defaults.batch_size,
            connect_timeout: Duration::from_secs(config.fetch.connect_timeout_secs),
            total_timeout: Duration::from_secs(config.fetch.total_timeout_secs),
            max_retries: config.fetch.max_retries,
            pool_size: config.fetch.pool_size,
            pdf_max_bytes: config.limits.pdf_max_bytes,
            pdf_max_pages: config.limits.pdf_max_pages,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl AppConfig {
    /// Build the keyword table: built-in sets plus any `[keywords]`
    /// overrides. Unknown kind keys fail loudly rather than silently
    /// scanning with the wrong table.
    pub fn keyword_table(&self) -> Result<KeywordTable> {
        let mut table = KeywordTable::builtin();
        for (key, words) in &self.keywords {
            let kind = CertKind::ALL
                .iter()
                .copied()
                .find(|k| k.key() == key.as_str())
                .ok_or_else(|| {
                    CertsweepError::config(format!("unknown certification kind in [keywords]: {key}"))
                })?;
            table.override_kind(kind, words.clone());
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.certsweep/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CertsweepError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.certsweep/certsweep.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CertsweepError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CertsweepError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CertsweepError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CertsweepError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CertsweepError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_depth"));
        assert!(toml_str.contains("pdf_max_bytes"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_depth, 2);
        assert_eq!(parsed.defaults.page_limit, 50);
        assert_eq!(parsed.fetch.max_retries, 3);
        assert_eq!(parsed.limits.pdf_max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn crawl_config_from_app_config() {
        let app = AppConfig::default();
        let crawl = CrawlConfig::from(&app);
        assert_eq!(crawl.max_depth, 2);
        assert_eq!(crawl.politeness_delay, Duration::from_millis(500));
        assert_eq!(crawl.connect_timeout, Duration::from_secs(10));
        assert_eq!(crawl.total_timeout, Duration::from_secs(30));
        assert_eq!(crawl.pool_size, 20);
        assert_eq!(crawl.batch_size, 0);
    }

    #[test]
    fn keyword_overrides_apply() {
        let toml_str = r#"
[keywords]
fip = ["Fishery Improvement"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let table = config.keyword_table().expect("table");
        assert_eq!(
            table.keywords(crate::types::CertKind::Fip),
            ["fishery improvement"]
        );
        // Unlisted kinds keep built-ins
        assert!(!table.keywords(crate::types::CertKind::Asc).is_empty());
    }

    #[test]
    fn unknown_keyword_kind_rejected() {
        let toml_str = r#"
[keywords]
msc = ["Marine Stewardship Council"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let result = config.keyword_table();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("msc"));
    }
}
