//! Record enrichment pipeline: CSV in → batched site crawls → CSV out.
//!
//! This crate provides:
//! - [`records`] — the CSV record table and output-path resolution
//! - [`orchestrator`] — batched concurrent site crawls with result merging

pub mod orchestrator;
pub mod records;

pub use orchestrator::{CrawlSummary, ProgressReporter, SilentProgress, enrich_records};
pub use records::{RecordTable, WEBSITE_COLUMN, resolve_output_path};
