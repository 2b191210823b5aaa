//! Batch orchestration: many site crawls, one record table.
//!
//! The orchestrator is the only writer of the record table. Site crawls run
//! as spawned tasks in bounded batches over one shared connection pool;
//! each task returns an immutable findings value that is merged into its
//! row single-threaded after the task completes. One organization's
//! failure never aborts the batch or the run.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use certsweep_crawler::{SiteCrawler, build_client, urlnorm};
use certsweep_shared::{CertsweepError, CrawlConfig, KeywordTable, Result};

use crate::records::RecordTable;

/// Most site crawls allowed in flight at once.
const MAX_BATCH_SIZE: usize = 10;

/// Accounting for one orchestrator run.
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Rows with a validated website that were crawled to completion.
    pub sites_crawled: usize,
    /// Rows skipped for a missing or invalid website.
    pub sites_skipped: usize,
    /// Rows whose crawl task died; their records are unmodified.
    pub sites_failed: usize,
    /// Total pages fetched across all sites.
    pub pages_fetched: usize,
    /// Total evidence URLs recorded across all sites.
    pub evidence_found: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Progress callback for reporting orchestrator status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one site's crawl finishes (successfully or not).
    fn site_finished(&self, website: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn site_finished(&self, _website: &str, _current: usize, _total: usize) {}
}

/// Crawl every record with a valid website and merge the evidence found
/// back into the table.
#[instrument(skip_all, fields(records = table.len()))]
pub async fn enrich_records(
    table: &mut RecordTable,
    keywords: &KeywordTable,
    config: &CrawlConfig,
    progress: &dyn ProgressReporter,
) -> Result<CrawlSummary> {
    let start = Instant::now();
    let mut summary = CrawlSummary::default();

    // Filter to rows whose website validates; the rest stay untouched.
    let mut eligible: Vec<(usize, String)> = Vec::new();
    for row in 0..table.len() {
        let website = table.website(row);
        if website.is_empty() {
            summary.sites_skipped += 1;
            continue;
        }
        match urlnorm::validate(website) {
            Ok(_) => eligible.push((row, website.to_string())),
            Err(e) => {
                debug!(row, website, error = %e, "website rejected, skipping record");
                summary.sites_skipped += 1;
            }
        }
    }

    let total = eligible.len();
    let batch_size = effective_batch_size(config.batch_size, total);
    info!(
        eligible = total,
        skipped = summary.sites_skipped,
        batch_size,
        "starting crawl run"
    );
    progress.phase(&format!("Crawling {total} sites"));

    // One client = one shared connection pool across every site crawl.
    let client = build_client(config)?;
    let mut done = 0usize;

    for batch in eligible.chunks(batch_size) {
        let mut handles = Vec::new();

        for (row, website) in batch {
            let crawler =
                SiteCrawler::with_client(client.clone(), keywords.clone(), config.clone());
            let website = website.clone();
            handles.push((
                *row,
                website.clone(),
                tokio::spawn(async move { crawler.crawl(&website).await }),
            ));
        }

        // Await the whole batch before starting the next one; merge results
        // into the table here, single-threaded.
        for (row, website, handle) in handles {
            match handle.await {
                Ok(outcome) => {
                    summary.pages_fetched += outcome.pages_fetched;
                    summary.evidence_found += outcome.findings.evidence_count();
                    table.merge_findings(row, &outcome.findings);
                    summary.sites_crawled += 1;
                }
                Err(e) => {
                    let err = CertsweepError::Task(e.to_string());
                    warn!(row, website, error = %err, "crawl task failed, record left unmodified");
                    summary.sites_failed += 1;
                }
            }
            done += 1;
            progress.site_finished(&website, done, total);
        }
    }

    summary.elapsed = start.elapsed();
    info!(
        sites_crawled = summary.sites_crawled,
        sites_skipped = summary.sites_skipped,
        sites_failed = summary.sites_failed,
        pages_fetched = summary.pages_fetched,
        evidence_found = summary.evidence_found,
        elapsed_ms = summary.elapsed.as_millis(),
        "crawl run complete"
    );

    Ok(summary)
}

/// Batch size: explicit configuration wins, otherwise `min(10, ceil(n/4))`
/// with a floor of 1.
fn effective_batch_size(configured: usize, total: usize) -> usize {
    if configured > 0 {
        configured
    } else {
        total.div_ceil(4).clamp(1, MAX_BATCH_SIZE)
    }
}
