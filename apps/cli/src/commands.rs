//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use certsweep_core::{ProgressReporter, RecordTable, enrich_records, resolve_output_path};
use certsweep_shared::{CrawlConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// certsweep — find certification evidence on organization websites.
#[derive(Parser)]
#[command(
    name = "certsweep",
    version,
    about = "Crawl organization websites for certification evidence and enrich the CSV catalogue.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl every listed website and write the enriched CSV.
    Crawl {
        /// Input CSV (must have a "Company website" column).
        input: PathBuf,

        /// Output CSV path (defaults to <input>_certs.csv, timestamped if
        /// it already exists).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Maximum link distance from each seed URL.
        #[arg(long)]
        depth: Option<u32>,

        /// Maximum pages fetched per site.
        #[arg(long)]
        page_limit: Option<usize>,

        /// Concurrent site crawls per batch (0 = auto).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between fetches to the same site, in milliseconds.
        #[arg(long)]
        politeness_ms: Option<u64>,
    },

    /// Print the active certification keyword table.
    Keywords,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "certsweep=info",
        1 => "certsweep=debug",
        _ => "certsweep=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Crawl {
            input,
            out,
            depth,
            page_limit,
            batch_size,
            politeness_ms,
        } => run_crawl(input, out, depth, page_limit, batch_size, politeness_ms).await,
        Command::Keywords => run_keywords(),
        Command::Config { action } => run_config(action),
    }
}

async fn run_crawl(
    input: PathBuf,
    out: Option<PathBuf>,
    depth: Option<u32>,
    page_limit: Option<usize>,
    batch_size: Option<usize>,
    politeness_ms: Option<u64>,
) -> Result<()> {
    let app_config = load_config()?;

    let mut crawl_config = CrawlConfig::from(&app_config);
    if let Some(depth) = depth {
        crawl_config.max_depth = depth;
    }
    if let Some(limit) = page_limit {
        crawl_config.page_limit = limit;
    }
    if let Some(size) = batch_size {
        crawl_config.batch_size = size;
    }
    if let Some(ms) = politeness_ms {
        crawl_config.politeness_delay = std::time::Duration::from_millis(ms);
    }

    let keywords = app_config.keyword_table()?;
    let mut table = RecordTable::load(&input)?;
    let out_path = resolve_output_path(&input, out.as_deref());

    info!(
        input = %input.display(),
        output = %out_path.display(),
        records = table.len(),
        "starting enrichment run"
    );

    let progress = CrawlProgress::new();
    let summary = enrich_records(&mut table, &keywords, &crawl_config, &progress).await?;
    progress.finish();

    table.save(&out_path)?;

    println!(
        "Crawled {} sites ({} skipped, {} failed): {} pages fetched, {} evidence URLs found in {:.1?}.",
        summary.sites_crawled,
        summary.sites_skipped,
        summary.sites_failed,
        summary.pages_fetched,
        summary.evidence_found,
        summary.elapsed,
    );
    println!("Wrote {}", out_path.display());

    Ok(())
}

fn run_keywords() -> Result<()> {
    let app_config = load_config()?;
    let table = app_config.keyword_table()?;

    for (kind, keywords) in table.iter() {
        println!("{}: {}", kind.column(), keywords.join(", "));
    }

    Ok(())
}

fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = init_config()?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress bar
// ---------------------------------------------------------------------------

/// Indicatif-backed progress reporting for crawl runs.
struct CrawlProgress {
    bar: ProgressBar,
}

impl CrawlProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
                .expect("static template"),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for CrawlProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn site_finished(&self, website: &str, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
        self.bar.set_message(website.to_string());
    }
}
