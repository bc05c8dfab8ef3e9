//! Snaplog CLI
//!
//! The `snaplog` command replays the git history of a snapshot file and
//! exports the deduplicated records.
//!
//! ```text
//! snaplog --output events.parquet
//! snaplog --output events.json --include-html
//! snaplog --start-date 2024-01-01 --end-date 2024-12-31 --output 2024.parquet
//! ```
//!
//! The output format follows the extension: `.json`, `.jsonl`/`.ndjson` or
//! `.parquet`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use snaplog_core::{ExportConfig, ExportReport};

#[derive(Parser)]
#[command(name = "snaplog")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rebuild and export the full record history from snapshot commits", long_about = None)]
struct Cli {
    /// Output file path (.json, .jsonl, .ndjson or .parquet)
    #[arg(short, long)]
    output: PathBuf,

    /// Enrich records with detail documents from --html-dir
    #[arg(long)]
    include_html: bool,

    /// Directory containing <event_id>.html detail documents
    #[arg(long, env = "SNAPLOG_HTML_DIR", default_value = snaplog_core::pipeline::DEFAULT_DETAIL_DIR)]
    html_dir: PathBuf,

    /// Keep records from this date on (YYYY-MM-DD, inclusive)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Keep records up to this date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Git work tree holding the snapshot history
    #[arg(long, env = "SNAPLOG_REPO", default_value = ".")]
    repo: PathBuf,

    /// Snapshot file path inside the repository
    #[arg(long, env = "SNAPLOG_SNAPSHOT_FILE", default_value = snaplog_core::pipeline::DEFAULT_SNAPSHOT_FILE)]
    snapshot_file: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn export_config(&self) -> Result<ExportConfig> {
        let mut config = ExportConfig::new(&self.output)
            .with_repo(&self.repo)
            .with_snapshot_file(&self.snapshot_file)
            .with_date_range(self.start_date, self.end_date)
            .context("Invalid date range")?;
        if self.include_html {
            config = config.with_details(&self.html_dir);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    snaplog_core::init_tracing(cli.json, snaplog_core::level_for(cli.verbose));

    let config = cli.export_config()?;
    if let Some(start) = config.date_range.start() {
        info!(start = %start, "start date");
    }
    if let Some(end) = config.date_range.end() {
        info!(end = %end, "end date");
    }

    let report = snaplog_core::run_export(&config)
        .with_context(|| format!("Export to {:?} failed", config.output))?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &ExportReport) {
    let stats = &report.stats;
    println!(
        "Exported {} records to {} ({}, {} bytes)",
        stats.records_written,
        report.output.display(),
        report.format,
        report.bytes_written
    );
    println!(
        "Snapshots: {} read, {} skipped",
        stats.snapshots_read, stats.malformed_snapshots
    );
    println!(
        "Records:   {} seen, {} unique, {} outside date range",
        stats.records_seen, stats.canonical_records, stats.filtered_out
    );
    if stats.details_joined + stats.detail_misses + stats.detail_parse_failures > 0 {
        println!(
            "Details:   {} joined, {} missing, {} unparsable",
            stats.details_joined, stats.detail_misses, stats.detail_parse_failures
        );
    }
    if stats.anomalies() > 0 {
        println!("Anomalies:");
        for (category, count) in stats.anomaly_breakdown() {
            if count > 0 {
                println!("  {category}: {count}");
            }
        }
    }
    println!("Digest:    {}", report.digest);
}
