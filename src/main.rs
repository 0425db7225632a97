//! Sumi-Audit main entry point
//!
//! This is the command-line interface for the Sumi-Audit technical-SEO crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_audit::config::{load_config_with_hash, Config, OutputFormat};
use sumi_audit::output::write_report;
use sumi_audit::{AnalysisRequest, Auditor};
use tracing_subscriber::EnvFilter;

/// Sumi-Audit: a bounded technical-SEO crawler
///
/// Sumi-Audit crawls one site breadth-first from a root URL, checks
/// robots.txt, sitemaps, on-page signals, duplicates and link integrity,
/// and prints a scored report with prioritized recommendations.
#[derive(Parser, Debug)]
#[command(name = "sumi-audit")]
#[command(version)]
#[command(about = "A bounded technical-SEO crawler", long_about = None)]
struct Cli {
    /// Root URL of the site to audit
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Maximum link depth from the root URL
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages fetched
    #[arg(long)]
    max_pages: Option<usize>,

    /// Minimum similarity for reported near-duplicate pairs (0.0-1.0)
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Skip pairwise content similarity
    #[arg(long)]
    no_similarity: bool,

    /// Skip redirect chain resolution
    #[arg(long)]
    no_redirects: bool,

    /// Skip broken link reporting
    #[arg(long)]
    no_broken_links: bool,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report to this file instead of standard output
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
        if let Some(pages) = self.max_pages {
            config.crawler.max_pages = pages;
        }
        if let Some(threshold) = self.similarity_threshold {
            config.content.similarity_threshold = threshold;
        }
        if self.no_similarity {
            config.content.check_similarity = false;
        }
        if self.no_redirects {
            config.links.check_redirects = false;
        }
        if self.no_broken_links {
            config.links.check_broken_links = false;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(path) = &self.output {
            config.output.path = Some(path.display().to_string());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so a report on stdout stays clean
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);

    let request = AnalysisRequest::from_config(cli.url.clone(), &config);
    let format = config.output.format;
    let output_path = config.output.path.clone();

    let auditor = Auditor::from_config(config).context("invalid options")?;
    let report = auditor.analyze(&request).await?;

    tracing::info!(
        "Audit complete: score {}/100, {} issues",
        report.score,
        report.issues.len()
    );

    write_report(&report, format, output_path.as_deref().map(Path::new))
        .context("failed to write report")?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_audit=info,warn"),
            1 => EnvFilter::new("sumi_audit=debug,info"),
            2 => EnvFilter::new("sumi_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
