//! Upton main entry point
//!
//! This is the command-line interface for running a configured scrape and
//! writing the extracted rows as CSV or TSV.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use upton::config::{load_config_with_hash, ScraperConfig};
use upton::output::{write_delimited, IntoRows};
use upton::{extract, Page, Scraper};

/// Upton: a polite scraping toolkit
///
/// Upton discovers instance pages from the index pages in a configuration
/// file, fetches them through an on-disk cache with a fixed delay between
/// live requests, and writes what it extracts as delimited text.
#[derive(Parser, Debug)]
#[command(name = "upton")]
#[command(version = "1.0.0")]
#[command(about = "A polite scraping toolkit", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Extract the text of every element matching this selector, one row per page
    #[arg(long, value_name = "SELECTOR", conflicts_with = "table")]
    list: Option<String>,

    /// Extract the tables matching this selector
    #[arg(long, value_name = "SELECTOR")]
    table: Option<String>,

    /// Write rows to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Separate fields with tabs instead of commas
    #[arg(long)]
    tsv: bool,

    /// Validate config and show what would be scraped without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    let verbose = if config.scraper.verbose {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    setup_logging(verbose, cli.quiet);
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scrape(config, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("upton=info,warn"),
            1 => EnvFilter::new("upton=debug,info"),
            2 => EnvFilter::new("upton=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &ScraperConfig) {
    println!("=== Upton Dry Run ===\n");

    println!("Scraper:");
    println!(
        "  Request delay: {}s",
        config.scraper.request_delay_seconds
    );
    println!("  Cache instances: {}", config.scraper.cache_instances);
    println!("  Cache indexes: {}", config.scraper.cache_indexes);
    println!("  Cache folder: {}", config.cache.folder().display());

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_seconds);
    match config.http.timeout_retries {
        Some(retries) => println!("  Timeout retries: {}", retries),
        None => println!("  Timeout retries: unbounded"),
    }

    println!("\nInstances ({}):", config.instances.len());
    for url in &config.instances {
        println!("  - {}", url);
    }

    println!("\nIndex sources ({}):", config.indexes.len());
    for index in &config.indexes {
        println!("  - {} ({})", index.url, index.selector);
        if index.options.paginated {
            println!(
                "    paginated by '{}' from {} step {}, max pages {:?}",
                index.options.pagination_param,
                index.options.start_index,
                index.options.interval,
                index.options.max_pages
            );
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main scrape operation
async fn handle_scrape(config: ScraperConfig, cli: &Cli) -> anyhow::Result<()> {
    let mut scraper = Scraper::new(config)?;

    let transform: Box<dyn Fn(&Page) -> Vec<Vec<String>>> = match (&cli.list, &cli.table) {
        (Some(selector), _) => {
            let list = extract::list(selector)?;
            Box::new(move |page: &Page| list(page).into_rows())
        }
        (None, Some(selector)) => {
            let table = extract::table(selector)?;
            Box::new(move |page: &Page| table(page))
        }
        (None, None) => Box::new(summary_row),
    };

    let results = scraper.scrape(|page| transform(page)).await?;

    let sep = if cli.tsv { '\t' } else { ',' };
    let rows = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_delimited(&mut BufWriter::new(file), results, sep)?
        }
        None => write_delimited(&mut io::stdout().lock(), results, sep)?,
    };

    let stats = scraper.source().stats();
    tracing::info!(
        "Done: {} row(s), {} live fetch(es), {} cache hit(s), {} failure(s)",
        rows,
        stats.live_fetches,
        stats.cache_hits,
        stats.transient_failures
    );
    Ok(())
}

/// Default row when no extractor is chosen: where the page came from and its size
fn summary_row(page: &Page) -> Vec<Vec<String>> {
    vec![vec![
        page.url().to_string(),
        page.source_url().to_string(),
        page.pagination_index().to_string(),
        page.raw().len().to_string(),
    ]]
}
