//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use shopgraph_core::input::read_pages;
use shopgraph_core::pipeline::{
    IngestOptions, IngestReport, IngestionPipeline, PageOutcome, PageStatus, ProgressReporter,
};
use shopgraph_entities::EntityBuilder;
use shopgraph_extract::classify;
use shopgraph_shared::{
    AppConfig, PageType, init_config, load_config, load_config_from, resolve_api_key,
};
use shopgraph_store::{DryRunStore, EntityStore, HttpEntityStore};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// shopgraph: turn crawled shop pages into knowledge-graph entities.
#[derive(Parser)]
#[command(
    name = "shopgraph",
    version,
    about = "Map crawled e-commerce pages to JSON-LD entities and load them into a graph store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.shopgraph/shopgraph.toml.
    #[arg(long, global = true, env = "SHOPGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Ingest a JSON-lines file of crawled pages into the graph store.
    Ingest {
        /// Input file, one page record per line.
        file: PathBuf,

        /// Print documents as JSON lines instead of submitting them.
        #[arg(long)]
        dry_run: bool,

        /// Keep existing store contents (skip the delete-all step).
        #[arg(long)]
        no_cleanup: bool,

        /// Maximum in-flight submissions (overrides [pipeline].concurrency).
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Write the run report as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show how a URL would be classified and which entity URI it maps to.
    Classify {
        /// Crawled page URL.
        url: String,
    },

    /// Find stored entities similar to the page at a URL.
    Query {
        /// Seed page URL.
        seed_url: String,

        /// Number of results to return.
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },

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
///
/// Logs go to stderr so dry-run output on stdout stays machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "shopgraph=info",
        1 => "shopgraph=debug",
        _ => "shopgraph=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Ingest {
            file,
            dry_run,
            no_cleanup,
            concurrency,
            report,
        } => {
            let config = resolve_config(config_path)?;
            let flags = IngestFlags {
                dry_run,
                no_cleanup,
                concurrency,
                report,
            };
            cmd_ingest(&config, &file, flags).await
        }
        Command::Classify { url } => cmd_classify(&resolve_config(config_path)?, &url),
        Command::Query { seed_url, top_k } => {
            cmd_query(&resolve_config(config_path)?, &seed_url, top_k).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&resolve_config(config_path)?),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// ingest
// ---------------------------------------------------------------------------

struct IngestFlags {
    dry_run: bool,
    no_cleanup: bool,
    concurrency: Option<usize>,
    report: Option<PathBuf>,
}

async fn cmd_ingest(config: &AppConfig, file: &Path, flags: IngestFlags) -> Result<()> {
    let mut options = IngestOptions::from(&config.pipeline);
    if flags.no_cleanup {
        options.cleanup = false;
    }
    if let Some(n) = flags.concurrency {
        options.concurrency = n.max(1);
    }

    let pipeline = IngestionPipeline::new(&config.mapping, options)?;
    let batch = read_pages(file)?;

    info!(
        file = %file.display(),
        pages = batch.pages.len(),
        dry_run = flags.dry_run,
        "ingesting pages"
    );

    let reporter = CliProgress::new();
    let result = if flags.dry_run {
        pipeline
            .run(Arc::new(DryRunStore::stdout()), batch, &reporter)
            .await
    } else {
        let api_key = resolve_api_key(&config.store);
        let store = HttpEntityStore::connect(&config.store, api_key.as_deref())?;
        pipeline.run(Arc::new(store), batch, &reporter).await
    };
    reporter.spinner.finish_and_clear();
    let report = result?;

    if let Some(path) = &flags.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).map_err(|e| eyre!("cannot write report to {}: {e}", path.display()))?;
    }

    // Dry-run documents own stdout; the summary moves to stderr.
    if flags.dry_run {
        print_summary(&mut std::io::stderr(), &report)?;
    } else {
        print_summary(&mut std::io::stdout(), &report)?;
    }

    if report.failed() > 0 {
        return Err(eyre!(
            "{} of {} submissions failed",
            report.failed(),
            report.attempted()
        ));
    }
    Ok(())
}

fn print_summary(out: &mut dyn Write, report: &IngestReport) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  Ingestion run complete")?;
    writeln!(out, "  Run:       {}", report.run_id)?;
    writeln!(out, "  Submitted: {}", report.submitted())?;
    writeln!(out, "  Skipped:   {}", report.skipped())?;
    writeln!(out, "  Failed:    {}", report.failed())?;
    writeln!(out, "  Malformed: {}", report.malformed_lines)?;
    writeln!(out, "  Time:      {:.1}s", report.elapsed.as_secs_f64())?;

    for outcome in &report.outcomes {
        if let PageStatus::Failed { uri, error } = &outcome.status {
            writeln!(out, "  ! {} ({uri}): {error}", outcome.url)?;
        }
    }
    writeln!(out)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_done(&self, outcome: &PageOutcome, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {} {}", outcome.page_type, outcome.url));
    }

    fn done(&self, _report: &IngestReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// classify / query
// ---------------------------------------------------------------------------

fn cmd_classify(config: &AppConfig, url: &str) -> Result<()> {
    config.mapping.validate()?;
    let page_type = classify(url);

    println!("  Page type:  {page_type}");
    if page_type == PageType::Other {
        println!("  (not ingested)");
        return Ok(());
    }

    let (published, uri) = EntityBuilder::new(&config.mapping).locate(url);
    println!("  Published:  {published}");
    println!("  Entity URI: {uri}");
    Ok(())
}

async fn cmd_query(config: &AppConfig, seed_url: &str, top_k: usize) -> Result<()> {
    Url::parse(seed_url).map_err(|e| eyre!("invalid URL '{seed_url}': {e}"))?;
    if top_k == 0 {
        return Err(eyre!("--top-k must be at least 1"));
    }

    let api_key = resolve_api_key(&config.store);
    let store = HttpEntityStore::connect(&config.store, api_key.as_deref())?;

    info!(seed_url, top_k, "querying similar entities");
    let result = store.similar_entities(seed_url, top_k).await;
    store.close().await?;
    let hits = result?;

    if hits.is_empty() {
        println!("No similar entities found.");
        return Ok(());
    }
    for hit in hits {
        println!("{:>6.3}  {}  {}", hit.score, hit.id, hit.text);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
