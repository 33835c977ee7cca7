//! CLI command definitions, routing, rendering, and tracing setup.

use std::fmt::Write as _;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use newslens_core::{ProgressReporter, SearchGroupingPipeline};
use newslens_shared::{
    AppConfig, ArticleRecord, GroupedResult, PipelineConfig, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// NewsLens: news search results, grouped by viewpoint.
#[derive(Parser)]
#[command(
    name = "newslens",
    version,
    about = "Search the web and group the results along a scale inferred by a language model.",
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
    /// Search the web and group the results.
    Search {
        /// Search query.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the grouped result as JSON.
        #[arg(long)]
        json: bool,

        /// Show the detail view of one article from the results.
        #[arg(long, value_name = "URL")]
        show: Option<String>,

        /// Concurrent article fetches (overrides config).
        #[arg(long)]
        workers: Option<usize>,

        /// Per-article fetch timeout in seconds (overrides config).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Grouping model identifier (overrides config).
        #[arg(long)]
        model: Option<String>,
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

/// Options for the `search` command after parsing.
struct SearchOptions {
    query: String,
    json: bool,
    show: Option<String>,
    workers: Option<usize>,
    timeout: Option<u64>,
    model: Option<String>,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newslens=info",
        1 => "newslens=debug",
        _ => "newslens=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
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
    match cli.command {
        Command::Search {
            query,
            json,
            show,
            workers,
            timeout,
            model,
        } => {
            cmd_search(SearchOptions {
                query: query.join(" "),
                json,
                show,
                workers,
                timeout,
                model,
            })
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn article_enriched(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching articles [{current}/{total}]"));
    }

    fn done(&self, _result: &GroupedResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_search(opts: SearchOptions) -> Result<()> {
    let mut config = load_config()?;
    apply_overrides(&mut config, &opts);
    let pipeline_config = PipelineConfig::from_app_config(&config)?;
    let pipeline = SearchGroupingPipeline::new(&pipeline_config)?;

    info!(query = %opts.query, "running search");
    let progress = CliProgress::new();
    let outcome = pipeline.run_with_progress(&opts.query, &progress).await;
    progress.clear();
    let result = outcome?;

    if let Some(url) = opts.show.as_deref() {
        let article = result
            .find_article(url)
            .ok_or_else(|| eyre!("no article with URL '{url}' in the results"))?;
        if opts.json {
            println!("{}", serde_json::to_string_pretty(article)?);
        } else {
            print!("{}", render_detail(article));
        }
        return Ok(());
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_groups(&result));
    }
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, opts: &SearchOptions) {
    if let Some(workers) = opts.workers {
        config.enrichment.workers = workers;
    }
    if let Some(timeout) = opts.timeout {
        config.enrichment.timeout_secs = timeout;
    }
    if let Some(model) = &opts.model {
        config.model.model = model.clone();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// One section per group: the label, then source and title of each article.
fn render_groups(result: &GroupedResult) -> String {
    if result.is_empty() {
        return "No groups found.\n".to_string();
    }

    let mut out = String::new();
    for (i, group) in result.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{} ({})", group.label, group.articles.len());
        let _ = writeln!(out, "{}", "─".repeat(group.label.chars().count().max(3)));
        for article in &group.articles {
            let _ = writeln!(out, "  {}: {}", article.source_name, article.title);
            let _ = writeln!(out, "    {}", article.url);
        }
    }
    out
}

/// Title, summary (or description) and link of one article.
fn render_detail(article: &ArticleRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "{}", article.source_name);
    out.push('\n');
    let _ = writeln!(out, "{}", article.effective_text());
    out.push('\n');
    let _ = writeln!(out, "Link: {}", article.url);
    out
}
