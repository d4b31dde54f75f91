//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use stacforge_core::{
    BatchOptions, BatchSummary, Generator, GeneratorCore, ProgressReporter, RecordOutcome,
    run_batch,
};
use stacforge_describer::CollectionDescriptions;
use stacforge_shared::{
    AppConfig, GeneratorType, OutputRecord, StacForgeError, init_config, load_config, load_config_from,
};

/// Upper bound for `--jobs`.
const MAX_JOBS: usize = 1024;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// stacforge: metadata records from hierarchical dataset descriptions.
#[derive(Parser)]
#[command(
    name = "stacforge",
    version,
    about = "Generate asset, item and collection records from hierarchical dataset descriptions.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.stacforge/stacforge.toml).
    #[arg(long, env = "STACFORGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
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
    /// Print the merged description governing a dataset path.
    Describe {
        /// Dataset path or URI.
        path: String,

        /// Description directory (overrides `description_root`).
        #[arg(long)]
        descriptions: Option<PathBuf>,
    },

    /// Generate records for dataset identifiers.
    Generate {
        /// Record type: asset, item or collection.
        record_type: GeneratorType,

        /// Dataset identifiers.
        uris: Vec<String>,

        /// Read further identifiers from a file, one per line.
        #[arg(long)]
        from: Option<PathBuf>,

        /// Identifiers processed concurrently.
        #[arg(
            short,
            long,
            default_value = "1",
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new()
                .range(1..=MAX_JOBS as u64),
        )]
        jobs: usize,

        /// Skip identifiers no description covers instead of stopping.
        #[arg(long)]
        skip_undescribed: bool,

        /// Description directory (overrides `description_root`).
        #[arg(long)]
        descriptions: Option<PathBuf>,
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

/// Initialize tracing based on CLI flags. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "stacforge=info",
        1 => "stacforge=debug",
        _ => "stacforge=trace",
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
    match cli.command {
        Command::Describe { path, descriptions } => {
            let config = resolve_config(cli.config.as_deref(), descriptions)?;
            cmd_describe(&config, &path).await
        }
        Command::Generate {
            record_type,
            uris,
            from,
            jobs,
            skip_undescribed,
            descriptions,
        } => {
            let config = resolve_config(cli.config.as_deref(), descriptions)?;
            let options = BatchOptions { skip_undescribed };
            cmd_generate(&config, record_type, uris, from.as_deref(), jobs, options).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
        },
    }
}

/// Config file values, with CLI overrides applied.
fn resolve_config(path: Option<&Path>, descriptions: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(dir) = descriptions {
        config.description_root = dir.display().to_string();
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

async fn cmd_describe(config: &AppConfig, path: &str) -> Result<()> {
    let descriptions =
        CollectionDescriptions::from_root(&config.description_root, config.cache_capacity)?;

    let files = descriptions.resolve_files(path)?;
    let description = descriptions.get_description(path)?;

    for file in &files {
        println!("# {file}");
    }
    print!("{}", serde_yaml::to_string(description.as_ref())?);
    Ok(())
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: &AppConfig,
    record_type: GeneratorType,
    uris: Vec<String>,
    from: Option<&Path>,
    jobs: usize,
    options: BatchOptions,
) -> Result<()> {
    let mut identifiers = uris;
    if let Some(path) = from {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("cannot read identifiers from '{}': {e}", path.display()))?;
        identifiers.extend(parse_identifiers(&content));
    }
    if identifiers.is_empty() {
        return Err(eyre!("no identifiers given: pass URIS or --from FILE"));
    }

    let core = GeneratorCore::from_config(config)?;
    let generator = Arc::new(Generator::for_type(record_type, core));
    let progress = CliProgress::new(identifiers.len());

    info!(
        record_type = %record_type,
        identifiers = identifiers.len(),
        jobs,
        "starting generation"
    );

    let summary = if jobs <= 1 {
        let generator = Arc::clone(&generator);
        let progress = progress.clone();
        tokio::task::spawn_blocking(move || {
            run_batch(&generator, &identifiers, options, &progress)
        })
        .await??
    } else {
        let summary =
            generate_concurrently(&generator, identifiers, jobs, options, &progress).await?;
        progress.done(&summary);
        summary
    };

    println!();
    println!("  {record_type} generation finished");
    println!("  Generated: {}", summary.generated);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Failed:    {}", summary.failed);
    println!();

    Ok(())
}

/// Non-empty lines that are not `#` comments.
fn parse_identifiers(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
}

/// Process identifiers on the blocking pool, at most `jobs` at a time, then
/// flush buffering outputs once.
async fn generate_concurrently(
    generator: &Arc<Generator>,
    identifiers: Vec<String>,
    jobs: usize,
    options: BatchOptions,
    progress: &dyn ProgressReporter,
) -> Result<BatchSummary> {
    let (summary, fatal) =
        process_concurrently(generator, identifiers, jobs, options, progress).await?;
    if let Some(e) = fatal {
        return Err(e.into());
    }

    let flushing = Arc::clone(generator);
    tokio::task::spawn_blocking(move || flushing.finished()).await??;
    Ok(summary)
}

/// Run `process` for each identifier. After a fatal error nothing new is
/// started, but records already in flight are waited for and counted before
/// the error is handed back.
async fn process_concurrently(
    generator: &Arc<Generator>,
    identifiers: Vec<String>,
    jobs: usize,
    options: BatchOptions,
    progress: &dyn ProgressReporter,
) -> Result<(BatchSummary, Option<StacForgeError>)> {
    let semaphore = Arc::new(Semaphore::new(jobs.clamp(1, MAX_JOBS)));
    let mut tasks = JoinSet::new();
    let mut summary = BatchSummary::default();
    let mut fatal = None;

    for uri in identifiers {
        if fatal.is_some() {
            break;
        }
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let generator = Arc::clone(generator);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = generator.process(&uri);
            (uri, result)
        });

        while let Some(joined) = tasks.try_join_next() {
            let (uri, result) = joined?;
            account(&mut summary, &mut fatal, &uri, result, options, progress);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (uri, result) = joined?;
        account(&mut summary, &mut fatal, &uri, result, options, progress);
    }

    Ok((summary, fatal))
}

/// Count one result, keeping the first fatal error.
fn account(
    summary: &mut BatchSummary,
    fatal: &mut Option<StacForgeError>,
    uri: &str,
    result: stacforge_shared::Result<OutputRecord>,
    options: BatchOptions,
    progress: &dyn ProgressReporter,
) {
    match summary.record(uri, result, options) {
        Ok(outcome) => progress.record_done(uri, outcome),
        Err(e) if fatal.is_none() => *fatal = Some(e),
        Err(e) => warn!(uri, error = %e, "further fatal error while stopping"),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
#[derive(Clone)]
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn record_done(&self, uri: &str, outcome: RecordOutcome) {
        self.bar.inc(1);
        match outcome {
            RecordOutcome::Generated => self.bar.set_message(uri.to_string()),
            RecordOutcome::Skipped => self.bar.set_message(format!("skipped {uri}")),
            RecordOutcome::Failed => self.bar.set_message(format!("failed {uri}")),
        }
    }

    fn done(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path, None)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
