//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use harmonizer_core::{
    HarmonizeConfig, ProgressReporter, RunSummary, build_index, harmonize, validator_from_config,
    write_run_report,
};
use harmonizer_shared::{
    AppConfig, RecordOutcome, RecordPolicy, VariantKind, init_config, load_config,
    load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Harmonizer: merge the publisher and archival biography corpora.
#[derive(Parser)]
#[command(
    name = "harmonizer",
    version,
    about = "Merge primary and secondary biographical record corpora into harmonized records.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.harmonizer/harmonizer.toml).
    #[arg(long, global = true, env = "HARMONIZER_CONFIG")]
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

/// Corpus locations; each flag overrides the config file.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct CorpusArgs {
    /// Primary (publisher) corpus directory.
    #[arg(long)]
    pub primary: Option<PathBuf>,

    /// Secondary (archival) corpus directory (can be specified multiple times).
    #[arg(long)]
    pub secondary: Vec<PathBuf>,

    /// File-name alias table (key=value lines).
    #[arg(long)]
    pub alias_table: Option<PathBuf>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the harmonization over the primary corpus.
    Run {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Output directory for merged records.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Continue with an empty overlay when a record has no overlay file.
        #[arg(long)]
        allow_missing_overlay: bool,

        /// Write a JSON run report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Build the secondary index and print its report.
    Index {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Show the sources indexed under these keys.
        #[arg(long)]
        lookup: Vec<String>,
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
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "harmonizer=info",
        1 => "harmonizer=debug",
        _ => "harmonizer=trace",
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
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run {
            corpus,
            out,
            allow_missing_overlay,
            report,
        } => cmd_run(
            config_path,
            &corpus,
            out.as_deref(),
            allow_missing_overlay,
            report.as_deref(),
        ),
        Command::Index { corpus, lookup } => cmd_index(config_path, &corpus, &lookup),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Config resolution
// ---------------------------------------------------------------------------

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Apply CLI overrides on top of the file config.
fn apply_overrides(
    mut config: AppConfig,
    corpus: &CorpusArgs,
    out: Option<&Path>,
    allow_missing_overlay: bool,
) -> AppConfig {
    let as_string = |p: &Path| p.to_string_lossy().into_owned();
    if let Some(primary) = &corpus.primary {
        config.corpus.primary_dir = Some(as_string(primary));
    }
    if !corpus.secondary.is_empty() {
        config.corpus.secondary_dirs = corpus.secondary.iter().map(|p| as_string(p)).collect();
    }
    if let Some(alias_table) = &corpus.alias_table {
        config.corpus.alias_table = Some(as_string(alias_table));
    }
    if let Some(out) = out {
        config.corpus.output_dir = Some(as_string(out));
    }
    if allow_missing_overlay {
        config.records.allow_missing_overlay = true;
    }
    config
}

/// Turn the resolved config into run settings.
fn harmonize_config(config: &AppConfig) -> Result<HarmonizeConfig> {
    let primary_dir = config
        .corpus
        .primary_dir
        .as_deref()
        .ok_or_else(|| eyre!("no primary corpus: pass --primary or set corpus.primary_dir"))?;
    let output_dir = config
        .corpus
        .output_dir
        .as_deref()
        .ok_or_else(|| eyre!("no output directory: pass --out or set corpus.output_dir"))?;

    Ok(HarmonizeConfig {
        primary_dir: PathBuf::from(primary_dir),
        secondary_dirs: config.corpus.secondary_dirs.iter().map(PathBuf::from).collect(),
        output_dir: PathBuf::from(output_dir),
        alias_table: config.corpus.alias_table.as_ref().map(PathBuf::from),
        schema_href: config.output.schema_href.clone(),
        policy: RecordPolicy::from(config),
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_run(
    config_path: Option<&Path>,
    corpus: &CorpusArgs,
    out: Option<&Path>,
    allow_missing_overlay: bool,
    report: Option<&Path>,
) -> Result<()> {
    let config = apply_overrides(load(config_path)?, corpus, out, allow_missing_overlay);
    let run_config = harmonize_config(&config)?;
    let validator = validator_from_config(&config.validation);

    info!(
        primary = %run_config.primary_dir.display(),
        secondary = run_config.secondary_dirs.len(),
        output = %run_config.output_dir.display(),
        validator = validator.name(),
        "starting run"
    );

    let reporter = CliProgress::new();
    let summary = harmonize(&run_config, validator.as_ref(), &reporter)?;

    if let Some(path) = report {
        write_run_report(path, &summary)?;
        info!(path = %path.display(), "run report written");
    }

    print_summary(&summary);
    Ok(())
}

fn cmd_index(config_path: Option<&Path>, corpus: &CorpusArgs, lookup: &[String]) -> Result<()> {
    let config = apply_overrides(load(config_path)?, corpus, None, false);
    let secondary_dirs: Vec<PathBuf> = config.corpus.secondary_dirs.iter().map(PathBuf::from).collect();
    let alias_table = config.corpus.alias_table.as_ref().map(PathBuf::from);

    let (index, report) = build_index(
        &secondary_dirs,
        alias_table.as_deref(),
        &config.markup.presentational_tags,
    )?;

    println!();
    println!("  Secondary index built");
    println!("  Files:        {}", report.files_scanned);
    println!(
        "  Indexed:      {} ({} print, {} online)",
        report.indexed, report.print_sources, report.online_sources
    );
    println!("  Keys:         {}", report.keys);
    println!("  Unparsable:   {}", report.unparsable);
    println!("  Unclassified: {}", report.unclassified);
    println!("  No identity:  {}", report.unresolved_identity);
    println!("  Collisions:   {}", report.collisions);
    for (strategy, count) in &report.resolved_by {
        println!("  via {strategy}: {count}");
    }

    for key in lookup {
        let normalized = index.normalize_key(key);
        println!();
        match index.lookup(&[key.as_str(), normalized.as_str()]) {
            Some(entry) => {
                for kind in [VariantKind::Print, VariantKind::Online] {
                    let path = entry
                        .get(kind)
                        .map(|s| s.path.display().to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("  {key} [{kind}]: {path}");
                }
            }
            None => println!("  {key}: not indexed"),
        }
    }
    println!();
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    println!();
    println!("  Harmonization complete");
    println!("  Run:              {}", summary.run_id);
    println!("  Print only:       {}", stats.print_only);
    println!("  Online only:      {}", stats.online_only);
    println!("  Print and online: {}", stats.print_and_online);
    println!("  Cross-references: {}", stats.skipped_cross_reference);
    println!("  Mention only:     {}", stats.skipped_mention_only);
    println!("  Excluded:         {}", stats.excluded);
    println!("  Already done:     {}", stats.already_processed);
    println!("  Failed:           {}", stats.failed);
    println!("  Invalid schema:   {}", stats.validation_failures);
    println!("  Time:             {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    println!();
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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

    fn record_done(&self, name: &str, outcome: RecordOutcome, current: usize, total: usize) {
        let status = match outcome {
            RecordOutcome::Merged(_) => "merged",
            RecordOutcome::Skipped(_) => "skipped",
            RecordOutcome::Failed => "failed",
        };
        self.spinner
            .set_message(format!("Merging [{current}/{total}] {name} ({status})"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
