//! End-to-end batch run: index → per-record merge → validate → write.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use harmonizer_index::{
    FileKeyNormalizer, IndexBuilder, IndexReport, SecondaryCorpusIndex, is_cross_reference_file,
    scan_corpus,
};
use harmonizer_markup::{read_document, serialize_document, strip_namespaces};
use harmonizer_overlay::{Overlay, read_overlay};
use harmonizer_shared::vocab::attrs;
use harmonizer_shared::{
    HarmonizerError, RecordOutcome, RecordPolicy, Result, RunId, RunStats, SkipReason,
};

use crate::merger::{RecordMerger, prefilter};
use crate::output::{ensure_output_dir, write_atomic};
use crate::print_variant::PrintVariantExporter;
use crate::validation::SchemaValidator;

/// Resolved settings for one harmonization run.
#[derive(Debug, Clone)]
pub struct HarmonizeConfig {
    /// Primary (publisher) corpus directory.
    pub primary_dir: PathBuf,
    /// Secondary (archival) corpus directories.
    pub secondary_dirs: Vec<PathBuf>,
    /// Where merged records and print siblings are written.
    pub output_dir: PathBuf,
    /// Optional file-name alias table.
    pub alias_table: Option<PathBuf>,
    /// Schema reference for the document header.
    pub schema_href: String,
    pub policy: RecordPolicy,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub stats: RunStats,
    pub index: IndexReport,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each primary record.
    fn record_done(&self, name: &str, outcome: RecordOutcome, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_done(&self, _name: &str, _outcome: RecordOutcome, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Build the secondary index over `secondary_dirs`.
pub fn build_index(
    secondary_dirs: &[PathBuf],
    alias_table: Option<&Path>,
    presentational_tags: &[String],
) -> Result<(SecondaryCorpusIndex, IndexReport)> {
    let keys = match alias_table {
        Some(path) => FileKeyNormalizer::from_alias_table(path)?,
        None => FileKeyNormalizer::new(),
    };
    IndexBuilder::new(secondary_dirs.to_vec())
        .with_keys(keys)
        .with_presentational_tags(presentational_tags.to_vec())
        .build()
}

/// Run the full harmonization.
///
/// 1. Build the secondary index
/// 2. Walk the primary corpus
/// 3. Merge, validate, and write each record
#[instrument(skip_all, fields(primary = %config.primary_dir.display()))]
pub fn harmonize(
    config: &HarmonizeConfig,
    validator: &dyn SchemaValidator,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let started_at = Utc::now();
    let run_id = RunId::new();
    info!(%run_id, "starting harmonization run");

    progress.phase("Indexing secondary corpus");
    let (index, index_report) = build_index(
        &config.secondary_dirs,
        config.alias_table.as_deref(),
        &config.policy.presentational_tags,
    )?;

    progress.phase("Scanning primary corpus");
    ensure_output_dir(&config.output_dir)?;
    let files = scan_corpus(&config.primary_dir, |_| false)?;

    progress.phase("Merging records");
    let orchestrator = BatchOrchestrator::new(config, &index, validator);
    let stats = orchestrator.run(&files, progress);

    let summary = RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        stats,
        index: index_report,
    };

    info!(
        merged = summary.stats.merged(),
        failed = summary.stats.failed,
        elapsed_ms = summary.elapsed_ms,
        "harmonization run complete"
    );
    progress.done(&summary);
    Ok(summary)
}

/// Write the run summary as pretty JSON.
pub fn write_run_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| HarmonizerError::Serialize(e.to_string()))?;
    write_atomic(path, &json)
}

// ---------------------------------------------------------------------------
// BatchOrchestrator
// ---------------------------------------------------------------------------

/// Drives the merge over a list of primary files.
pub struct BatchOrchestrator<'a> {
    config: &'a HarmonizeConfig,
    index: &'a SecondaryCorpusIndex,
    policy: RecordPolicy,
    validator: &'a dyn SchemaValidator,
    exporter: PrintVariantExporter,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        config: &'a HarmonizeConfig,
        index: &'a SecondaryCorpusIndex,
        validator: &'a dyn SchemaValidator,
    ) -> Self {
        let exporter = PrintVariantExporter::new(
            config.output_dir.clone(),
            config.schema_href.clone(),
            config.policy.presentational_tags.clone(),
        );
        let mut policy = config.policy.clone();
        policy.normalize_lists(|name| index.normalize_key(name));
        Self {
            config,
            index,
            policy,
            validator,
            exporter,
        }
    }

    /// Process every file and fold the per-record stats.
    pub fn run(&self, files: &[PathBuf], progress: &dyn ProgressReporter) -> RunStats {
        let total = files.len();
        files
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let name = file_name(path);
                let (outcome, validation_failed) = self.process(path, &name);
                progress.record_done(&name, outcome, i + 1, total);

                let mut stats = RunStats::from_outcome(outcome);
                if validation_failed {
                    stats.validation_failures += 1;
                }
                stats
            })
            .sum()
    }

    /// Process one primary record. Returns the outcome and whether schema
    /// validation failed.
    #[instrument(skip_all, fields(record = name))]
    pub fn process(&self, path: &Path, name: &str) -> (RecordOutcome, bool) {
        if is_cross_reference_file(name) {
            info!("cross-reference stub, skipping");
            return (RecordOutcome::Skipped(SkipReason::CrossReference), false);
        }

        let target = self.config.output_dir.join(name);
        if target.exists() {
            info!("output exists, skipping");
            return (RecordOutcome::Skipped(SkipReason::AlreadyProcessed), false);
        }

        let mut root = match read_document(path) {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "unparsable record");
                return (RecordOutcome::Failed, false);
            }
        };
        strip_namespaces(&mut root);

        let identity = root.attr(attrs::IDENTITY).unwrap_or(name).to_string();
        let key = self.index.normalize_key(&identity);
        if let Some(reason) = prefilter(&root, &key, &self.policy) {
            info!(?reason, "record skipped");
            return (RecordOutcome::Skipped(reason), false);
        }

        let overlay = match self.overlay_for(path) {
            Ok(overlay) => overlay,
            Err(e) => {
                warn!(error = %e, "overlay unavailable");
                return (RecordOutcome::Failed, false);
            }
        };

        let merger = RecordMerger::new(self.index, &self.policy, &self.exporter);
        let merged = match merger.merge(root, &overlay, &identity, name) {
            Ok(merged) => merged,
            Err(e) => {
                warn!(error = %e, "record dropped");
                return (RecordOutcome::Failed, false);
            }
        };

        let document = match serialize_document(&merged.root, &self.config.schema_href) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "serialization failed");
                discard_sibling(merged.print_variant.as_deref());
                return (RecordOutcome::Failed, false);
            }
        };

        let validation_failed = match self.validator.validate(&document) {
            Ok(report) if report.passed => false,
            Ok(report) => {
                warn!(validator = self.validator.name(), log = %report.log.trim(), "schema validation failed");
                true
            }
            Err(e) => {
                warn!(error = %e, "schema validator unavailable");
                true
            }
        };

        if let Err(e) = write_atomic(&target, &document) {
            warn!(error = %e, "failed to write merged record");
            discard_sibling(merged.print_variant.as_deref());
            return (RecordOutcome::Failed, validation_failed);
        }

        info!(channels = ?merged.channels, "record merged");
        (RecordOutcome::Merged(merged.channels), validation_failed)
    }

    fn overlay_for(&self, path: &Path) -> Result<Overlay> {
        let overlay_path = self.policy.overlay_path(path);
        match read_overlay(&overlay_path) {
            Err(HarmonizerError::MissingOverlay { path }) if self.policy.allow_missing_overlay => {
                warn!(path = %path.display(), "overlay missing, continuing without it");
                Ok(Overlay::default())
            }
            other => other,
        }
    }
}

fn discard_sibling(path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    match std::fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "removed print sibling of dropped record"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove print sibling"),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
