//! Merge engine and batch orchestration for the harmonizer.
//!
//! This crate ties the secondary index, overlays, and markup passes together:
//! - [`merger`] — per-record pre-filter and [`RecordMerger`]
//! - [`print_variant`] — print sibling export for dual-origin records
//! - [`pipeline`] — the batch run ([`harmonize`]) and progress reporting
//! - [`validation`] — external schema validator

pub mod merger;
pub mod output;
pub mod pipeline;
pub mod print_variant;
pub mod publication;
pub mod validation;

pub use merger::{MergedRecord, RecordMerger, prefilter};
pub use pipeline::{
    BatchOrchestrator, HarmonizeConfig, ProgressReporter, RunSummary, SilentProgress, build_index,
    harmonize, write_run_report,
};
pub use print_variant::{ExportStatus, PrintVariantExporter};
pub use validation::{
    CommandValidator, NoopValidator, SchemaValidator, ValidationReport, validator_from_config,
};
