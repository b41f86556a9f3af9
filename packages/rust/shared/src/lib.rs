//! Shared types, error model, and configuration for the harmonizer.
//!
//! This crate is the foundation depended on by all other harmonizer crates.
//! It provides:
//! - [`HarmonizerError`] — the unified error type
//! - Domain types ([`VariantKind`], [`RecordOutcome`], [`RunStats`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RecordPolicy`], config loading)

pub mod config;
pub mod error;
pub mod types;
pub mod vocab;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CorpusConfig, MarkupConfig, OutputConfig, RecordPolicy, RecordsConfig,
    ValidationConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{HarmonizerError, Result};
pub use types::{
    Channels, ONLINE_SUFFIX, PRINT_SUFFIX, RECORD_EXTENSION, RecordOutcome, RunId, RunStats,
    SkipReason, VariantKind, print_variant_name, record_stem, with_record_extension,
};
