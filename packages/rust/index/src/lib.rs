//! Identity index over the secondary (archival) corpus.
//!
//! This crate provides:
//! - [`scan`] — sorted corpus traversal shared with the batch orchestrator
//! - [`strategies`] — ordered identity resolution ([`StrategyRegistry`])
//! - [`FileKeyNormalizer`] — file-name keys with an optional alias table
//! - [`IndexBuilder`] — builds the immutable [`SecondaryCorpusIndex`]

mod builder;
mod index;
mod keys;
pub mod scan;
pub mod strategies;

pub use builder::IndexBuilder;
pub use index::{
    IndexReport, IndexedSource, SecondaryCorpusIndex, SecondaryFragments, SourceIndexEntry,
    publication_block,
};
pub use keys::FileKeyNormalizer;
pub use scan::{is_auxiliary_file, is_cross_reference_file, scan_corpus};
pub use strategies::{
    ExplicitAttribute, IdentityStrategy, OnlineCompanion, RegistryCompanion, SourceFile,
    StrategyRegistry,
};
