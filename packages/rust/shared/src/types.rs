//! Core domain types shared by the index, merge engine, and CLI.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File extension every canonical record identity carries.
pub const RECORD_EXTENSION: &str = ".xml";

/// Marker inserted before the extension of a print-variant sibling.
pub const PRINT_SUFFIX: &str = "_print";

/// Suffix carried by online-variant file names in the secondary corpus.
pub const ONLINE_SUFFIX: &str = "_online";

/// Keyword that marks a publication block as describing the online channel.
const ONLINE_MARKER: &str = "online";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one batch run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Record identity helpers
// ---------------------------------------------------------------------------

/// Strip the canonical extension from a record identity or file name.
pub fn record_stem(name: &str) -> &str {
    name.strip_suffix(RECORD_EXTENSION).unwrap_or(name)
}

/// Ensure a record identity ends with the canonical extension.
pub fn with_record_extension(name: &str) -> String {
    if name.ends_with(RECORD_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{RECORD_EXTENSION}")
    }
}

/// Identity of the print sibling: `Name.xml` becomes `Name_print.xml`.
pub fn print_variant_name(name: &str) -> String {
    format!("{}{PRINT_SUFFIX}{RECORD_EXTENSION}", record_stem(name))
}

// ---------------------------------------------------------------------------
// VariantKind
// ---------------------------------------------------------------------------

/// Publication channel of a record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Print,
    Online,
}

impl VariantKind {
    /// Classify a publication block by its free text.
    ///
    /// Any mention of "online" (case-insensitive) marks the online channel.
    /// This is a phrasing-dependent heuristic; keep callers going through here.
    pub fn from_block_text(text: &str) -> Self {
        if text.to_lowercase().contains(ONLINE_MARKER) {
            Self::Online
        } else {
            Self::Print
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Online => "online",
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record outcomes
// ---------------------------------------------------------------------------

/// Channels a merged record was published through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channels {
    PrintOnly,
    OnlineOnly,
    PrintAndOnline,
}

impl From<VariantKind> for Channels {
    fn from(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Print => Self::PrintOnly,
            VariantKind::Online => Self::OnlineOnly,
        }
    }
}

/// Why a record was not merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Output already exists from an earlier run.
    AlreadyProcessed,
    /// Record is a cross-reference stub.
    CrossReference,
    /// Record only mentions the person.
    MentionOnly,
    /// Identity is on the exclusion list.
    Excluded,
}

/// Result of processing one primary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Merged(Channels),
    Skipped(SkipReason),
    Failed,
}

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// Per-run counters, built by folding per-record outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub print_only: usize,
    pub online_only: usize,
    pub print_and_online: usize,
    pub skipped_cross_reference: usize,
    pub skipped_mention_only: usize,
    pub excluded: usize,
    pub already_processed: usize,
    pub failed: usize,
    pub validation_failures: usize,
}

impl RunStats {
    /// Stats for a single record outcome.
    pub fn from_outcome(outcome: RecordOutcome) -> Self {
        let mut stats = Self::default();
        match outcome {
            RecordOutcome::Merged(Channels::PrintOnly) => stats.print_only = 1,
            RecordOutcome::Merged(Channels::OnlineOnly) => stats.online_only = 1,
            RecordOutcome::Merged(Channels::PrintAndOnline) => stats.print_and_online = 1,
            RecordOutcome::Skipped(SkipReason::CrossReference) => {
                stats.skipped_cross_reference = 1
            }
            RecordOutcome::Skipped(SkipReason::MentionOnly) => stats.skipped_mention_only = 1,
            RecordOutcome::Skipped(SkipReason::Excluded) => stats.excluded = 1,
            RecordOutcome::Skipped(SkipReason::AlreadyProcessed) => stats.already_processed = 1,
            RecordOutcome::Failed => stats.failed = 1,
        }
        stats
    }

    /// Number of records written during the run.
    pub fn merged(&self) -> usize {
        self.print_only + self.online_only + self.print_and_online
    }

    /// Number of records seen during the run.
    pub fn total(&self) -> usize {
        self.merged()
            + self.skipped_cross_reference
            + self.skipped_mention_only
            + self.excluded
            + self.already_processed
            + self.failed
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, other: Self) {
        self.print_only += other.print_only;
        self.online_only += other.online_only;
        self.print_and_online += other.print_and_online;
        self.skipped_cross_reference += other.skipped_cross_reference;
        self.skipped_mention_only += other.skipped_mention_only;
        self.excluded += other.excluded;
        self.already_processed += other.already_processed;
        self.failed += other.failed;
        self.validation_failures += other.validation_failures;
    }
}

impl std::iter::Sum for RunStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, stats| {
            acc += stats;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_variant_name_inserts_marker() {
        assert_eq!(
            print_variant_name("Abel_Othenio_1875_1946.xml"),
            "Abel_Othenio_1875_1946_print.xml"
        );
        assert_eq!(print_variant_name("Abel_Othenio"), "Abel_Othenio_print.xml");
    }

    #[test]
    fn record_extension_is_idempotent() {
        assert_eq!(with_record_extension("Abel"), "Abel.xml");
        assert_eq!(with_record_extension("Abel.xml"), "Abel.xml");
        assert_eq!(record_stem("Abel.xml"), "Abel");
    }

    #[test]
    fn variant_kind_from_block_text() {
        assert_eq!(
            VariantKind::from_block_text("ÖBL Online-Edition, Lfg. 2 (2013)"),
            VariantKind::Online
        );
        assert_eq!(
            VariantKind::from_block_text("ÖBL 1815-1950, Bd. 1 (Lfg. 1, 1954)"),
            VariantKind::Print
        );
    }

    #[test]
    fn stats_fold_outcomes() {
        let outcomes = [
            RecordOutcome::Merged(Channels::OnlineOnly),
            RecordOutcome::Merged(Channels::PrintAndOnline),
            RecordOutcome::Merged(Channels::OnlineOnly),
            RecordOutcome::Skipped(SkipReason::CrossReference),
            RecordOutcome::Failed,
        ];
        let stats: RunStats = outcomes.into_iter().map(RunStats::from_outcome).sum();
        assert_eq!(stats.online_only, 2);
        assert_eq!(stats.print_and_online, 1);
        assert_eq!(stats.skipped_cross_reference, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.merged(), 3);
        assert_eq!(stats.total(), 5);
    }

    #[test]
    fn stats_serialize_as_flat_counters() {
        let stats = RunStats::from_outcome(RecordOutcome::Merged(Channels::PrintOnly));
        let json = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(json["print_only"], 1);
        assert_eq!(json["online_only"], 0);
    }
}
