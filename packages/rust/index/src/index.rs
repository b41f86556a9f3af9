//! The secondary corpus index and its entries.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use harmonizer_markup::Element;
use harmonizer_shared::VariantKind;
use harmonizer_shared::vocab::tags;
use serde::Serialize;

use crate::keys::FileKeyNormalizer;

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// Authoritative fragments lifted from one secondary file.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryFragments {
    /// The publication block used for classification.
    pub pub_info: Element,
    pub birth: Option<Element>,
    pub death: Option<Element>,
}

impl SecondaryFragments {
    /// Extract fragments from a normalized secondary root.
    ///
    /// Returns `None` when the file has no publication block.
    pub fn extract(root: &Element) -> Option<Self> {
        let pub_info = publication_block(root)?;
        Some(Self {
            pub_info: detached(pub_info),
            birth: root.find(tags::BIRTH).map(detached),
            death: root.find(tags::DEATH).map(detached),
        })
    }

    pub fn variant(&self) -> VariantKind {
        VariantKind::from_block_text(&self.pub_info.text_content())
    }
}

/// First `PubInfo` block, else first `Lieferung` block.
pub fn publication_block(root: &Element) -> Option<&Element> {
    root.find(tags::PUB_INFO).or_else(|| root.find(tags::DELIVERY))
}

fn detached(el: &Element) -> Element {
    let mut copy = el.clone();
    copy.tail = None;
    copy
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One indexed secondary file.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedSource {
    pub path: PathBuf,
    pub fragments: SecondaryFragments,
}

/// Print and online sources known under one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceIndexEntry {
    pub print: Option<IndexedSource>,
    pub online: Option<IndexedSource>,
}

impl SourceIndexEntry {
    pub fn get(&self, kind: VariantKind) -> Option<&IndexedSource> {
        match kind {
            VariantKind::Print => self.print.as_ref(),
            VariantKind::Online => self.online.as_ref(),
        }
    }

    /// Source whose fragments are authoritative: online first, then print.
    pub fn authoritative(&self) -> Option<&IndexedSource> {
        self.online.as_ref().or(self.print.as_ref())
    }

    /// Fill the slot for `kind` unless taken. Returns `false` on collision.
    pub(crate) fn insert(&mut self, kind: VariantKind, source: IndexedSource) -> bool {
        let slot = match kind {
            VariantKind::Print => &mut self.print,
            VariantKind::Online => &mut self.online,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(source);
        true
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Immutable identity index over the secondary corpus.
#[derive(Debug, Default)]
pub struct SecondaryCorpusIndex {
    pub(crate) entries: HashMap<String, SourceIndexEntry>,
    pub(crate) keys: FileKeyNormalizer,
}

impl SecondaryCorpusIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SourceIndexEntry> {
        self.entries.get(key)
    }

    /// Entry under the first key that has one.
    pub fn lookup<S: AsRef<str>>(&self, keys: &[S]) -> Option<&SourceIndexEntry> {
        keys.iter().find_map(|k| self.entries.get(k.as_ref()))
    }

    /// Source of one variant, searching keys in order.
    pub fn variant_source<S: AsRef<str>>(
        &self,
        keys: &[S],
        kind: VariantKind,
    ) -> Option<&IndexedSource> {
        keys.iter()
            .filter_map(|k| self.entries.get(k.as_ref()))
            .find_map(|entry| entry.get(kind))
    }

    /// Normalize a record identity the same way file keys were normalized.
    pub fn normalize_key(&self, name: &str) -> String {
        self.keys.normalize(name)
    }
}

// ---------------------------------------------------------------------------
// Build report
// ---------------------------------------------------------------------------

/// Counters collected while building the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub indexed: usize,
    pub print_sources: usize,
    pub online_sources: usize,
    pub unparsable: usize,
    pub unclassified: usize,
    /// Files indexed under their file key only.
    pub unresolved_identity: usize,
    pub collisions: usize,
    /// Winning strategy name → count.
    pub resolved_by: BTreeMap<String, usize>,
    pub keys: usize,
}
