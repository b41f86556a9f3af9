//! Per-record merge engine.
//!
//! A primary record is filtered, enriched from its overlay, normalized,
//! substituted with authoritative fragments from the secondary index (or
//! deduplicated locally), and finally classified. Dual-origin records get a
//! print sibling through the [`PrintVariantExporter`].

use std::path::PathBuf;

use harmonizer_index::SecondaryCorpusIndex;
use harmonizer_markup::{Element, clear_inter_element_whitespace, flatten_tags};
use harmonizer_overlay::Overlay;
use harmonizer_shared::vocab::{DEFAULT_SECONDARY_NAME_TYPE, attrs, tags};
use harmonizer_shared::{
    Channels, HarmonizerError, RecordPolicy, Result, SkipReason, VariantKind,
    with_record_extension,
};
use tracing::{debug, instrument, warn};

use crate::print_variant::{ExportStatus, PrintVariantExporter};
use crate::publication::{classify, keep_latest_block, publication_blocks, replace_blocks};

// ---------------------------------------------------------------------------
// Pre-filter
// ---------------------------------------------------------------------------

/// Decide whether a parsed record is skipped before merging.
///
/// `identity` is the record's normalized lookup key.
pub fn prefilter(root: &Element, identity: &str, policy: &RecordPolicy) -> Option<SkipReason> {
    if policy.is_excluded(identity) {
        return Some(SkipReason::Excluded);
    }
    if root.contains(tags::CROSS_REFERENCE) {
        return Some(SkipReason::CrossReference);
    }
    let blocks = publication_blocks(root);
    if let [block] = blocks.as_slice() {
        if policy.is_mention_only(&block.text_content()) {
            return Some(SkipReason::MentionOnly);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Merger
// ---------------------------------------------------------------------------

/// A merged record ready for serialization.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    pub root: Element,
    pub channels: Channels,
    /// Print sibling written during the merge.
    pub print_variant: Option<PathBuf>,
}

/// Merges primary records against the secondary index.
pub struct RecordMerger<'a> {
    index: &'a SecondaryCorpusIndex,
    policy: &'a RecordPolicy,
    exporter: &'a PrintVariantExporter,
}

impl<'a> RecordMerger<'a> {
    pub fn new(
        index: &'a SecondaryCorpusIndex,
        policy: &'a RecordPolicy,
        exporter: &'a PrintVariantExporter,
    ) -> Self {
        Self {
            index,
            policy,
            exporter,
        }
    }

    /// Merge one record.
    ///
    /// `identity` is the record's `Nummer` (or its file name when absent) and
    /// `record_name` the output file name. Any error drops the record; a
    /// print sibling is only written once every other step has succeeded.
    #[instrument(skip_all, fields(record = record_name))]
    pub fn merge(
        &self,
        mut root: Element,
        overlay: &Overlay,
        identity: &str,
        record_name: &str,
    ) -> Result<MergedRecord> {
        flatten_tags(&mut root, &self.policy.presentational_tags);

        let applied = overlay.apply(&mut root)?;
        debug!(fields = applied.len(), "overlay applied");

        normalize_names(&mut root)?;

        let keys = self.lookup_keys(overlay, identity);
        let dual_origin = publication_blocks(&root).len() == 2
            || self.policy.forces_dual_origin(&self.index.normalize_key(identity));

        let substituted = self.substitute(&mut root, &keys)?;
        if !substituted {
            if let Some(article) = root.child_mut(tags::ARTICLE) {
                keep_latest_block(article);
            }
        }

        root.set_attr(attrs::IDENTITY, with_record_extension(identity));
        clear_inter_element_whitespace(&mut root);

        if dual_origin {
            let status = self.exporter.export(self.index, &keys, record_name, overlay);
            if let ExportStatus::Exported { path } = status {
                root.set_attr(attrs::VERSION, "2");
                return Ok(MergedRecord {
                    root,
                    channels: Channels::PrintAndOnline,
                    print_variant: Some(path),
                });
            }
        }

        root.set_attr(attrs::VERSION, "1");
        let kind = classify(&root).unwrap_or_else(|| {
            warn!("no publication block left, classifying as print");
            VariantKind::Print
        });
        Ok(MergedRecord {
            root,
            channels: kind.into(),
            print_variant: None,
        })
    }

    /// Overlay external id first, then the normalized identity.
    fn lookup_keys(&self, overlay: &Overlay, identity: &str) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(id) = overlay.external_id() {
            keys.push(id.to_string());
        }
        let normalized = self.index.normalize_key(identity);
        if !keys.contains(&normalized) {
            keys.push(normalized);
        }
        keys
    }

    /// Replace publication, birth, and death data with secondary fragments.
    ///
    /// Returns `true` when the index had fragments for the record.
    fn substitute(&self, root: &mut Element, keys: &[String]) -> Result<bool> {
        let Some(source) = self.index.lookup(keys).and_then(|e| e.authoritative()) else {
            return Ok(false);
        };
        debug!(source = %source.path.display(), "substituting secondary fragments");
        let fragments = &source.fragments;

        let article = root
            .child_mut(tags::ARTICLE)
            .ok_or_else(|| HarmonizerError::structure(format!("missing <{}>", tags::ARTICLE)))?;
        replace_blocks(article, fragments.pub_info.clone())?;

        let vita_fragments = [
            (tags::BIRTH, fragments.birth.as_ref()),
            (tags::DEATH, fragments.death.as_ref()),
        ];
        for (tag, fragment) in vita_fragments {
            let Some(fragment) = fragment else {
                continue;
            };
            let vita = article.child_mut(tags::VITA).ok_or_else(|| {
                HarmonizerError::structure(format!("missing <{}> for <{tag}>", tags::VITA))
            })?;
            if !vita.replace_child(tag, fragment.clone()) {
                vita.children.push(fragment.clone());
            }
        }
        Ok(true)
    }
}

/// Trim the main name and classify the secondary name.
fn normalize_names(root: &mut Element) -> Result<()> {
    let main = root
        .find_mut(tags::MAIN_NAME)
        .ok_or_else(|| HarmonizerError::structure(format!("missing <{}>", tags::MAIN_NAME)))?;
    if let Some(text) = main.text.as_mut() {
        *text = text.trim().trim_end_matches(',').trim_end().to_string();
    }

    let Some(secondary) = root.find_mut(tags::SECONDARY_NAME) else {
        return Ok(());
    };
    if let Some(legacy) = secondary.remove_attr(attrs::LEGACY_TYPE) {
        secondary.set_attr(attrs::TYPE, legacy);
    } else if secondary.attr(attrs::TYPE).is_none() {
        warn!(
            default = DEFAULT_SECONDARY_NAME_TYPE,
            "secondary name without type, using default"
        );
        secondary.set_attr(attrs::TYPE, DEFAULT_SECONDARY_NAME_TYPE);
    }
    Ok(())
}
