//! Materializes the print sibling of a dual-origin record.

use std::path::{Path, PathBuf};

use harmonizer_index::{IndexedSource, SecondaryCorpusIndex};
use harmonizer_markup::{Element, clear_inter_element_whitespace, load_record, serialize_document};
use harmonizer_overlay::Overlay;
use harmonizer_shared::vocab::{attrs, tags};
use harmonizer_shared::{Result, VariantKind, print_variant_name};
use tracing::{info, warn};

use crate::output::write_atomic;
use crate::publication::retag_deliveries;

/// Root attributes kept on a print sibling.
pub const PRINT_ROOT_ATTRIBUTES: [&str; 6] = [
    attrs::IDENTITY,
    attrs::VERSION,
    attrs::AUTHORITY_ID,
    attrs::EXTERNAL_ID,
    attrs::DOI,
    attrs::BIOGRAPHY,
];

/// Outcome of a print export attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Exported { path: PathBuf },
    NoPrintSource,
    Failed { reason: String },
}

impl ExportStatus {
    pub fn exported_path(&self) -> Option<&Path> {
        match self {
            Self::Exported { path } => Some(path),
            _ => None,
        }
    }
}

/// Writes `<stem>_print.xml` next to the main output from the secondary
/// print source.
///
/// The file is named after the primary record; its `Nummer` is the source's
/// own `Nummer` with the `_print` suffix, or the record name when the source
/// carries none.
#[derive(Debug, Clone)]
pub struct PrintVariantExporter {
    output_dir: PathBuf,
    schema_href: String,
    presentational_tags: Vec<String>,
}

impl PrintVariantExporter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        schema_href: impl Into<String>,
        presentational_tags: Vec<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            schema_href: schema_href.into(),
            presentational_tags,
        }
    }

    /// Export the print sibling of `record_name`.
    ///
    /// `keys` are tried in order against the index. Never fails: every error
    /// is logged and reported as [`ExportStatus::Failed`].
    pub fn export<S: AsRef<str>>(
        &self,
        index: &SecondaryCorpusIndex,
        keys: &[S],
        record_name: &str,
        overlay: &Overlay,
    ) -> ExportStatus {
        let Some(source) = index.variant_source(keys, VariantKind::Print) else {
            warn!(record = record_name, "no print source for dual-origin record");
            return ExportStatus::NoPrintSource;
        };

        let target = self.output_dir.join(print_variant_name(record_name));
        match self.write_variant(source, record_name, &target, overlay) {
            Ok(()) => {
                info!(record = record_name, path = %target.display(), "print variant exported");
                ExportStatus::Exported { path: target }
            }
            Err(e) => {
                warn!(
                    record = record_name,
                    source = %source.path.display(),
                    error = %e,
                    "print variant export failed"
                );
                ExportStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn write_variant(
        &self,
        source: &IndexedSource,
        record_name: &str,
        target: &Path,
        overlay: &Overlay,
    ) -> Result<()> {
        let mut root = load_record(&source.path, &self.presentational_tags)?;

        let identity = root
            .attr(attrs::IDENTITY)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(record_name);
        let identity = print_variant_name(identity);
        root.set_attr(attrs::IDENTITY, identity);
        root.set_attr(attrs::VERSION, "1");
        overlay.apply(&mut root)?;
        promote_secondary_name_types(&mut root);
        retag_deliveries(&mut root);
        root.retain_attrs(|key| PRINT_ROOT_ATTRIBUTES.contains(&key));
        clear_inter_element_whitespace(&mut root);

        let document = serialize_document(&root, &self.schema_href)?;
        write_atomic(target, &document)
    }
}

/// Move a legacy `type` attribute to `Type` on every secondary name.
fn promote_secondary_name_types(root: &mut Element) {
    root.visit_mut(&mut |el| {
        if el.name == tags::SECONDARY_NAME {
            if let Some(value) = el.remove_attr(attrs::LEGACY_TYPE) {
                el.set_attr(attrs::TYPE, value);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmonizer_index::IndexBuilder;

    const PRINT_SOURCE: &str = r#"<Person xmlns="http://www.biographien.ac.at" Nummer="Abel_Othenio_1875_1946.xml" eoebl_id="abel" internal="drop"><Lexikonartikel><Hauptbezeichnung>Abel</Hauptbezeichnung><Nebenbezeichnung type="Vorname">Othenio</Nebenbezeichnung><Lieferung>ÖBL 1815-1950, Bd. 1 (Lfg. 1, 1954)</Lieferung></Lexikonartikel></Person>"#;

    fn index_with(dir: &Path, files: &[(&str, &str)]) -> SecondaryCorpusIndex {
        for (name, xml) in files {
            std::fs::write(dir.join(name), xml).expect("write fixture");
        }
        let (index, _) = IndexBuilder::new(vec![dir.to_path_buf()]).build().expect("build");
        index
    }

    #[test]
    fn exports_pruned_print_sibling() {
        let secondary = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        let index = index_with(secondary.path(), &[("Abel_Othenio_1875_1946.xml", PRINT_SOURCE)]);
        let exporter = PrintVariantExporter::new(out.path(), "schema.rng", vec!["b".into()]);
        let overlay = Overlay::parse("doi=10.1/x\noebl_Geschlecht=m");

        let status = exporter.export(&index, &["abel"], "Abel_Othenio_1875_1946.xml", &overlay);
        let path = status.exported_path().expect("exported").to_path_buf();
        assert_eq!(path, out.path().join("Abel_Othenio_1875_1946_print.xml"));

        let written = std::fs::read_to_string(&path).expect("read");
        assert!(written.starts_with("<?xml"));
        let root = harmonizer_markup::parse_document(&written).expect("parse");
        assert_eq!(root.attr("Nummer"), Some("Abel_Othenio_1875_1946_print.xml"));
        assert_eq!(root.attr("version"), Some("1"));
        assert_eq!(root.attr("doi"), Some("10.1/x"));
        assert_eq!(root.attr("eoebl_id"), Some("abel"));
        assert!(root.attr("internal").is_none());
        assert!(!root.contains(tags::DELIVERY));
        assert!(root.contains(tags::PUB_INFO));
        assert!(root.contains(tags::GENDER));
        let name = root.find(tags::SECONDARY_NAME).expect("secondary name");
        assert_eq!(name.attr("Type"), Some("Vorname"));
        assert!(name.attr("type").is_none());
    }

    #[test]
    fn print_identity_follows_source_nummer() {
        let secondary = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        let renamed = PRINT_SOURCE.replace(r#"Nummer="Abel_Othenio_1875_1946.xml""#, r#"Nummer="Abel_O_1875.xml""#);
        let unnamed = PRINT_SOURCE.replace(r#" Nummer="Abel_Othenio_1875_1946.xml""#, "").replace("abel", "abel-2");
        let index = index_with(
            secondary.path(),
            &[("Abel_Othenio_1875_1946.xml", renamed.as_str()), ("Abel_Other.xml", unnamed.as_str())],
        );
        let exporter = PrintVariantExporter::new(out.path(), "schema.rng", vec![]);

        let status = exporter.export(&index, &["abel"], "Abel_Othenio_1875_1946.xml", &Overlay::default());
        let path = status.exported_path().expect("exported").to_path_buf();
        assert_eq!(path, out.path().join("Abel_Othenio_1875_1946_print.xml"));
        let root = harmonizer_markup::parse_document(&std::fs::read_to_string(&path).expect("read"))
            .expect("parse");
        assert_eq!(root.attr("Nummer"), Some("Abel_O_1875_print.xml"));

        let status = exporter.export(&index, &["abel-2"], "Abel_Other.xml", &Overlay::default());
        let path = status.exported_path().expect("exported").to_path_buf();
        let root = harmonizer_markup::parse_document(&std::fs::read_to_string(&path).expect("read"))
            .expect("parse");
        assert_eq!(root.attr("Nummer"), Some("Abel_Other_print.xml"));
    }

    #[test]
    fn falls_back_to_identity_key() {
        let secondary = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        let index = index_with(secondary.path(), &[("Abel_Othenio_1875_1946.xml", PRINT_SOURCE)]);
        let exporter = PrintVariantExporter::new(out.path(), "schema.rng", vec![]);

        let status = exporter.export(
            &index,
            &["unknown-id", "Abel_Othenio_1875_1946"],
            "Abel_Othenio_1875_1946.xml",
            &Overlay::default(),
        );
        assert!(matches!(status, ExportStatus::Exported { .. }));
    }

    #[test]
    fn online_only_source_is_not_a_print_source() {
        let secondary = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        let online = PRINT_SOURCE.replace("ÖBL 1815-1950, Bd. 1 (Lfg. 1, 1954)", "ÖBL Online-Edition");
        let index = index_with(secondary.path(), &[("Abel_Othenio_1875_1946_online.xml", online.as_str())]);
        let exporter = PrintVariantExporter::new(out.path(), "schema.rng", vec![]);

        let status = exporter.export(&index, &["abel"], "Abel_Othenio_1875_1946.xml", &Overlay::default());
        assert_eq!(status, ExportStatus::NoPrintSource);
        assert!(!out.path().join("Abel_Othenio_1875_1946_print.xml").exists());
    }

    #[test]
    fn write_failure_collapses_to_failed() {
        let secondary = tempfile::tempdir().expect("tempdir");
        let index = index_with(secondary.path(), &[("Abel_Othenio_1875_1946.xml", PRINT_SOURCE)]);
        let exporter = PrintVariantExporter::new("/nonexistent/harmonizer/out", "schema.rng", vec![]);

        let status = exporter.export(&index, &["abel"], "Abel_Othenio_1875_1946.xml", &Overlay::default());
        assert!(matches!(status, ExportStatus::Failed { .. }));
    }
}
