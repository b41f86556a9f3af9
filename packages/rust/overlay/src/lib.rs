//! Per-record metadata overlays.
//!
//! Every primary record `X.xml` may have a sidecar `X.xml.hmi` of `key=value`
//! lines carrying identifiers and attributes that live outside the markup.
//! An [`Overlay`] applies the recognized keys to a record tree in a fixed
//! order; unrecognized keys are ignored.

mod fields;
mod parser;

use std::collections::BTreeMap;
use std::path::Path;

use harmonizer_markup::Element;
use harmonizer_shared::{HarmonizerError, Result};
use tracing::{debug, instrument};

pub use fields::{OverlayField, OverlayRule};
pub use parser::{parse_key_values, read_key_values};

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

/// Parsed overlay: the raw key/value map of one sidecar file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    values: BTreeMap<String, String>,
}

impl Overlay {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn parse(content: &str) -> Self {
        Self::new(parse_key_values(content))
    }

    /// Value of a recognized field. Blank values count as absent.
    pub fn get(&self, field: OverlayField) -> Option<&str> {
        self.values
            .get(field.key())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The external identifier, used as the preferred index lookup key.
    pub fn external_id(&self) -> Option<&str> {
        self.get(OverlayField::ExternalId)
    }

    /// Recognized fields present in this overlay, in application order.
    pub fn fields(&self) -> Vec<OverlayField> {
        OverlayField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Apply every present field to the record root.
    ///
    /// Fields are applied in [`OverlayField::ALL`] order. Returns the fields
    /// that were applied.
    pub fn apply(&self, root: &mut Element) -> Result<Vec<OverlayField>> {
        let mut applied = Vec::new();
        for field in OverlayField::ALL {
            let Some(value) = self.get(field) else {
                continue;
            };
            (field.rule())(root, value)?;
            applied.push(field);
        }
        Ok(applied)
    }

    /// Keys that no rule handles.
    pub fn unrecognized_keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .keys()
            .map(String::as_str)
            .filter(|k| OverlayField::from_key(k).is_none())
    }
}

/// Read the overlay at `path`.
///
/// A missing file is reported as [`HarmonizerError::MissingOverlay`] so the
/// caller can decide whether to tolerate it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_overlay(path: &Path) -> Result<Overlay> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HarmonizerError::MissingOverlay {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(HarmonizerError::io(path, e)),
    };

    let overlay = Overlay::parse(&content);
    for key in overlay.unrecognized_keys() {
        debug!(key, "ignoring unrecognized overlay key");
    }
    debug!(fields = overlay.fields().len(), "overlay loaded");
    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmonizer_shared::vocab::tags;

    fn record() -> Element {
        Element::new("Person")
            .with_attr("Nummer", "Abel_Othenio_1875_1946.xml")
            .with_child(Element::new(tags::ARTICLE))
    }

    #[test]
    fn apply_sets_attributes_and_gender() {
        let overlay = Overlay::parse(
            "doi=10.1553/0x0001e5b0\neoebl_id=Abel_Othenio\nvaw_PND=116000996\noebl_Geschlecht=m\noebl_Biographie=abel.pdf\n",
        );
        let mut root = record();
        let applied = overlay.apply(&mut root).expect("apply");

        assert_eq!(applied, OverlayField::ALL.to_vec());
        assert_eq!(root.attr("doi"), Some("10.1553/0x0001e5b0"));
        assert_eq!(root.attr("eoebl_id"), Some("Abel_Othenio"));
        assert_eq!(root.attr("gnd"), Some("116000996"));
        assert_eq!(root.attr("pdf_file"), Some("abel.pdf"));
        assert_eq!(
            root.find(tags::GENDER).and_then(|g| g.attr("Type")),
            Some("m")
        );
    }

    #[test]
    fn absent_and_blank_keys_are_not_applied() {
        let overlay = Overlay::parse("doi=\nunknown=1\n");
        let mut root = record();
        let applied = overlay.apply(&mut root).expect("apply");
        assert!(applied.is_empty());
        assert!(overlay.is_empty());
        assert!(root.attr("doi").is_none());
        assert_eq!(overlay.unrecognized_keys().collect::<Vec<_>>(), vec!["unknown"]);
    }

    #[test]
    fn gender_without_article_fails() {
        let overlay = Overlay::parse("oebl_Geschlecht=w");
        let mut root = Element::new("Person");
        assert!(overlay.apply(&mut root).is_err());
    }

    #[test]
    fn read_overlay_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_overlay(&dir.path().join("A.xml.hmi")).unwrap_err();
        assert!(matches!(err, HarmonizerError::MissingOverlay { .. }));
    }

    #[test]
    fn read_overlay_parses_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("A.xml.hmi");
        std::fs::write(&path, "eoebl_id=A_ext\n").expect("write");
        let overlay = read_overlay(&path).expect("read");
        assert_eq!(overlay.external_id(), Some("A_ext"));
    }
}
