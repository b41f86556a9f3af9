//! Record markup: element tree, parsing, serialization, and cleanup passes.
//!
//! Records are read into an owned [`Element`] tree with `quick-xml`, edited in
//! place by the merge engine, and written back with a fixed document header.
//! The passes here are markup-only; they know nothing about record semantics.

mod cleanup;
mod flatten;
mod reader;
mod tree;
mod writer;

pub use cleanup::{clear_inter_element_whitespace, strip_namespaces};
pub use flatten::{flatten_tag, flatten_tags};
pub use reader::{parse_document, read_document};
pub use tree::Element;
pub use writer::{document_header, serialize_document, serialize_element};

/// Read a corpus file and normalize it for merging: namespaces stripped and
/// presentational tags flattened.
pub fn load_record<S: AsRef<str>>(
    path: &std::path::Path,
    presentational_tags: &[S],
) -> harmonizer_shared::Result<Element> {
    let mut root = read_document(path)?;
    strip_namespaces(&mut root);
    flatten_tags(&mut root, presentational_tags);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_record_normalizes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("A.xml");
        std::fs::write(
            &path,
            r#"<Person xmlns="http://www.biographien.ac.at" Nummer="A.xml"><Text><b>Abel</b> O.</Text></Person>"#,
        )
        .expect("write");

        let root = load_record(&path, &["b"]).expect("load");
        assert!(root.attr("xmlns").is_none());
        assert_eq!(root.child("Text").and_then(|t| t.text.as_deref()), Some("Abel O."));
    }

    #[test]
    fn load_record_reports_missing_file() {
        let err = load_record(std::path::Path::new("/nonexistent/harmonizer/A.xml"), &["b"])
            .unwrap_err();
        assert!(matches!(err, harmonizer_shared::HarmonizerError::Io { .. }));
    }
}
