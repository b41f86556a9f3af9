//! Tree-level cleanup passes applied before merging and before serialization.
//!
//! Each pass mutates the tree in place and is safe to run more than once.

use crate::tree::Element;

// ---------------------------------------------------------------------------
// Pass 1: Strip namespaces
// ---------------------------------------------------------------------------

/// Drop namespace prefixes from element and attribute names and remove
/// `xmlns` declarations, so corpora with and without a default namespace
/// can be navigated by local names.
pub fn strip_namespaces(root: &mut Element) {
    root.visit_mut(&mut |el| {
        el.name = local_name(&el.name).to_string();
        el.attributes
            .retain(|(k, _)| k != "xmlns" && !k.starts_with("xmlns:"));
        for (key, _) in &mut el.attributes {
            if key.starts_with("xml:") {
                continue;
            }
            *key = local_name(key).to_string();
        }
    });
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

// ---------------------------------------------------------------------------
// Pass 2: Inter-element whitespace
// ---------------------------------------------------------------------------

/// Clear layout whitespace between elements.
///
/// Only element-only content is touched, and within it only blank slots that
/// contain a line break are emptied. A blank run without a line break, such as
/// the single space in `<i>a</i> <i>b</i>`, is character data and is kept.
pub fn clear_inter_element_whitespace(root: &mut Element) {
    root.visit_mut(&mut |el| {
        if el.children.is_empty() {
            return;
        }
        let element_only = is_blank(&el.text) && el.children.iter().all(|c| is_blank(&c.tail));
        if !element_only {
            return;
        }
        clear_layout(&mut el.text);
        for child in &mut el.children {
            clear_layout(&mut child.tail);
        }
    });
    root.tail = None;
}

fn is_blank(slot: &Option<String>) -> bool {
    slot.as_deref().is_none_or(|t| t.trim().is_empty())
}

fn clear_layout(slot: &mut Option<String>) {
    if slot.as_deref().is_some_and(|t| t.contains('\n')) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_document;
    use crate::writer::serialize_element;

    #[test]
    fn strip_namespaces_handles_default_and_prefixed() {
        let mut doc = parse_document(
            r#"<oebl:Person xmlns:oebl="http://www.biographien.ac.at" oebl:Nummer="A.xml" xml:lang="de"><oebl:Vita/></oebl:Person>"#,
        )
        .expect("parse");
        strip_namespaces(&mut doc);
        assert_eq!(
            serialize_element(&doc).expect("serialize"),
            r#"<Person Nummer="A.xml" xml:lang="de"><Vita/></Person>"#
        );

        let mut doc =
            parse_document(r#"<Person xmlns="http://www.biographien.ac.at"><Vita/></Person>"#)
                .expect("parse");
        strip_namespaces(&mut doc);
        assert!(doc.attributes.is_empty());
    }

    #[test]
    fn clears_indentation_between_elements() {
        let mut doc = parse_document(
            "<Person>\n  <Lexikonartikel>\n    <Hauptbezeichnung>Abel</Hauptbezeichnung>\n  </Lexikonartikel>\n</Person>",
        )
        .expect("parse");
        clear_inter_element_whitespace(&mut doc);
        assert_eq!(
            serialize_element(&doc).expect("serialize"),
            "<Person><Lexikonartikel><Hauptbezeichnung>Abel</Hauptbezeichnung></Lexikonartikel></Person>"
        );
    }

    #[test]
    fn keeps_whitespace_in_mixed_content() {
        let source = "<Text>studied <i>law</i> <i>and</i> medicine</Text>";
        let mut doc = parse_document(source).expect("parse");
        clear_inter_element_whitespace(&mut doc);
        assert_eq!(serialize_element(&doc).expect("serialize"), source);
    }

    #[test]
    fn keeps_spaces_between_inline_siblings() {
        let source = "<Text><i>Abel</i> <i>Othenio</i></Text>";
        let mut doc = parse_document(source).expect("parse");
        let before = doc.text_content();
        clear_inter_element_whitespace(&mut doc);
        assert_eq!(doc.text_content(), before);
        assert_eq!(serialize_element(&doc).expect("serialize"), source);
    }

    #[test]
    fn keeps_spaces_when_mixed_with_layout() {
        let mut doc = parse_document("<Text>\n  <i>a</i> <i>b</i>\n</Text>").expect("parse");
        clear_inter_element_whitespace(&mut doc);
        assert_eq!(
            serialize_element(&doc).expect("serialize"),
            "<Text><i>a</i> <i>b</i></Text>"
        );
    }

    #[test]
    fn keeps_leaf_text() {
        let mut doc = parse_document("<a><b> </b></a>").expect("parse");
        clear_inter_element_whitespace(&mut doc);
        assert_eq!(doc.children[0].text.as_deref(), Some(" "));
    }
}
