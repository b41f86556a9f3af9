//! Serialization boundary: element tree back to markup via `quick-xml`.
//!
//! Every emitted document starts with a fixed processing-instruction header
//! that declares the encoding and points editors at the RELAX NG schema.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use harmonizer_shared::{HarmonizerError, Result};

use crate::tree::Element;

/// Build the document header for the given schema location.
pub fn document_header(schema_href: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <?xml-model href=\"{schema_href}\" type=\"application/xml\" \
         schematypens=\"http://relaxng.org/ns/structure/1.0\"?>\n"
    )
}

/// Serialize an element (and its subtree) without any header.
pub fn serialize_element(root: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| HarmonizerError::Serialize(format!("non UTF-8 output: {e}")))
}

/// Serialize a complete output document: header, root element, trailing newline.
pub fn serialize_document(root: &Element, schema_href: &str) -> Result<String> {
    let body = serialize_element(root)?;
    Ok(format!("{}{body}\n", document_header(schema_href)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = el.text.as_deref().unwrap_or_default();
    if text.is_empty() && el.children.is_empty() {
        emit(writer, Event::Empty(start))?;
    } else {
        emit(writer, Event::Start(start))?;
        if !text.is_empty() {
            emit(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in &el.children {
            write_element(writer, child)?;
        }
        emit(writer, Event::End(BytesEnd::new(el.name.as_str())))?;
    }

    if let Some(tail) = el.tail.as_deref().filter(|t| !t.is_empty()) {
        emit(writer, Event::Text(BytesText::new(tail)))?;
    }
    Ok(())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| HarmonizerError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_document;

    #[test]
    fn header_names_schema() {
        let header = document_header("schema.rng");
        assert!(header.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(header.contains("href=\"schema.rng\""));
        assert!(header.ends_with("?>\n"));
    }

    #[test]
    fn serializes_empty_and_nested_elements() {
        let el = Element::new("Person")
            .with_attr("Nummer", "A.xml")
            .with_child(Element::new("Geschlecht").with_attr("Type", "männlich"));
        let out = serialize_element(&el).expect("serialize");
        assert_eq!(
            out,
            r#"<Person Nummer="A.xml"><Geschlecht Type="männlich"/></Person>"#
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        let el = Element::new("p").with_attr("t", "a & \"b\"").with_text("x < y");
        let out = serialize_element(&el).expect("serialize");
        assert!(out.contains("a &amp; &quot;b&quot;"));
        assert!(out.contains("x &lt; y"));
    }

    #[test]
    fn reparse_preserves_tree() {
        let source = r#"<Person Nummer="A.xml"><Text>born <i>1875</i> in Vienna</Text><Vita/></Person>"#;
        let doc = parse_document(source).expect("parse");
        let out = serialize_element(&doc).expect("serialize");
        assert_eq!(out, source);
    }

    #[test]
    fn document_starts_with_header_and_drops_doctype() {
        let doc = parse_document("<!DOCTYPE Person SYSTEM \"oebl.dtd\"><Person/>").expect("parse");
        let out = serialize_document(&doc, "schema.rng").expect("serialize");
        assert!(out.starts_with("<?xml version"));
        assert!(!out.contains("DOCTYPE"));
        assert!(out.ends_with("<Person/>\n"));
    }
}
