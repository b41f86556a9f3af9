//! Markup parsing into an owned [`Element`] tree via `quick-xml`.
//!
//! Comments, processing instructions, the XML declaration, and any DOCTYPE
//! are dropped; only elements, attributes, and character data survive.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument};

use harmonizer_shared::{HarmonizerError, Result};

use crate::tree::Element;

/// Parse a document string into its root element.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            HarmonizerError::parse(format!(
                "malformed markup at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let el = element_from_start(&start)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| HarmonizerError::parse("unexpected closing tag"))?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| HarmonizerError::parse(format!("undecodable text: {e}")))?;
                push_text(&mut stack, &text);
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| HarmonizerError::parse(format!("undecodable CDATA: {e}")))?;
                push_text(&mut stack, text);
            }
            Event::DocType(_) => debug!("dropping DOCTYPE declaration"),
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(HarmonizerError::parse(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| HarmonizerError::parse("document has no root element"))
}

/// Read and parse a document from disk.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_document(path: &Path) -> Result<Element> {
    let bytes = std::fs::read(path).map_err(|e| HarmonizerError::io(path, e))?;
    let content = String::from_utf8(bytes).map_err(|e| {
        HarmonizerError::parse(format!("{} is not valid UTF-8: {e}", path.display()))
    })?;
    parse_document(&content)
        .map_err(|e| HarmonizerError::parse(format!("{}: {e}", path.display())))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut el = Element::new(name);

    for attr in start.attributes() {
        let attr = attr
            .map_err(|e| HarmonizerError::parse(format!("bad attribute on <{}>: {e}", el.name)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| HarmonizerError::parse(format!("bad attribute value {key}: {e}")))?;
        el.attributes.push((key, value.into_owned()));
    }

    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None if root.is_some() => {
            return Err(HarmonizerError::parse(format!(
                "second root element <{}>",
                el.name
            )));
        }
        None => *root = Some(el),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    // Character data outside the root element is insignificant whitespace.
    let Some(current) = stack.last_mut() else {
        return;
    };
    let slot = match current.children.last_mut() {
        Some(last) => &mut last.tail,
        None => &mut current.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}
