//! Flattening of purely presentational inline elements.

use crate::tree::Element;

/// Remove every element named `tag`, splicing its content into the parent.
///
/// The removed element's text joins the preceding sibling's tail (or the
/// parent's text when it is the first child), its children take its place,
/// and its tail follows them. The concatenated character data of the tree is
/// unchanged.
pub fn flatten_tag(el: &mut Element, tag: &str) {
    for child in &mut el.children {
        flatten_tag(child, tag);
    }

    if !el.children.iter().any(|c| c.name == tag) {
        return;
    }

    let old = std::mem::take(&mut el.children);
    let mut out: Vec<Element> = Vec::with_capacity(old.len());

    for child in old {
        if child.name != tag {
            out.push(child);
            continue;
        }
        let Element {
            text,
            tail,
            children,
            ..
        } = child;
        append_after_last(&mut out, &mut el.text, text);
        out.extend(children);
        append_after_last(&mut out, &mut el.text, tail);
    }

    el.children = out;
}

/// Flatten each tag in turn.
pub fn flatten_tags<S: AsRef<str>>(el: &mut Element, tags: &[S]) {
    for tag in tags {
        flatten_tag(el, tag.as_ref());
    }
}

fn append_after_last(out: &mut [Element], lead: &mut Option<String>, text: Option<String>) {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return;
    };
    let slot = match out.last_mut() {
        Some(prev) => &mut prev.tail,
        None => lead,
    };
    slot.get_or_insert_with(String::new).push_str(&text);
}
