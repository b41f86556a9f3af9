//! Owned element tree with ElementTree-style text placement.
//!
//! Character data lives in two slots: `text` (before the first child) and
//! `tail` (after the element's end tag, before the next sibling). This keeps
//! mixed content in document order without a separate text-node type.

/// A single element with its attributes, text, and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name (namespace prefix included until stripped).
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Text before the first child.
    pub text: Option<String>,
    /// Text after this element's end tag.
    pub tail: Option<String>,
    /// Child elements.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Keep only the attributes whose key passes `keep`.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attributes.retain(|(k, _)| keep(k));
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        for child in &mut self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_mut(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.visit(&mut |el| {
            if el.name == name {
                out.push(el);
            }
        });
        out
    }

    /// Whether any descendant carries the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Visit every descendant (not `self`) in document order.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        for child in &self.children {
            f(child);
            child.visit(f);
        }
    }

    /// Visit `self` and every descendant mutably, parents before children.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    /// All character data inside this element in document order (own tail excluded).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }

    /// Remove every direct child matching `pred`, returning them in order.
    pub fn remove_children(&mut self, mut pred: impl FnMut(&Element) -> bool) -> Vec<Element> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.children).into_iter().partition(|c| pred(c));
        self.children = kept;
        removed
    }

    /// Replace the first direct child named `name`, keeping its tail.
    ///
    /// Returns `false` (and leaves the tree untouched) if no such child exists.
    pub fn replace_child(&mut self, name: &str, mut replacement: Element) -> bool {
        match self.children.iter_mut().find(|c| c.name == name) {
            Some(slot) => {
                replacement.tail = slot.tail.take();
                *slot = replacement;
                true
            }
            None => false,
        }
    }
}
