//! Identity resolution strategies for secondary corpus files.
//!
//! A secondary file does not always carry the external identifier on its own
//! root. Strategies are tried in priority order; the first one that yields a
//! non-blank identifier wins.

use std::path::{Path, PathBuf};

use harmonizer_markup::{Element, read_document, strip_namespaces};
use harmonizer_shared::vocab::attrs;
use harmonizer_shared::{ONLINE_SUFFIX, RECORD_EXTENSION, record_stem};
use tracing::debug;

/// Suffix of the registry companion file.
pub const REGISTRY_COMPANION_SUFFIX: &str = "-Reg";

/// Suffix of the online companion file.
pub const ONLINE_COMPANION_SUFFIX: &str = "-online";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A secondary file under inspection.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    /// Parsed, namespace-stripped root.
    pub root: &'a Element,
}

impl SourceFile<'_> {
    /// File stem without the `_online` variant suffix.
    pub fn base(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = record_stem(&name);
        stem.strip_suffix(ONLINE_SUFFIX).unwrap_or(stem).to_string()
    }

    /// Path of a companion file `<base><suffix>.xml` in the same directory.
    pub fn companion(&self, suffix: &str) -> PathBuf {
        let file = format!("{}{suffix}{RECORD_EXTENSION}", self.base());
        match self.path.parent() {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}

/// One way of recovering the external identifier of a secondary file.
pub trait IdentityStrategy: Send + Sync {
    /// Return the identifier, or `None` to fall through to the next strategy.
    fn resolve(&self, source: &SourceFile<'_>) -> Option<String>;

    /// Strategy name for tracing and build reports.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Built-in strategies
// ---------------------------------------------------------------------------

/// The external-id attribute on the file's own root.
pub struct ExplicitAttribute;

impl IdentityStrategy for ExplicitAttribute {
    fn resolve(&self, source: &SourceFile<'_>) -> Option<String> {
        external_id(source.root)
    }

    fn name(&self) -> &str {
        "explicit-attribute"
    }
}

/// The external-id attribute on the `<base>-Reg.xml` registry companion.
pub struct RegistryCompanion;

impl IdentityStrategy for RegistryCompanion {
    fn resolve(&self, source: &SourceFile<'_>) -> Option<String> {
        companion_external_id(&source.companion(REGISTRY_COMPANION_SUFFIX))
    }

    fn name(&self) -> &str {
        "registry-companion"
    }
}

/// The external-id attribute on the `<base>-online.xml` companion.
pub struct OnlineCompanion;

impl IdentityStrategy for OnlineCompanion {
    fn resolve(&self, source: &SourceFile<'_>) -> Option<String> {
        let path = source.companion(ONLINE_COMPANION_SUFFIX);
        if path == source.path {
            return None;
        }
        companion_external_id(&path)
    }

    fn name(&self) -> &str {
        "online-companion"
    }
}

fn external_id(root: &Element) -> Option<String> {
    root.attr(attrs::EXTERNAL_ID)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn companion_external_id(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match read_document(path) {
        Ok(mut root) => {
            strip_namespaces(&mut root);
            external_id(&root)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable companion file");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds identity strategies in priority order.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn IdentityStrategy>>,
}

impl StrategyRegistry {
    /// Built-in strategies: explicit attribute, registry companion, online companion.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(ExplicitAttribute),
                Box::new(RegistryCompanion),
                Box::new(OnlineCompanion),
            ],
        }
    }

    pub fn from_strategies(strategies: Vec<Box<dyn IdentityStrategy>>) -> Self {
        Self { strategies }
    }

    /// Strategy names in the order they are tried.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve an identifier; returns it with the name of the winning strategy.
    pub fn resolve(&self, source: &SourceFile<'_>) -> Option<(String, &str)> {
        self.strategies
            .iter()
            .find_map(|s| s.resolve(source).map(|id| (id, s.name())))
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, xml: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, xml).expect("write fixture");
        path
    }

    #[test]
    fn default_order() {
        let registry = StrategyRegistry::new();
        assert_eq!(
            registry.names(),
            vec!["explicit-attribute", "registry-companion", "online-companion"]
        );
    }

    #[test]
    fn explicit_attribute_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "A_online.xml", "<Person/>");
        write(dir.path(), "A-Reg.xml", r#"<Person eoebl_id="from-reg"/>"#);
        let root = Element::new("Person").with_attr("eoebl_id", "own");

        let source = SourceFile { path: &path, root: &root };
        let registry = StrategyRegistry::new();
        let (id, strategy) = registry.resolve(&source).expect("resolved");
        assert_eq!(id, "own");
        assert_eq!(strategy, "explicit-attribute");
    }

    #[test]
    fn falls_back_to_registry_then_online_companion() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "A_online.xml", "<Person/>");
        write(dir.path(), "A-online.xml", r#"<Person eoebl_id="from-online"/>"#);
        let root = Element::new("Person").with_attr("eoebl_id", "  ");
        let source = SourceFile { path: &path, root: &root };
        let registry = StrategyRegistry::new();

        let (id, strategy) = registry.resolve(&source).expect("resolved");
        assert_eq!(id, "from-online");
        assert_eq!(strategy, "online-companion");

        write(
            dir.path(),
            "A-Reg.xml",
            r#"<Person xmlns="http://www.biographien.ac.at" eoebl_id="from-reg"/>"#,
        );
        let (id, strategy) = registry.resolve(&source).expect("resolved");
        assert_eq!(id, "from-reg");
        assert_eq!(strategy, "registry-companion");
    }

    #[test]
    fn unresolved_without_companions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "B.xml", "<Person/>");
        let root = Element::new("Person");
        let source = SourceFile { path: &path, root: &root };
        let registry = StrategyRegistry::new();
        assert!(registry.resolve(&source).is_none());
    }

    #[test]
    fn companion_paths_use_base_without_online_suffix() {
        let root = Element::new("Person");
        let source = SourceFile {
            path: Path::new("/corpus/Abel_Othenio_online.xml"),
            root: &root,
        };
        assert_eq!(source.base(), "Abel_Othenio");
        assert_eq!(
            source.companion(REGISTRY_COMPANION_SUFFIX),
            PathBuf::from("/corpus/Abel_Othenio-Reg.xml")
        );
    }
}
