//! File-name based lookup keys.

use std::collections::BTreeMap;
use std::path::Path;

use harmonizer_overlay::read_key_values;
use harmonizer_shared::{ONLINE_SUFFIX, PRINT_SUFFIX, Result, record_stem};
use tracing::debug;

/// Derives the normalized file key of a record.
///
/// `Abel_Othenio_1875_1946_online.xml` and `Abel_Othenio_1875_1946.xml` both
/// normalize to `Abel_Othenio_1875_1946`. The optional alias table maps
/// normalized keys whose spelling differs between the corpora onto one key.
#[derive(Debug, Clone, Default)]
pub struct FileKeyNormalizer {
    aliases: BTreeMap<String, String>,
}

impl FileKeyNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: BTreeMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(from, to)| (strip_variant(&from).to_string(), strip_variant(&to).to_string()))
            .collect();
        Self { aliases }
    }

    /// Load the alias table from a `key=value` file.
    pub fn from_alias_table(path: &Path) -> Result<Self> {
        let aliases = read_key_values(path)?;
        debug!(path = %path.display(), aliases = aliases.len(), "alias table loaded");
        Ok(Self::with_aliases(aliases))
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Normalize a file name or record identity to its lookup key.
    pub fn normalize(&self, name: &str) -> String {
        let key = strip_variant(name);
        match self.aliases.get(key) {
            Some(alias) => alias.clone(),
            None => key.to_string(),
        }
    }
}

/// Strip the extension and one trailing variant suffix.
fn strip_variant(name: &str) -> &str {
    let stem = record_stem(name.trim());
    stem.strip_suffix(ONLINE_SUFFIX)
        .or_else(|| stem.strip_suffix(PRINT_SUFFIX))
        .unwrap_or(stem)
}
