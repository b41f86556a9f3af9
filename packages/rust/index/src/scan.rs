//! Deterministic corpus directory traversal.

use std::path::{Path, PathBuf};

use harmonizer_shared::{HarmonizerError, RECORD_EXTENSION, Result};
use walkdir::WalkDir;

/// File-name suffix of cross-reference stubs.
pub const CROSS_REFERENCE_FILE_SUFFIX: &str = "Verweis.xml";

/// File-name suffix of registry companions.
pub const REGISTRY_FILE_SUFFIX: &str = "-Reg.xml";

/// Collect record files under `root`, sorted by path.
///
/// Only `.xml` files are returned; names for which `skip` returns `true` are
/// left out. A missing root or a root that is not a directory is a corpus
/// error. Unreadable entries below the root are logged and skipped.
pub fn scan_corpus(root: &Path, skip: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(HarmonizerError::Corpus(format!(
            "corpus root is not a readable directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(HarmonizerError::Corpus(format!(
                    "cannot walk {}: {e}",
                    root.display()
                )));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable corpus entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(RECORD_EXTENSION) || skip(&name) {
            continue;
        }
        files.push(entry.into_path());
    }

    tracing::debug!(root = %root.display(), files = files.len(), "corpus scanned");
    Ok(files)
}

/// Secondary corpus filter: auxiliary cross-reference and registry files.
pub fn is_auxiliary_file(name: &str) -> bool {
    name.ends_with(CROSS_REFERENCE_FILE_SUFFIX) || name.ends_with(REGISTRY_FILE_SUFFIX)
}

/// Cross-reference stubs in the primary corpus (`*Verweis.xml`).
pub fn is_cross_reference_file(name: &str) -> bool {
    name.ends_with(CROSS_REFERENCE_FILE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sub = dir.path().join("sub");
        std::fs::create_dir_all(&sub).expect("mkdir");
        for name in ["b.xml", "a.xml", "a-Reg.xml", "X_Verweis.xml", "notes.txt"] {
            std::fs::write(dir.path().join(name), "<r/>").expect("write");
        }
        std::fs::write(sub.join("c.xml"), "<r/>").expect("write");

        let files = scan_corpus(dir.path(), is_auxiliary_file).expect("scan");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).expect("prefix").to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.xml"),
                PathBuf::from("b.xml"),
                PathBuf::from("sub/c.xml")
            ]
        );
    }

    #[test]
    fn primary_filter_keeps_registry_names() {
        assert!(is_cross_reference_file("Abel_Verweis.xml"));
        assert!(!is_cross_reference_file("Abel-Reg.xml"));
    }

    #[test]
    fn missing_root_is_corpus_error() {
        let err = scan_corpus(Path::new("/nonexistent/harmonizer/corpus"), |_| false).unwrap_err();
        assert!(err.is_resource_failure());
    }
}
