//! Builds the [`SecondaryCorpusIndex`] from one or more corpus roots.

use std::path::{Path, PathBuf};

use harmonizer_markup::load_record;
use harmonizer_shared::{Result, VariantKind};
use tracing::{debug, info, instrument, warn};

use crate::index::{IndexReport, IndexedSource, SecondaryCorpusIndex, SecondaryFragments};
use crate::keys::FileKeyNormalizer;
use crate::scan::{is_auxiliary_file, scan_corpus};
use crate::strategies::{SourceFile, StrategyRegistry};

/// Walks secondary corpus roots and indexes every classifiable file.
pub struct IndexBuilder {
    roots: Vec<PathBuf>,
    strategies: StrategyRegistry,
    keys: FileKeyNormalizer,
    presentational_tags: Vec<String>,
}

impl IndexBuilder {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            strategies: StrategyRegistry::new(),
            keys: FileKeyNormalizer::new(),
            presentational_tags: Vec::new(),
        }
    }

    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_keys(mut self, keys: FileKeyNormalizer) -> Self {
        self.keys = keys;
        self
    }

    /// Tags flattened out of fragments before they are stored.
    pub fn with_presentational_tags(mut self, tags: Vec<String>) -> Self {
        self.presentational_tags = tags;
        self
    }

    /// Scan all roots and build the index.
    ///
    /// Fails only when a root cannot be walked. Files that cannot be parsed
    /// or classified are logged, counted, and left out.
    #[instrument(skip_all, fields(roots = self.roots.len()))]
    pub fn build(self) -> Result<(SecondaryCorpusIndex, IndexReport)> {
        let mut index = SecondaryCorpusIndex::default();
        let mut report = IndexReport::default();

        for root in &self.roots {
            let files = scan_corpus(root, is_auxiliary_file)?;
            info!(root = %root.display(), files = files.len(), "indexing secondary corpus");
            for path in files {
                report.files_scanned += 1;
                self.index_file(&mut index, &mut report, &path);
            }
        }

        report.keys = index.entries.len();
        index.keys = self.keys;

        info!(
            indexed = report.indexed,
            keys = report.keys,
            unclassified = report.unclassified,
            unparsable = report.unparsable,
            collisions = report.collisions,
            "secondary index built"
        );
        Ok((index, report))
    }

    fn index_file(&self, index: &mut SecondaryCorpusIndex, report: &mut IndexReport, path: &Path) {
        let root = match load_record(path, &self.presentational_tags) {
            Ok(root) => root,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unparsable secondary file");
                report.unparsable += 1;
                return;
            }
        };

        let Some(fragments) = SecondaryFragments::extract(&root) else {
            warn!(path = %path.display(), "no publication block, cannot classify");
            report.unclassified += 1;
            return;
        };
        let kind = fragments.variant();

        let source = SourceFile { path, root: &root };
        let identity = match self.strategies.resolve(&source) {
            Some((id, strategy)) => {
                *report.resolved_by.entry(strategy.to_string()).or_default() += 1;
                Some(id)
            }
            None => {
                report.unresolved_identity += 1;
                None
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_key = self.keys.normalize(&file_name);

        let indexed = IndexedSource {
            path: path.to_path_buf(),
            fragments,
        };

        let mut keys = Vec::with_capacity(2);
        keys.extend(identity);
        if !keys.contains(&file_key) {
            keys.push(file_key);
        }

        let mut inserted = false;
        for key in keys {
            let entry = index.entries.entry(key.clone()).or_default();
            if entry.insert(kind, indexed.clone()) {
                inserted = true;
            } else {
                let kept = entry.get(kind).map(|s| s.path.display().to_string());
                warn!(
                    key = %key,
                    variant = %kind,
                    kept = kept.as_deref().unwrap_or_default(),
                    ignored = %path.display(),
                    "index collision, keeping first source"
                );
                report.collisions += 1;
            }
        }

        if inserted {
            report.indexed += 1;
            match kind {
                VariantKind::Print => report.print_sources += 1,
                VariantKind::Online => report.online_sources += 1,
            }
            debug!(path = %path.display(), variant = %kind, "indexed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, xml: &str) {
        std::fs::write(dir.join(name), xml).expect("write fixture");
    }

    fn person(ext_id: Option<&str>, block: &str, birth: &str) -> String {
        let attr = ext_id
            .map(|id| format!(r#" eoebl_id="{id}""#))
            .unwrap_or_default();
        format!(
            r#"<Person xmlns="http://www.biographien.ac.at"{attr}><Lexikonartikel><PubInfo>{block}</PubInfo><Vita><Geburt>{birth}</Geburt></Vita></Lexikonartikel></Person>"#
        )
    }

    #[test]
    fn indexes_under_identity_and_file_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "Abel_Othenio_1875_1946_online.xml",
            &person(Some("abel"), "ÖBL Online-Edition", "1875 Wien"),
        );
        write(
            dir.path(),
            "Abel_Othenio_1875_1946.xml",
            &person(None, "ÖBL 1815-1950, Bd. 1", "1875"),
        );

        let (index, report) = IndexBuilder::new(vec![dir.path().to_path_buf()])
            .build()
            .expect("build");

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.online_sources, 1);
        assert_eq!(report.print_sources, 1);
        assert_eq!(report.collisions, 0);

        let by_id = index.get("abel").expect("identity key");
        assert!(by_id.online.is_some());
        assert!(by_id.print.is_none());

        let by_file = index.get("Abel_Othenio_1875_1946").expect("file key");
        assert!(by_file.online.is_some());
        assert!(by_file.print.is_some());
        assert_eq!(
            by_file
                .authoritative()
                .and_then(|s| s.fragments.birth.as_ref())
                .map(|b| b.text_content()),
            Some("1875 Wien".to_string())
        );
    }

    #[test]
    fn collisions_keep_first_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "A.xml", &person(Some("dup"), "Bd. 1", "first"));
        write(dir.path(), "B.xml", &person(Some("dup"), "Bd. 2", "second"));

        let (index, report) = IndexBuilder::new(vec![dir.path().to_path_buf()])
            .build()
            .expect("build");

        assert_eq!(report.collisions, 1);
        let entry = index.get("dup").expect("entry");
        let print = entry.print.as_ref().expect("print");
        assert!(print.path.ends_with("A.xml"));
        assert!(index.get("B").is_some());
    }

    #[test]
    fn unclassifiable_and_unparsable_files_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "NoBlock.xml", "<Person><Lexikonartikel/></Person>");
        write(dir.path(), "Broken.xml", "<Person><Lexikonartikel></Person>");
        write(dir.path(), "Good.xml", &person(None, "Bd. 3", "1900"));
        write(dir.path(), "Good-Reg.xml", r#"<Person eoebl_id="good-id"/>"#);

        let (index, report) = IndexBuilder::new(vec![dir.path().to_path_buf()])
            .build()
            .expect("build");

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.unclassified, 1);
        assert_eq!(report.unparsable, 1);
        assert_eq!(report.indexed, 1);
        assert_eq!(report.resolved_by.get("registry-companion"), Some(&1));
        assert!(index.get("NoBlock").is_none());
        assert!(index.get("good-id").is_some());
    }

    #[test]
    fn file_key_lookup_without_identifiers() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Ebner_Anna_online.xml", &person(None, "online", "1900"));

        let (index, report) = IndexBuilder::new(vec![dir.path().to_path_buf()])
            .build()
            .expect("build");

        assert_eq!(report.unresolved_identity, 1);
        let key = index.normalize_key("Ebner_Anna.xml");
        let source = index
            .variant_source(&[key.as_str()], VariantKind::Online)
            .expect("online source");
        assert!(source.path.ends_with("Ebner_Anna_online.xml"));
    }

    #[test]
    fn missing_root_aborts() {
        let result = IndexBuilder::new(vec![PathBuf::from("/nonexistent/harmonizer/secondary")])
            .build();
        assert!(matches!(result, Err(e) if e.is_resource_failure()));
    }
}
