//! Loading description documents from disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;
use walkdir::WalkDir;

use stacforge_shared::{Result, StacForgeError};

use crate::model::DescriptionDocument;

/// File extensions recognized as description documents.
const DESCRIPTION_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Identity of one description file.
///
/// The tree and the merge cache refer to documents by this identity and load
/// the content from the [`DescriptionStore`] when needed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptionFile(PathBuf);

impl DescriptionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for DescriptionFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for DescriptionFile {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// Reads description files. Reads are blocking and never cached here.
#[derive(Debug, Default)]
pub struct DescriptionStore {
    loads: AtomicUsize,
}

impl DescriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All description files below `root`, sorted by path.
    pub fn discover(&self, root: impl AsRef<Path>) -> Result<Vec<DescriptionFile>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(StacForgeError::description_load(
                root,
                "description root is not a directory",
            ));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| StacForgeError::description_load(root, e.to_string()))?;
            if entry.file_type().is_file() && is_description(entry.path()) {
                files.push(DescriptionFile::new(entry.into_path()));
            }
        }
        files.sort();

        debug!(root = %root.display(), count = files.len(), "discovered description files");
        Ok(files)
    }

    /// Read and parse one description file.
    pub fn load(&self, file: &DescriptionFile) -> Result<DescriptionDocument> {
        self.loads.fetch_add(1, Ordering::Relaxed);

        let content = std::fs::read_to_string(file.path())
            .map_err(|e| StacForgeError::description_load(file.path(), e.to_string()))?;

        parse_document(&content)
            .map_err(|e| StacForgeError::description_load(file.path(), e.to_string()))
    }

    /// Number of files read so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

/// Parse YAML text into a document. An empty or comment-only file is an
/// empty document.
pub fn parse_document(content: &str) -> std::result::Result<DescriptionDocument, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    if value.is_null() {
        return Ok(DescriptionDocument::default());
    }
    serde_yaml::from_value(value)
}

fn is_description(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DESCRIPTION_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_yaml_files_recursively() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("badc/faam")).unwrap();
        std::fs::write(tmp.path().join("root.yml"), "paths: [/]\n").unwrap();
        std::fs::write(tmp.path().join("badc/faam/faam.yaml"), "paths: [/badc/faam]\n").unwrap();
        std::fs::write(tmp.path().join("badc/README.md"), "not a description").unwrap();

        let store = DescriptionStore::new();
        let files = store.discover(tmp.path()).expect("discover");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_description(f.path())));
    }

    #[test]
    fn missing_root_is_a_load_error() {
        let store = DescriptionStore::new();
        let err = store.discover("/definitely/not/here").unwrap_err();
        assert!(matches!(err, StacForgeError::DescriptionLoad { .. }));
    }

    #[test]
    fn load_parses_and_counts() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("d.yml");
        std::fs::write(
            &path,
            "paths: [/a]\nasset:\n  extraction_methods:\n    - method: regex\n",
        )
        .unwrap();

        let store = DescriptionStore::new();
        let doc = store.load(&DescriptionFile::new(&path)).expect("load");
        assert_eq!(doc.paths, Some(vec!["/a".to_string()]));
        let asset = doc.asset.expect("asset section");
        assert_eq!(asset.extraction_methods.map(|m| m.len()), Some(1));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn unparsable_file_is_a_load_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("broken.yml");
        std::fs::write(&path, "paths: [unterminated\n").unwrap();

        let store = DescriptionStore::new();
        let err = store.load(&DescriptionFile::new(&path)).unwrap_err();
        match err {
            StacForgeError::DescriptionLoad { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_file_is_an_empty_document() {
        assert_eq!(parse_document("").expect("parse"), DescriptionDocument::default());
        assert_eq!(
            parse_document("# nothing here\n").expect("parse"),
            DescriptionDocument::default()
        );
    }
}
