//! Path-indexed tree of description files.
//!
//! Each node is one path segment. A node may carry the description file
//! registered at exactly that path; resolving a dataset path walks from the
//! root and collects every file met on the way, so the result is ordered
//! general → specific.

use std::collections::BTreeMap;

use tracing::{info, warn};

use stacforge_shared::Result;

use crate::store::{DescriptionFile, DescriptionStore};

/// Root of the tree.
const ROOT: &str = "/";

/// Normalize a dataset path or path prefix for tree insertion and lookup.
///
/// Identifiers not starting with `/` are rooted by prepending one, so remote
/// identifiers such as `gs://bucket/object` resolve against the tree root.
/// Trailing separators are removed except for the root itself.
pub fn normalize_path(path: &str) -> String {
    let rooted = if path.starts_with(ROOT) {
        path.to_string()
    } else {
        format!("{ROOT}{path}")
    };

    match rooted.trim_end_matches('/') {
        "" => ROOT.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Non-empty segments of a normalized path. The root has none.
pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

// ---------------------------------------------------------------------------
// DescriptionNode
// ---------------------------------------------------------------------------

/// One path segment in the tree.
#[derive(Debug, Default)]
pub struct DescriptionNode {
    children: BTreeMap<String, DescriptionNode>,
    description: Option<DescriptionFile>,
}

impl DescriptionNode {
    /// The description file registered at exactly this node, if any.
    pub fn description(&self) -> Option<&DescriptionFile> {
        self.description.as_ref()
    }

    /// Child node for one path segment.
    pub fn child(&self, segment: &str) -> Option<&DescriptionNode> {
        self.children.get(segment)
    }
}

// ---------------------------------------------------------------------------
// DescriptionTree
// ---------------------------------------------------------------------------

/// Index from dataset path prefixes to the description files governing them.
#[derive(Debug, Default)]
pub struct DescriptionTree {
    root: DescriptionNode,
    registered: usize,
}

impl DescriptionTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree registering every file under each of its declared `paths`.
    ///
    /// Fails on the first file that cannot be loaded.
    pub fn from_files(store: &DescriptionStore, files: &[DescriptionFile]) -> Result<Self> {
        let mut tree = Self::new();

        for file in files {
            let document = store.load(file)?;
            for path in document.paths.unwrap_or_default() {
                info!(file = %file, path = %normalize_path(&path), "adding description to tree");
                tree.insert(&path, file.clone());
            }
        }

        Ok(tree)
    }

    /// Register `file` at the normalized `prefix`.
    ///
    /// A file already registered at the same prefix is replaced.
    pub fn insert(&mut self, prefix: &str, file: DescriptionFile) {
        let normalized = normalize_path(prefix);

        let mut node = &mut self.root;
        for segment in segments(&normalized) {
            node = node.children.entry(segment.to_string()).or_default();
        }

        match node.description.replace(file) {
            Some(previous) => {
                let current = node.description.as_ref().map(ToString::to_string);
                warn!(
                    path = %normalized,
                    %previous,
                    current = current.as_deref().unwrap_or_default(),
                    "path already described, replacing"
                );
            }
            None => self.registered += 1,
        }
    }

    /// Every file registered at an ancestor of `path` (inclusive), root first.
    pub fn resolve_chain(&self, path: &str) -> Vec<DescriptionFile> {
        let normalized = normalize_path(path);

        let mut chain: Vec<DescriptionFile> = self.root.description.iter().cloned().collect();
        let mut node = &self.root;
        for segment in segments(&normalized) {
            match node.children.get(segment) {
                Some(child) => {
                    node = child;
                    chain.extend(node.description.iter().cloned());
                }
                None => break,
            }
        }

        chain
    }

    /// The root node.
    pub fn root(&self) -> &DescriptionNode {
        &self.root
    }

    /// Number of distinct paths carrying a description.
    pub fn len(&self) -> usize {
        self.registered
    }

    /// Whether no path carries a description.
    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }
}
