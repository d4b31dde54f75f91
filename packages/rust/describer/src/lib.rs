//! Hierarchical description resolution.
//!
//! Operators author YAML description files, each declaring the dataset path
//! prefixes it governs. For any dataset path this crate finds every file
//! governing an ancestor of that path and merges them general → specific.
//!
//! - [`DescriptionStore`] — loads description files
//! - [`DescriptionTree`] — path prefix → file index
//! - [`merge`] — the typed merge of a root-first document chain
//! - [`MergeCache`] — bounded LRU over merge results
//! - [`CollectionDescriptions`] — the above wired together

pub mod cache;
pub mod merge;
pub mod model;
pub mod store;
pub mod tree;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use stacforge_shared::{Result, StacForgeError};

pub use cache::MergeCache;
pub use merge::{DEFAULT_METHOD, merge};
pub use model::{
    Category, CollectionDescription, DescriptionDocument, DescriptionSection, MemberOfLink,
    SectionDescription,
};
pub use store::{DescriptionFile, DescriptionStore};
pub use tree::{DescriptionTree, normalize_path};

/// Holds the description tree and resolves merged descriptions for paths.
#[derive(Debug)]
pub struct CollectionDescriptions {
    tree: DescriptionTree,
    cache: MergeCache,
}

impl CollectionDescriptions {
    /// Load every description file below `root`.
    pub fn from_root(root: impl AsRef<Path>, cache_capacity: usize) -> Result<Self> {
        let store = DescriptionStore::new();
        let files = store.discover(root.as_ref())?;
        Self::from_files(store, files, cache_capacity)
    }

    /// Build from an explicit list of description files.
    pub fn from_files(
        store: DescriptionStore,
        files: Vec<DescriptionFile>,
        cache_capacity: usize,
    ) -> Result<Self> {
        if files.is_empty() {
            return Err(StacForgeError::config(
                "no description files found, check description_root in your configuration",
            ));
        }

        let tree = DescriptionTree::from_files(&store, &files)?;
        info!(files = files.len(), paths = tree.len(), "description tree built");

        Ok(Self {
            tree,
            cache: MergeCache::new(store, cache_capacity)?,
        })
    }

    /// Recompute on every cache hit and fail on mismatch.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.cache = self.cache.with_verification(verify);
        self
    }

    /// Description files governing `uri`, root first.
    pub fn resolve_files(&self, uri: &str) -> Result<Vec<DescriptionFile>> {
        let files = self.tree.resolve_chain(uri);
        if files.is_empty() {
            return Err(StacForgeError::NoDescriptionFound {
                uri: uri.to_string(),
            });
        }
        Ok(files)
    }

    /// The merged description for `uri`.
    pub fn get_description(&self, uri: &str) -> Result<Arc<CollectionDescription>> {
        self.get_description_at(uri, None)
    }

    /// The merged description for `uri`, looked up at `description_path`
    /// instead of the uri when given.
    pub fn get_description_at(
        &self,
        uri: &str,
        description_path: Option<&str>,
    ) -> Result<Arc<CollectionDescription>> {
        let lookup = description_path.unwrap_or(uri);
        let files = match self.resolve_files(lookup) {
            Ok(files) => files,
            Err(StacForgeError::NoDescriptionFound { .. }) => {
                return Err(StacForgeError::NoDescriptionFound {
                    uri: uri.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        debug!(uri, lookup, files = files.len(), "resolved description chain");
        self.cache.get(&files)
    }

    pub fn tree(&self) -> &DescriptionTree {
        &self.tree
    }

    pub fn cache(&self) -> &MergeCache {
        &self.cache
    }
}
