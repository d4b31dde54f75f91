//! Description documents as loaded from disk, and the resolved view produced
//! by merging them.

use serde::{Deserialize, Serialize};

use stacforge_shared::{GeneratorType, MethodConfig};

use crate::tree::{normalize_path, segments};

// ---------------------------------------------------------------------------
// Raw documents
// ---------------------------------------------------------------------------

/// A `{label, regex}` category matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub regex: String,
}

/// A declared parent relationship for records of this section.
///
/// ```yaml
/// member_of:
///   - type: collection
///     key: platform
///     id:
///       - method: default
///         inputs: { defaults: { collection_id: faam } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberOfLink {
    /// Parent record type; its `<type>_id` key carries the parent id.
    #[serde(rename = "type")]
    pub link_type: GeneratorType,
    /// Grouping key recorded against the parent id.
    pub key: String,
    /// Extraction chain yielding the parent id.
    #[serde(default)]
    pub id: Vec<MethodConfig>,
}

/// One `asset` / `item` / `collection` section, exactly as written.
///
/// Every field is optional so a merge can tell "not mentioned" from "empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionSection {
    #[serde(default)]
    pub id: Option<MethodConfig>,
    #[serde(default)]
    pub extraction_methods: Option<Vec<MethodConfig>>,
    #[serde(default)]
    pub post_extraction_methods: Option<Vec<MethodConfig>>,
    #[serde(default)]
    pub member_of: Option<Vec<MemberOfLink>>,
}

/// A description file as parsed. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionDocument {
    /// Dataset path prefixes this document governs.
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    #[serde(default)]
    pub asset: Option<DescriptionSection>,
    #[serde(default)]
    pub item: Option<DescriptionSection>,
    #[serde(default)]
    pub collection: Option<DescriptionSection>,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
}

impl DescriptionDocument {
    /// Take the section for `ty` out of the document.
    pub(crate) fn take_section(&mut self, ty: GeneratorType) -> Option<DescriptionSection> {
        match ty {
            GeneratorType::Asset => self.asset.take(),
            GeneratorType::Item => self.item.take(),
            GeneratorType::Collection => self.collection.take(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved view
// ---------------------------------------------------------------------------

/// A fully resolved section: lists are concrete, only `id` may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<MethodConfig>,
    pub extraction_methods: Vec<MethodConfig>,
    pub post_extraction_methods: Vec<MethodConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub member_of: Vec<MemberOfLink>,
}

impl From<DescriptionSection> for SectionDescription {
    fn from(section: DescriptionSection) -> Self {
        Self {
            id: section.id,
            extraction_methods: section.extraction_methods.unwrap_or_default(),
            post_extraction_methods: section.post_extraction_methods.unwrap_or_default(),
            member_of: section.member_of.unwrap_or_default(),
        }
    }
}

/// The effective description for a dataset path, merged general → specific.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionDescription {
    pub paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<SectionDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<SectionDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<SectionDescription>,
    pub categories: Vec<Category>,
}

impl CollectionDescription {
    /// The section configuring records of type `ty`.
    pub fn section(&self, ty: GeneratorType) -> Option<&SectionDescription> {
        match ty {
            GeneratorType::Asset => self.asset.as_ref(),
            GeneratorType::Item => self.item.as_ref(),
            GeneratorType::Collection => self.collection.as_ref(),
        }
    }

    pub(crate) fn section_slot(&mut self, ty: GeneratorType) -> &mut Option<SectionDescription> {
        match ty {
            GeneratorType::Asset => &mut self.asset,
            GeneratorType::Item => &mut self.item,
            GeneratorType::Collection => &mut self.collection,
        }
    }

    /// The deepest declared path covering `uri`.
    ///
    /// A path covers `uri` when its segments are a prefix of the uri's
    /// segments. Ties on depth keep the first declared path. Returned with any
    /// trailing separator removed.
    pub fn most_specific_path(&self, uri: &str) -> Option<String> {
        let target = normalize_path(uri);
        let target_segments = segments(&target);

        let mut best: Option<(usize, &str)> = None;
        for path in &self.paths {
            let normalized = normalize_path(path);
            let path_segments = segments(&normalized);
            if !target_segments.starts_with(&path_segments) {
                continue;
            }
            let depth = path_segments.len();
            if best.is_none_or(|(best_depth, _)| depth > best_depth) {
                best = Some((depth, path.as_str()));
            }
        }

        best.map(|(_, path)| match path.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        })
    }
}

impl From<DescriptionDocument> for CollectionDescription {
    fn from(doc: DescriptionDocument) -> Self {
        Self {
            paths: doc.paths.unwrap_or_default(),
            asset: doc.asset.map(Into::into),
            item: doc.item.map(Into::into),
            collection: doc.collection.map(Into::into),
            categories: doc.categories.unwrap_or_default(),
        }
    }
}
