//! Merging an ordered chain of description documents.
//!
//! Documents are folded left to right, root first, so more specific documents
//! override more general ones:
//!
//! - `paths` is replaced wholesale by the next document's `paths`.
//! - Within a section, `id` is overwritten; `extraction_methods`,
//!   `post_extraction_methods` and `member_of` are appended to. A `default`
//!   method is the exception: its `inputs.defaults` are merged key by key into
//!   the existing `default` entry instead of adding a second one.
//! - `categories` are unioned.
//!
//! Nothing is deduplicated beyond that: merging the same document twice
//! doubles every non-`default` method entry.

use serde_json::Value;

use stacforge_shared::{GeneratorType, MethodConfig};

use crate::model::{CollectionDescription, DescriptionDocument, DescriptionSection, SectionDescription};

/// Method name whose `inputs.defaults` merge instead of appending.
pub const DEFAULT_METHOD: &str = "default";

/// Key under a `default` method's inputs holding the default facet values.
const DEFAULTS_KEY: &str = "defaults";

const SECTIONS: [GeneratorType; 3] = [
    GeneratorType::Asset,
    GeneratorType::Item,
    GeneratorType::Collection,
];

/// Merge `documents`, ordered general → specific, into one description.
///
/// An empty input yields an empty description.
pub fn merge(documents: impl IntoIterator<Item = DescriptionDocument>) -> CollectionDescription {
    let mut documents = documents.into_iter();

    let Some(first) = documents.next() else {
        return CollectionDescription::default();
    };

    documents.fold(CollectionDescription::from(first), |mut description, next| {
        merge_document(&mut description, next);
        description
    })
}

/// Fold one more specific document into `base`.
pub fn merge_document(base: &mut CollectionDescription, mut next: DescriptionDocument) {
    if let Some(paths) = next.paths.take() {
        base.paths = paths;
    }

    for ty in SECTIONS {
        let Some(section) = next.take_section(ty) else {
            continue;
        };
        let slot = base.section_slot(ty);
        match slot {
            Some(existing) => merge_section(existing, section),
            None => *slot = Some(section.into()),
        }
    }

    for category in next.categories.take().unwrap_or_default() {
        if !base.categories.contains(&category) {
            base.categories.push(category);
        }
    }
}

/// Merge one section of a more specific document into the running section.
pub fn merge_section(base: &mut SectionDescription, section: DescriptionSection) {
    if let Some(id) = section.id {
        base.id = Some(id);
    }
    if let Some(methods) = section.extraction_methods {
        merge_methods(&mut base.extraction_methods, methods);
    }
    if let Some(methods) = section.post_extraction_methods {
        merge_methods(&mut base.post_extraction_methods, methods);
    }
    if let Some(links) = section.member_of {
        base.member_of.extend(links);
    }
}

/// Append `overrides` to `base`, folding `default` entries into the base's
/// existing `default` entry when there is one.
pub fn merge_methods(base: &mut Vec<MethodConfig>, overrides: Vec<MethodConfig>) {
    // Only entries present before this merge are candidates; with several
    // `default` entries the last one wins.
    let base_default = base.iter().rposition(|m| m.method == DEFAULT_METHOD);

    for method in overrides {
        match base_default {
            Some(index) if method.method == DEFAULT_METHOD => {
                merge_default_inputs(&mut base[index], &method);
            }
            _ => base.push(method),
        }
    }
}

/// Merge the override's `inputs.defaults` into the base's, override keys winning.
fn merge_default_inputs(base: &mut MethodConfig, method: &MethodConfig) {
    let Some(Value::Object(overrides)) = method.inputs.get(DEFAULTS_KEY) else {
        return;
    };

    match base.inputs.get_mut(DEFAULTS_KEY) {
        Some(Value::Object(defaults)) => {
            defaults.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        _ => {
            base.inputs
                .insert(DEFAULTS_KEY.to_string(), Value::Object(overrides.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::store::parse_document;
    use pretty_assertions::assert_eq;

    fn doc(yaml: &str) -> DescriptionDocument {
        parse_document(yaml).expect("valid yaml")
    }

    fn method_names(methods: &[MethodConfig]) -> Vec<&str> {
        methods.iter().map(|m| m.method.as_str()).collect()
    }

    fn root_doc() -> DescriptionDocument {
        doc(r#"
paths: [/badc]
categories:
  - { label: obs, regex: '.*obs.*' }
asset:
  id: { method: hash, inputs: { terms: [uri] } }
  extraction_methods:
    - method: regex
      inputs: { regex: '^/badc/(?P<project>[^/]+)' }
    - method: default
      inputs: { defaults: { licence: OGL, platform: unknown } }
"#)
    }

    fn child_doc() -> DescriptionDocument {
        doc(r#"
paths: [/badc/faam]
categories:
  - { label: obs, regex: '.*obs.*' }
  - { label: model, regex: '.*model.*' }
asset:
  extraction_methods:
    - method: iso_date
      inputs: { date_keys: [date] }
    - method: default
      inputs: { defaults: { platform: faam, aircraft: BAe-146 } }
item:
  id: { method: hash, inputs: { terms: [flight] } }
"#)
    }

    #[test]
    fn single_document_is_returned_as_is() {
        let merged = merge([root_doc()]);
        assert_eq!(merged, CollectionDescription::from(root_doc()));
    }

    #[test]
    fn empty_chain_is_empty_description() {
        assert_eq!(merge(Vec::new()), CollectionDescription::default());
    }

    #[test]
    fn id_is_overwritten_only_when_present() {
        let merged = merge([root_doc(), child_doc()]);
        let asset = merged.asset.as_ref().expect("asset");
        // child has no asset.id, root's survives
        assert_eq!(asset.id.as_ref().map(|m| m.method.as_str()), Some("hash"));
        assert_eq!(asset.id.as_ref().unwrap().inputs["terms"], serde_json::json!(["uri"]));

        let override_id = doc("asset:\n  id: { method: default }\n");
        let merged = merge([root_doc(), override_id]);
        assert_eq!(
            merged.asset.unwrap().id.map(|m| m.method),
            Some("default".to_string())
        );
    }

    #[test]
    fn methods_append_and_default_merges_in_place() {
        let merged = merge([root_doc(), child_doc()]);
        let asset = merged.asset.as_ref().expect("asset");

        assert_eq!(
            method_names(&asset.extraction_methods),
            vec!["regex", "default", "iso_date"]
        );
        assert_eq!(
            asset.extraction_methods[1].inputs["defaults"],
            serde_json::json!({ "licence": "OGL", "platform": "faam", "aircraft": "BAe-146" })
        );
    }

    #[test]
    fn default_without_base_default_is_appended() {
        let base = doc("asset:\n  extraction_methods:\n    - method: regex\n");
        let merged = merge([base, child_doc()]);
        let asset = merged.asset.expect("asset");
        assert_eq!(
            method_names(&asset.extraction_methods),
            vec!["regex", "iso_date", "default"]
        );
        assert_eq!(
            asset.extraction_methods[2].inputs["defaults"]["platform"],
            "faam"
        );
    }

    #[test]
    fn absent_section_is_untouched_and_new_section_is_added() {
        let merged = merge([root_doc(), child_doc()]);
        assert!(merged.collection.is_none());
        let item = merged.item.expect("item added by child");
        assert!(item.extraction_methods.is_empty());
        assert_eq!(item.id.map(|m| m.method), Some("hash".to_string()));
    }

    #[test]
    fn paths_are_replaced_by_most_specific_document() {
        let merged = merge([root_doc(), child_doc()]);
        assert_eq!(merged.paths, vec!["/badc/faam".to_string()]);

        let no_paths = doc("item:\n  id: { method: hash }\n");
        let merged = merge([root_doc(), no_paths]);
        assert_eq!(merged.paths, vec!["/badc".to_string()]);
    }

    #[test]
    fn categories_are_unioned() {
        let merged = merge([root_doc(), child_doc()]);
        assert_eq!(
            merged.categories,
            vec![
                Category { label: "obs".into(), regex: ".*obs.*".into() },
                Category { label: "model".into(), regex: ".*model.*".into() },
            ]
        );
    }

    #[test]
    fn merging_same_document_twice_duplicates_non_default_entries() {
        let merged = merge([root_doc(), root_doc()]);
        let asset = merged.asset.expect("asset");

        // regex is appended again; default folds into the existing entry.
        assert_eq!(
            method_names(&asset.extraction_methods),
            vec!["regex", "default", "regex"]
        );
        assert_eq!(
            asset.extraction_methods[1].inputs["defaults"],
            serde_json::json!({ "licence": "OGL", "platform": "unknown" })
        );
        assert_eq!(merged.categories.len(), 1);
    }

    #[test]
    fn member_of_links_accumulate() {
        let base = doc(r#"
item:
  member_of:
    - { type: collection, key: project, id: [ { method: hash } ] }
"#);
        let child = doc(r#"
item:
  member_of:
    - { type: collection, key: platform, id: [ { method: default } ] }
"#);
        let merged = merge([base, child]);
        let keys: Vec<_> = merged
            .item
            .expect("item")
            .member_of
            .into_iter()
            .map(|l| l.key)
            .collect();
        assert_eq!(keys, vec!["project", "platform"]);
    }

    #[test]
    fn root_and_project_end_to_end_shape() {
        let root = doc("paths: [/]\ncategories:\n  - { label: obs, regex: '.*obs.*' }\n");
        let project = doc(r#"
paths: [/proj]
asset:
  extraction_methods:
    - method: regex_extract
      inputs: { regex: '(?P<year>\d{4})' }
"#);
        let merged = merge([root, project]);
        assert!(merged.categories.iter().any(|c| c.label == "obs"));
        assert_eq!(
            method_names(&merged.asset.expect("asset").extraction_methods),
            vec!["regex_extract"]
        );
    }
}
