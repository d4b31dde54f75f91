//! `stac`: publish shape.
//!
//! Structural fields stay at the top level; every extracted facet moves into
//! `properties`, merging with whatever the generator seeded there.

use serde::Deserialize;
use serde_json::Value;

use stacforge_shared::{MethodOptions, Record, Result, StacForgeError};

use super::Mapping;
use crate::recipe::Recipe;

const PROPERTIES: &str = "properties";

/// Fields that stay outside `properties` for every record type.
const TOP_LEVEL: &[&str] = &[
    "type",
    "uri",
    "mod_time",
    "status",
    "description_path",
    "categories",
    "member_of",
    "bbox",
    "item_id",
    PROPERTIES,
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Options {
    /// Extra fields to keep at the top level.
    top_level: Vec<String>,
}

#[derive(Debug, Default)]
pub struct StacMapping {
    extra_top_level: Vec<String>,
}

impl StacMapping {
    pub const NAME: &'static str = "stac";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = serde_json::from_value(Value::Object(options.clone()))
            .map_err(|e| StacForgeError::config(format!("invalid stac mapping options: {e}")))?;
        Ok(Self {
            extra_top_level: options.top_level,
        })
    }

    fn is_top_level(&self, key: &str) -> bool {
        TOP_LEVEL.contains(&key) || self.extra_top_level.iter().any(|k| k == key)
    }
}

impl Mapping for StacMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: Record, recipe: &Recipe) -> Result<Record> {
        let mut published = Record::new();
        let mut properties = Record::new();

        for (key, value) in record {
            if key == PROPERTIES {
                match value {
                    Value::Object(seeded) => properties.extend(seeded),
                    other => {
                        return Err(StacForgeError::Mapping(format!(
                            "{} record has non-object properties: {other}",
                            recipe.record_type
                        )));
                    }
                }
            } else if self.is_top_level(&key) {
                published.insert(key, value);
            } else {
                properties.insert(key, value);
            }
        }

        published
            .entry("type")
            .or_insert_with(|| recipe.record_type.as_str().into());
        if let Some(path) = &recipe.description_path {
            published
                .entry("description_path")
                .or_insert_with(|| path.clone().into());
        }
        published.insert(PROPERTIES.into(), Value::Object(properties));
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stacforge_shared::GeneratorType;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn folds_facets_into_properties() {
        let input = record(json!({
            "type": "asset",
            "uri": "/badc/faam/data/2005/b101/core.nc",
            "status": "new",
            "properties": { "uri": "/badc/faam/data/2005/b101/core.nc" },
            "year": "2005",
            "faam:flight": "b101",
            "categories": ["flight"],
        }));

        let mapped = StacMapping::default()
            .run(input, &Recipe::bare(GeneratorType::Asset))
            .expect("run");

        assert_eq!(
            Value::Object(mapped),
            json!({
                "type": "asset",
                "uri": "/badc/faam/data/2005/b101/core.nc",
                "status": "new",
                "categories": ["flight"],
                "properties": {
                    "uri": "/badc/faam/data/2005/b101/core.nc",
                    "year": "2005",
                    "faam:flight": "b101",
                },
            })
        );
    }

    #[test]
    fn fills_type_and_description_path_from_recipe() {
        let mut recipe = Recipe::bare(GeneratorType::Collection);
        recipe.description_path = Some("/badc/faam".into());

        let mapped = StacMapping::default()
            .run(record(json!({ "uri": "/badc/faam" })), &recipe)
            .expect("run");
        assert_eq!(mapped["type"], "collection");
        assert_eq!(mapped["description_path"], "/badc/faam");
        assert_eq!(mapped["properties"], json!({}));
    }

    #[test]
    fn configured_top_level_fields_stay_put() {
        let mapping = StacMapping::from_options(
            json!({ "top_level": ["datetime"] }).as_object().unwrap(),
        )
        .expect("build");
        let mapped = mapping
            .run(
                record(json!({ "datetime": "2005-01-01T00:00:00", "year": "2005" })),
                &Recipe::bare(GeneratorType::Item),
            )
            .expect("run");
        assert_eq!(mapped["datetime"], "2005-01-01T00:00:00");
        assert_eq!(mapped["properties"]["year"], "2005");
    }

    #[test]
    fn non_object_properties_is_a_mapping_error() {
        let err = StacMapping::default()
            .run(
                record(json!({ "properties": "oops" })),
                &Recipe::bare(GeneratorType::Item),
            )
            .unwrap_err();
        assert!(matches!(err, StacForgeError::Mapping(_)));
    }
}
