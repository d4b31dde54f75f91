//! Mapping capabilities: reshape a finished working record into its
//! published form.

mod recipe;
mod stac;

use std::collections::BTreeMap;

use stacforge_shared::{MethodOptions, PluginConfig, Record, Result, StacForgeError};

use crate::recipe::Recipe;

pub use recipe::RecipeMapping;
pub use stac::StacMapping;

/// A pure transformation from working record to published record.
pub trait Mapping: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, record: Record, recipe: &Recipe) -> Result<Record>;
}

/// Builds a mapping from its `[[mappings]]` options.
pub type MappingFactory = Box<dyn Fn(&MethodOptions) -> Result<Box<dyn Mapping>> + Send + Sync>;

/// Mappings by name.
pub struct MappingRegistry {
    factories: BTreeMap<String, MappingFactory>,
}

impl MappingRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// `recipe` and `stac`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            RecipeMapping::NAME,
            Box::new(|_: &MethodOptions| Ok(Box::new(RecipeMapping) as Box<dyn Mapping>)),
        );
        registry.register(
            StacMapping::NAME,
            Box::new(|options: &MethodOptions| {
                Ok(Box::new(StacMapping::from_options(options)?) as Box<dyn Mapping>)
            }),
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: MappingFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate one configured mapping.
    pub fn build(&self, config: &PluginConfig) -> Result<Box<dyn Mapping>> {
        let factory = self.factories.get(&config.method).ok_or_else(|| {
            StacForgeError::config(format!("unknown mapping `{}`", config.method))
        })?;
        factory(&config.options)
    }

    /// Instantiate every configured mapping, in order.
    pub fn build_all(&self, configs: &[PluginConfig]) -> Result<Vec<Box<dyn Mapping>>> {
        configs.iter().map(|config| self.build(config)).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacforge_shared::GeneratorType;

    fn plugin(method: &str) -> PluginConfig {
        PluginConfig {
            method: method.into(),
            options: MethodOptions::new(),
        }
    }

    #[test]
    fn builtin_names() {
        let registry = MappingRegistry::builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["recipe", "stac"]);
    }

    #[test]
    fn builds_configured_mappings_in_order() {
        let registry = MappingRegistry::builtin();
        let mappings = registry
            .build_all(&[plugin("recipe"), plugin("stac")])
            .expect("build");
        let names: Vec<_> = mappings.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["recipe", "stac"]);
    }

    #[test]
    fn unknown_mapping_is_a_config_error() {
        let err = MappingRegistry::builtin()
            .build(&plugin("elasticsearch"))
            .err()
            .expect("error");
        assert!(matches!(err, StacForgeError::Config { .. }));
    }

    #[test]
    fn custom_mapping_runs() {
        struct Tag;
        impl Mapping for Tag {
            fn name(&self) -> &str {
                "tag"
            }
            fn run(&self, mut record: Record, recipe: &Recipe) -> Result<Record> {
                record.insert("tagged".into(), recipe.record_type.as_str().into());
                Ok(record)
            }
        }

        let mut registry = MappingRegistry::empty();
        registry.register(
            "tag",
            Box::new(|_: &MethodOptions| Ok(Box::new(Tag) as Box<dyn Mapping>)),
        );
        let mapping = registry.build(&plugin("tag")).expect("build");
        let record = mapping
            .run(Record::new(), &Recipe::bare(GeneratorType::Item))
            .expect("run");
        assert_eq!(record["tagged"], "item");
    }
}
