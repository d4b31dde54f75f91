//! Mapping recipes: how internal field names become published ones.
//!
//! One YAML file per record type under `recipes_root`:
//!
//! ```yaml
//! # recipes/item.yml
//! rename:
//!   "faam:flight": flight_number
//! drop: [status]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use stacforge_shared::{GeneratorType, Result, StacForgeError};

/// Field-level rules from one recipe file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecipeRules {
    /// `internal name → published name`.
    pub rename: BTreeMap<String, String>,
    /// Fields removed before publishing.
    pub drop: Vec<String>,
}

/// Everything a mapping knows about the record it is shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub record_type: GeneratorType,
    /// Most specific description path covering the record, when selected.
    pub description_path: Option<String>,
    /// Category labels the record resolved to.
    pub categories: Vec<String>,
    pub rules: RecipeRules,
}

impl Recipe {
    /// A recipe with no rules.
    pub fn bare(record_type: GeneratorType) -> Self {
        Self {
            record_type,
            description_path: None,
            categories: Vec::new(),
            rules: RecipeRules::default(),
        }
    }
}

/// Recipe rules for every record type, loaded once at start-up.
#[derive(Debug, Clone, Default)]
pub struct Recipes {
    rules: BTreeMap<GeneratorType, RecipeRules>,
}

impl Recipes {
    /// Load `<root>/{asset,item,collection}.yml`. Missing files mean no rules
    /// for that type; a missing root means no rules at all.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut rules = BTreeMap::new();

        for ty in [GeneratorType::Asset, GeneratorType::Item, GeneratorType::Collection] {
            let path = recipe_path(root, ty);
            if !path.is_file() {
                debug!(?path, record_type = %ty, "no recipe file");
                continue;
            }

            let content =
                std::fs::read_to_string(&path).map_err(|e| StacForgeError::io(&path, e))?;
            let parsed: Option<RecipeRules> = serde_yaml::from_str(&content).map_err(|e| {
                StacForgeError::config(format!("failed to parse recipe {}: {e}", path.display()))
            })?;
            rules.insert(ty, parsed.unwrap_or_default());
        }

        Ok(Self { rules })
    }

    /// Rules for one record type.
    pub fn rules(&self, ty: GeneratorType) -> RecipeRules {
        self.rules.get(&ty).cloned().unwrap_or_default()
    }

    /// The recipe handed to mappings for one record.
    pub fn recipe_for(
        &self,
        ty: GeneratorType,
        description_path: Option<String>,
        categories: Vec<String>,
    ) -> Recipe {
        Recipe {
            record_type: ty,
            description_path,
            categories,
            rules: self.rules(ty),
        }
    }
}

fn recipe_path(root: &Path, ty: GeneratorType) -> PathBuf {
    root.join(format!("{}.yml", ty.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fixture_item_recipe() {
        let recipes = Recipes::load("../../../fixtures/recipes").expect("load");
        let item = recipes.rules(GeneratorType::Item);
        assert_eq!(item.rename["faam:flight"], "flight_number");
        assert_eq!(item.drop, vec!["status".to_string()]);
        assert_eq!(recipes.rules(GeneratorType::Asset), RecipeRules::default());
    }

    #[test]
    fn missing_root_yields_empty_rules() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let recipes = Recipes::load(tmp.path().join("absent")).expect("load");
        assert_eq!(recipes.rules(GeneratorType::Collection), RecipeRules::default());
    }

    #[test]
    fn empty_file_yields_empty_rules() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("asset.yml"), "").unwrap();
        let recipes = Recipes::load(tmp.path()).expect("load");
        assert_eq!(recipes.rules(GeneratorType::Asset), RecipeRules::default());
    }

    #[test]
    fn malformed_recipe_is_a_config_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("asset.yml"), "rename: [oops\n").unwrap();
        let err = Recipes::load(tmp.path()).unwrap_err();
        assert!(matches!(err, StacForgeError::Config { .. }));
    }

    #[test]
    fn recipe_for_carries_context() {
        let recipe = Recipes::default().recipe_for(
            GeneratorType::Asset,
            Some("/badc/faam/data".into()),
            vec!["flight".into()],
        );
        assert_eq!(recipe.description_path.as_deref(), Some("/badc/faam/data"));
        assert_eq!(recipe.categories, vec!["flight".to_string()]);
    }
}
