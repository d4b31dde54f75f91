//! `recipe`: apply the record type's rename and drop rules.

use tracing::trace;

use stacforge_shared::{Record, Result};

use super::Mapping;
use crate::recipe::Recipe;

#[derive(Debug, Default)]
pub struct RecipeMapping;

impl RecipeMapping {
    pub const NAME: &'static str = "recipe";
}

impl Mapping for RecipeMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, mut record: Record, recipe: &Recipe) -> Result<Record> {
        for (from, to) in &recipe.rules.rename {
            if let Some(value) = record.remove(from) {
                trace!(from = %from, to = %to, "renaming field");
                record.insert(to.clone(), value);
            }
        }
        for key in &recipe.rules.drop {
            record.remove(key);
        }
        Ok(record)
    }
}
