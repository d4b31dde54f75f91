//! Collection records.

use stacforge_describer::CollectionDescription;
use stacforge_shared::GeneratorType;

use crate::generator::{GeneratorCore, RecordStages};

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionStages;

impl RecordStages for CollectionStages {
    fn generator_type(&self) -> GeneratorType {
        GeneratorType::Collection
    }

    fn categorize(
        &self,
        core: &GeneratorCore,
        uri: &str,
        description: &CollectionDescription,
    ) -> Option<Vec<String>> {
        Some(core.categorize(uri, &description.categories))
    }
}
