//! Item records: groupings of assets, members of one or more collections.

use stacforge_describer::CollectionDescription;
use stacforge_shared::{GeneratorType, Record, Result};

use crate::generator::{GeneratorCore, RecordStages};

#[derive(Debug, Clone, Copy, Default)]
pub struct ItemStages;

impl RecordStages for ItemStages {
    fn generator_type(&self) -> GeneratorType {
        GeneratorType::Item
    }

    fn fold_membership(
        &self,
        core: &GeneratorCore,
        uri: &str,
        record: &mut Record,
        description: &CollectionDescription,
    ) -> Result<Vec<String>> {
        let links = self
            .section(description)
            .map(|s| s.member_of.as_slice())
            .unwrap_or_default();
        core.fold_member_of(GeneratorType::Item, uri, record, links)
    }

    /// The first declared parent.
    fn parent_id(&self, _record: &Record, parents: &[String]) -> Option<String> {
        parents.first().cloned()
    }
}
