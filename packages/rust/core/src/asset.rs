//! Asset records: one per file, each pointing at the item it belongs to.

use chrono::Utc;
use serde_json::{Value, json};

use stacforge_describer::CollectionDescription;
use stacforge_shared::{GeneratorType, Record, Result};

use crate::generator::{GeneratorCore, RecordStages};

const MOD_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const ITEM_ID_KEY: &str = "item_id";

#[derive(Debug, Clone, Copy, Default)]
pub struct AssetStages;

impl RecordStages for AssetStages {
    fn generator_type(&self) -> GeneratorType {
        GeneratorType::Asset
    }

    fn seed_record(&self, uri: &str) -> Record {
        let seed = json!({
            "type": GeneratorType::Asset.as_str(),
            "uri": uri,
            "mod_time": Utc::now().format(MOD_TIME_FORMAT).to_string(),
            "status": "new",
            "properties": { "uri": uri },
        });
        match seed {
            Value::Object(record) => record,
            _ => Record::new(),
        }
    }

    fn selects_description_path(&self) -> bool {
        true
    }

    /// `asset_id` from the asset section, plus the `item_id` of the item the
    /// asset belongs to, kept in the record.
    fn resolve_identifiers(
        &self,
        core: &GeneratorCore,
        uri: &str,
        record: &mut Record,
        description: &CollectionDescription,
    ) -> Result<String> {
        let asset_conf = self.section(description).and_then(|s| s.id.as_ref());
        let asset_id = core.run_id_method(GeneratorType::Asset, uri, record, asset_conf)?;

        let item_conf = description
            .section(GeneratorType::Item)
            .and_then(|s| s.id.as_ref());
        let item_id = core.run_id_method(GeneratorType::Item, uri, record, item_conf)?;
        record.insert(ITEM_ID_KEY.into(), item_id.into());

        Ok(asset_id)
    }

    fn categorize(
        &self,
        core: &GeneratorCore,
        uri: &str,
        description: &CollectionDescription,
    ) -> Option<Vec<String>> {
        Some(core.categorize(uri, &description.categories))
    }

    fn parent_id(&self, record: &Record, _parents: &[String]) -> Option<String> {
        record
            .get(ITEM_ID_KEY)
            .and_then(Value::as_str)
            .map(String::from)
    }
}
