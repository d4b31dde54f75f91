//! `bbox`: build an envelope bounding box from individually extracted
//! coordinate fields.
//!
//! ```yaml
//! - method: bbox
//!   inputs:
//!     coordinate_keys: [west, south, east, north]
//! ```

use serde::Deserialize;
use serde_json::{Value, json};

use stacforge_shared::{MethodOptions, Record, Result, StacForgeError};

use super::{ExtractionMethod, parse_options, value_as_string};

const BBOX_KEY: &str = "bbox";

#[derive(Debug, Deserialize)]
struct Options {
    coordinate_keys: Vec<String>,
}

/// Envelope bounding box from `[west, south, east, north]` keys.
#[derive(Debug)]
pub struct BboxExtract {
    coordinate_keys: [String; 4],
}

impl BboxExtract {
    pub const NAME: &'static str = "bbox";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        let coordinate_keys: [String; 4] =
            options
                .coordinate_keys
                .try_into()
                .map_err(|keys: Vec<String>| {
                    StacForgeError::extraction(
                        Self::NAME,
                        format!("coordinate_keys needs exactly 4 entries, got {}", keys.len()),
                    )
                })?;
        Ok(Self { coordinate_keys })
    }

    fn coordinate(&self, record: &Record, key: &str) -> Result<f64> {
        let value = record
            .get(key)
            .ok_or_else(|| StacForgeError::extraction(Self::NAME, format!("missing `{key}`")))?;

        match value {
            Value::Number(n) => n.as_f64(),
            other => value_as_string(other).and_then(|s| s.trim().parse().ok()),
        }
        .ok_or_else(|| StacForgeError::extraction(Self::NAME, format!("`{key}` is not a number")))
    }
}

impl ExtractionMethod for BboxExtract {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        let [west, south, east, north] = &self.coordinate_keys;
        let west = self.coordinate(record, west)?;
        let south = self.coordinate(record, south)?;
        let east = self.coordinate(record, east)?;
        let north = self.coordinate(record, north)?;

        record.insert(
            BBOX_KEY.into(),
            json!({
                "type": "envelope",
                "coordinates": [[west, south], [east, north]],
            }),
        );
        Ok(())
    }

    fn output_keys(&self) -> Vec<String> {
        vec![BBOX_KEY.into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method() -> BboxExtract {
        BboxExtract::from_options(
            json!({ "coordinate_keys": ["west", "south", "east", "north"] })
                .as_object()
                .unwrap(),
        )
        .expect("build")
    }

    #[test]
    fn builds_envelope_from_strings_and_numbers() {
        let mut record = json!({ "north": "42.0", "south": 38.0, "east": "-28.0", "west": -37 })
            .as_object()
            .cloned()
            .unwrap();

        method().run(&mut record).expect("run");
        assert_eq!(
            record["bbox"],
            json!({ "type": "envelope", "coordinates": [[-37.0, 38.0], [-28.0, 42.0]] })
        );
    }

    #[test]
    fn missing_coordinate_fails() {
        let mut record = json!({ "north": "42.0", "south": "38.0", "east": "-28.0" })
            .as_object()
            .cloned()
            .unwrap();
        let err = method().run(&mut record).unwrap_err();
        assert!(err.to_string().contains("west"));
        assert!(record.get("bbox").is_none());
    }

    #[test]
    fn requires_four_keys() {
        let err = BboxExtract::from_options(
            json!({ "coordinate_keys": ["west", "south"] }).as_object().unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("exactly 4"));
    }
}
