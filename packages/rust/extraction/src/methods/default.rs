//! `default`: fill in facets the record does not already carry.
//!
//! Merged key by key across description files rather than appended.

use serde::Deserialize;

use stacforge_shared::{MethodOptions, Record, Result};

use super::{ExtractionMethod, parse_options};

#[derive(Debug, Deserialize)]
struct Options {
    #[serde(default)]
    defaults: MethodOptions,
}

/// Default facet values.
#[derive(Debug)]
pub struct DefaultExtract {
    defaults: MethodOptions,
}

impl DefaultExtract {
    pub const NAME: &'static str = "default";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        Ok(Self {
            defaults: options.defaults,
        })
    }
}

impl ExtractionMethod for DefaultExtract {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        for (key, value) in &self.defaults {
            record.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Ok(())
    }
}
