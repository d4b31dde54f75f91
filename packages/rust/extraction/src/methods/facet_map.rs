//! `facet_map`: rename facets.

use std::collections::BTreeMap;

use serde::Deserialize;

use stacforge_shared::{MethodOptions, Record, Result};

use super::{ExtractionMethod, parse_options};

#[derive(Debug, Deserialize)]
struct Options {
    #[serde(default)]
    term_map: BTreeMap<String, String>,
}

/// Renames `old → new` for every entry of `term_map` present in the record.
#[derive(Debug)]
pub struct FacetMap {
    term_map: BTreeMap<String, String>,
}

impl FacetMap {
    pub const NAME: &'static str = "facet_map";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        Ok(Self {
            term_map: options.term_map,
        })
    }
}

impl ExtractionMethod for FacetMap {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        for (from, to) in &self.term_map {
            if let Some(value) = record.remove(from) {
                record.insert(to.clone(), value);
            }
        }
        Ok(())
    }
}
