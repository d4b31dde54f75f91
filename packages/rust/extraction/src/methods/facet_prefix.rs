//! `facet_prefix`: namespace facets as `prefix:term`.

use serde::Deserialize;

use stacforge_shared::{MethodOptions, Record, Result};

use super::{ExtractionMethod, parse_options};

#[derive(Debug, Deserialize)]
struct Options {
    prefix: String,
    #[serde(default)]
    terms: Vec<String>,
}

#[derive(Debug)]
pub struct FacetPrefix {
    prefix: String,
    terms: Vec<String>,
}

impl FacetPrefix {
    pub const NAME: &'static str = "facet_prefix";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        Ok(Self {
            prefix: options.prefix,
            terms: options.terms,
        })
    }
}

impl ExtractionMethod for FacetPrefix {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        for term in &self.terms {
            if let Some(value) = record.remove(term) {
                record.insert(format!("{}:{term}", self.prefix), value);
            }
        }
        Ok(())
    }
}
