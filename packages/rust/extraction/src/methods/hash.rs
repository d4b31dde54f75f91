//! `hash`: deterministic identifiers from record terms.
//!
//! The default id method for every record type.

use serde::Deserialize;
use sha2::{Digest, Sha256};

use stacforge_shared::{MethodOptions, Record, Result, StacForgeError};

use super::{ExtractionMethod, parse_options, value_as_string};

#[derive(Debug, Deserialize)]
struct Options {
    terms: Vec<String>,
    #[serde(default = "default_output_key")]
    output_key: String,
}

fn default_output_key() -> String {
    "id".into()
}

/// SHA-256 over the values of `terms`, hex encoded.
#[derive(Debug)]
pub struct HashId {
    terms: Vec<String>,
    output_key: String,
}

impl HashId {
    pub const NAME: &'static str = "hash";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        if options.terms.is_empty() {
            return Err(StacForgeError::extraction(Self::NAME, "terms must not be empty"));
        }
        Ok(Self {
            terms: options.terms,
            output_key: options.output_key,
        })
    }
}

impl ExtractionMethod for HashId {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        let mut hasher = Sha256::new();
        for term in &self.terms {
            let value = record.get(term).and_then(value_as_string).ok_or_else(|| {
                StacForgeError::extraction(Self::NAME, format!("term `{term}` missing or not text"))
            })?;
            hasher.update(value.as_bytes());
            // Unit separator keeps ("ab", "c") and ("a", "bc") apart.
            hasher.update([0x1f]);
        }

        let digest = format!("{:x}", hasher.finalize());
        record.insert(self.output_key.clone(), digest.into());
        Ok(())
    }

    fn output_keys(&self) -> Vec<String> {
        vec![self.output_key.clone()]
    }
}
