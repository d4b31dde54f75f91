//! `regex`: pull named capture groups out of a record term (the uri by default).
//!
//! ```yaml
//! - method: regex
//!   inputs:
//!     regex: '^/badc/faam/data/(?P<year>\d{4})/(?P<flight>[a-z]\d{3})'
//! ```

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use stacforge_shared::{MethodOptions, Record, Result, StacForgeError};

use super::{ExtractionMethod, parse_options, value_as_string};

#[derive(Debug, Deserialize)]
struct Options {
    regex: String,
    #[serde(default = "default_input_term")]
    input_term: String,
}

fn default_input_term() -> String {
    "uri".into()
}

/// Regex facet extraction.
#[derive(Debug)]
pub struct RegexExtract {
    regex: Regex,
    input_term: String,
}

impl RegexExtract {
    pub const NAME: &'static str = "regex";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        let regex = Regex::new(&options.regex)
            .map_err(|e| StacForgeError::extraction(Self::NAME, format!("invalid regex: {e}")))?;

        Ok(Self {
            regex,
            input_term: options.input_term,
        })
    }
}

impl ExtractionMethod for RegexExtract {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        let input = record
            .get(&self.input_term)
            .and_then(value_as_string)
            .ok_or_else(|| {
                StacForgeError::extraction(
                    Self::NAME,
                    format!("input term `{}` missing or not text", self.input_term),
                )
            })?;

        let Some(captures) = self.regex.captures(&input) else {
            debug!(input = %input, regex = %self.regex, "regex did not match");
            return Ok(());
        };

        for name in self.regex.capture_names().flatten() {
            if let Some(m) = captures.name(name) {
                record.insert(name.to_string(), m.as_str().into());
            }
        }

        Ok(())
    }

    fn output_keys(&self) -> Vec<String> {
        self.regex
            .capture_names()
            .flatten()
            .map(String::from)
            .collect()
    }
}
