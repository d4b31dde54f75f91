//! Output capabilities: sinks receiving every finished record.

mod json_file;
mod json_lines;
mod log;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use stacforge_shared::{MethodOptions, OutputRecord, PluginConfig, Result, StacForgeError};

pub use json_file::JsonFileOutput;
pub use json_lines::JsonLinesOutput;
pub use log::LogOutput;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A destination for finished records.
pub trait Output: Send + Sync {
    fn name(&self) -> &str;

    /// Accept one record.
    fn run(&self, record: &OutputRecord) -> Result<()>;

    /// Write out and clear retained records. Called once per batch.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Whether this sink retains records until [`Output::flush`].
    fn is_buffered(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Builds an output from its `[[outputs]]` options.
pub type OutputFactory = Box<dyn Fn(&MethodOptions) -> Result<Box<dyn Output>> + Send + Sync>;

/// Outputs by name.
pub struct OutputRegistry {
    factories: BTreeMap<String, OutputFactory>,
}

impl OutputRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// `json_file`, `json_lines` and `log`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            JsonFileOutput::NAME,
            Box::new(|options: &MethodOptions| {
                Ok(Box::new(JsonFileOutput::from_options(options)?) as Box<dyn Output>)
            }),
        );
        registry.register(
            JsonLinesOutput::NAME,
            Box::new(|options: &MethodOptions| {
                Ok(Box::new(JsonLinesOutput::from_options(options)?) as Box<dyn Output>)
            }),
        );
        registry.register(
            LogOutput::NAME,
            Box::new(|options: &MethodOptions| {
                Ok(Box::new(LogOutput::from_options(options)?) as Box<dyn Output>)
            }),
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: OutputFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate one configured output.
    pub fn build(&self, config: &PluginConfig) -> Result<Box<dyn Output>> {
        let factory = self.factories.get(&config.method).ok_or_else(|| {
            StacForgeError::config(format!("unknown output `{}`", config.method))
        })?;
        factory(&config.options)
    }

    /// Instantiate every configured output, in order.
    pub fn build_all(&self, configs: &[PluginConfig]) -> Result<Vec<Box<dyn Output>>> {
        configs.iter().map(|config| self.build(config)).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for OutputRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Deserialize an output's typed options. Bad options are operator
/// misconfiguration, so they surface as config errors.
pub(crate) fn parse_options<T: DeserializeOwned>(
    output: &str,
    options: &MethodOptions,
) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| {
        StacForgeError::config(format!("invalid options for output `{output}`: {e}"))
    })
}
