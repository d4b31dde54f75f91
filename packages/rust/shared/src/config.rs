//! Generator configuration for stacforge.
//!
//! User config lives at `~/.stacforge/stacforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StacForgeError};
use crate::types::{GeneratorType, MethodConfig, MethodOptions};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "stacforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".stacforge";

/// Default number of merged descriptions kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Config structs (matching stacforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level generator config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the description YAML files.
    #[serde(default = "default_description_root")]
    pub description_root: String,

    /// Directory holding per-record-type mapping recipes.
    #[serde(default = "default_recipes_root")]
    pub recipes_root: String,

    /// Number of distinct description file-sets whose merge is memoized.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Fallback id-extraction method per record type (`asset`, `item`, `collection`).
    #[serde(default = "default_id_methods")]
    pub default_id_methods: BTreeMap<String, MethodConfig>,

    /// Options passed to every extraction method.
    #[serde(default)]
    pub method_defaults: MethodOptions,

    /// Options passed to one extraction method, keyed by method name.
    #[serde(default)]
    pub extraction_methods: BTreeMap<String, MethodOptions>,

    /// Mapping capabilities, applied in order.
    #[serde(default)]
    pub mappings: Vec<PluginConfig>,

    /// Output capabilities, each receiving every finished record.
    #[serde(default)]
    pub outputs: Vec<PluginConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            description_root: default_description_root(),
            recipes_root: default_recipes_root(),
            cache_capacity: default_cache_capacity(),
            default_id_methods: default_id_methods(),
            method_defaults: MethodOptions::new(),
            extraction_methods: BTreeMap::new(),
            mappings: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

fn default_description_root() -> String {
    "descriptions".into()
}
fn default_recipes_root() -> String {
    "recipes".into()
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

/// Hash the dataset identifier for every record type.
fn default_id_methods() -> BTreeMap<String, MethodConfig> {
    [GeneratorType::Asset, GeneratorType::Item, GeneratorType::Collection]
        .into_iter()
        .map(|ty| {
            let mut inputs = MethodOptions::new();
            inputs.insert("terms".into(), serde_json::json!(["uri"]));
            (ty.as_str().to_string(), MethodConfig::new("hash", inputs))
        })
        .collect()
}

/// `[[outputs]]` / `[[mappings]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Registered capability name.
    pub method: String,
    /// Remaining keys, handed to the capability constructor.
    #[serde(flatten)]
    pub options: MethodOptions,
}

impl AppConfig {
    /// Fallback id method for a record type, if configured.
    pub fn default_id_method(&self, ty: GeneratorType) -> Option<&MethodConfig> {
        self.default_id_methods.get(ty.as_str())
    }
}

// ---------------------------------------------------------------------------
// Method defaults (runtime, merged from config + call site)
// ---------------------------------------------------------------------------

/// Layered extraction-method options.
///
/// Later layers win: generator-wide defaults, then per-method defaults, then
/// the description's `inputs`, then call-site overrides.
#[derive(Debug, Clone, Default)]
pub struct MethodDefaults {
    /// Options for every method.
    pub global: MethodOptions,
    /// Options for one method, keyed by name.
    pub per_method: BTreeMap<String, MethodOptions>,
}

impl MethodDefaults {
    /// Effective options for one invocation of `conf`.
    pub fn options_for(&self, conf: &MethodConfig, overrides: &MethodOptions) -> MethodOptions {
        let mut options = self.global.clone();
        if let Some(method_defaults) = self.per_method.get(&conf.method) {
            options.extend(method_defaults.clone());
        }
        options.extend(conf.inputs.clone());
        options.extend(overrides.clone());
        options
    }
}

impl From<&AppConfig> for MethodDefaults {
    fn from(config: &AppConfig) -> Self {
        Self {
            global: config.method_defaults.clone(),
            per_method: config.extraction_methods.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.stacforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StacForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.stacforge/stacforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the generator config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the generator config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StacForgeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        StacForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject configurations that cannot produce a working generator.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.cache_capacity == 0 {
        return Err(StacForgeError::config("cache_capacity must be at least 1"));
    }
    for key in config.default_id_methods.keys() {
        key.parse::<GeneratorType>().map_err(|e| {
            StacForgeError::config(format!("default_id_methods: {e}"))
        })?;
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| StacForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| StacForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| StacForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
