//! Core domain types shared by every stacforge crate.

use serde::{Deserialize, Serialize};

/// The working record a generator builds up stage by stage.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Key/value options handed to a capability when it is constructed.
pub type MethodOptions = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// GeneratorType
// ---------------------------------------------------------------------------

/// The three granularities of catalogued entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorType {
    Asset,
    Item,
    Collection,
}

impl GeneratorType {
    /// Lowercase name, as used in description sections and record bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Item => "item",
            Self::Collection => "collection",
        }
    }

    /// Record key holding this type's identifier (e.g. `item_id`).
    pub fn id_key(&self) -> String {
        format!("{}_id", self.as_str())
    }
}

impl std::fmt::Display for GeneratorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GeneratorType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asset" => Ok(Self::Asset),
            "item" => Ok(Self::Item),
            "collection" => Ok(Self::Collection),
            other => Err(format!(
                "unknown record type '{other}': expected asset, item or collection"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// MethodConfig
// ---------------------------------------------------------------------------

/// A reference to a named capability plus its inputs.
///
/// ```yaml
/// method: regex
/// inputs:
///   regex: '^/badc/(?P<platform>[^/]+)/'
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodConfig {
    /// Registered capability name.
    pub method: String,
    /// Capability inputs.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub inputs: MethodOptions,
}

impl MethodConfig {
    /// Build a method reference from a name and inputs.
    pub fn new(method: impl Into<String>, inputs: MethodOptions) -> Self {
        Self {
            method: method.into(),
            inputs,
        }
    }

    /// Build a method reference with no inputs.
    pub fn named(method: impl Into<String>) -> Self {
        Self::new(method, MethodOptions::new())
    }
}

// ---------------------------------------------------------------------------
// OutputRecord
// ---------------------------------------------------------------------------

/// A finished record plus the routing metadata sinks need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Identifier of the record itself.
    pub id: String,
    /// Identifier of the parent record, when the type is nested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Record granularity.
    #[serde(rename = "type")]
    pub record_type: GeneratorType,
    /// The dataset identifier the record was generated from.
    pub uri: String,
    /// Mapped record body.
    pub body: Record,
}
