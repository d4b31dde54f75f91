//! Extraction method trait, registry and built-in methods.
//!
//! Methods are constructed per call from layered options and run in order
//! against the working record, each seeing the output of the previous one.

mod bbox;
mod date_combinator;
mod default;
mod facet_map;
mod facet_prefix;
mod hash;
mod iso_date;
mod regex_extract;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use stacforge_shared::{MethodOptions, Record, Result, StacForgeError};

pub use bbox::BboxExtract;
pub use date_combinator::DateCombinator;
pub use default::DefaultExtract;
pub use facet_map::FacetMap;
pub use facet_prefix::FacetPrefix;
pub use hash::HashId;
pub use iso_date::IsoDate;
pub use regex_extract::RegexExtract;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A named transformation deriving or normalizing fields of a record.
pub trait ExtractionMethod: Send + Sync {
    /// Registered method name, for tracing.
    fn name(&self) -> &str;

    /// Apply the method to the record in place.
    fn run(&self, record: &mut Record) -> Result<()>;

    /// Fields this method writes. The caller removes them when `run` fails so
    /// a failed method never leaves a half-written value behind.
    fn output_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Builds a method instance from its effective options.
pub type ExtractionFactory =
    Box<dyn Fn(&MethodOptions) -> Result<Box<dyn ExtractionMethod>> + Send + Sync>;

/// Extraction methods by name.
pub struct ExtractionRegistry {
    factories: BTreeMap<String, ExtractionFactory>,
}

impl ExtractionRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in method.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(BboxExtract::NAME, boxed(BboxExtract::from_options));
        registry.register(DateCombinator::NAME, boxed(DateCombinator::from_options));
        registry.register(DefaultExtract::NAME, boxed(DefaultExtract::from_options));
        registry.register(FacetMap::NAME, boxed(FacetMap::from_options));
        registry.register(FacetPrefix::NAME, boxed(FacetPrefix::from_options));
        registry.register(HashId::NAME, boxed(HashId::from_options));
        registry.register(IsoDate::NAME, boxed(IsoDate::from_options));
        registry.register(RegexExtract::NAME, boxed(RegexExtract::from_options));
        registry
    }

    /// Register (or replace) the factory for `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: ExtractionFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Construct the method registered as `name`.
    pub fn build(&self, name: &str, options: &MethodOptions) -> Result<Box<dyn ExtractionMethod>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| StacForgeError::extraction(name, "no such extraction method"))?;
        factory(options)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for ExtractionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn boxed<M, F>(constructor: F) -> ExtractionFactory
where
    M: ExtractionMethod + 'static,
    F: Fn(&MethodOptions) -> Result<M> + Send + Sync + 'static,
{
    Box::new(move |options: &MethodOptions| {
        Ok(Box::new(constructor(options)?) as Box<dyn ExtractionMethod>)
    })
}

// ---------------------------------------------------------------------------
// Helpers shared by the built-ins
// ---------------------------------------------------------------------------

/// Deserialize a method's typed options, ignoring keys it does not use.
pub(crate) fn parse_options<T: DeserializeOwned>(
    method: &str,
    options: &MethodOptions,
) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone()))
        .map_err(|e| StacForgeError::extraction(method, format!("invalid options: {e}")))
}

/// Scalar record values as text; structured values have no text form.
pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_registry_names() {
        let registry = ExtractionRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "bbox",
                "date_combinator",
                "default",
                "facet_map",
                "facet_prefix",
                "hash",
                "iso_date",
                "regex"
            ]
        );
    }

    #[test]
    fn unknown_method_is_an_extraction_error() {
        let registry = ExtractionRegistry::builtin();
        let err = registry.build("netcdf_header", &MethodOptions::new()).err().expect("error");
        assert!(matches!(err, StacForgeError::ExtractionMethod { .. }));
        assert!(err.to_string().contains("netcdf_header"));
    }

    #[test]
    fn custom_methods_can_be_registered() {
        struct Upper;
        impl ExtractionMethod for Upper {
            fn name(&self) -> &str {
                "upper"
            }
            fn run(&self, record: &mut Record) -> Result<()> {
                if let Some(Value::String(s)) = record.get_mut("title") {
                    *s = s.to_uppercase();
                }
                Ok(())
            }
        }

        let mut registry = ExtractionRegistry::empty();
        registry.register(
            "upper",
            Box::new(|_: &MethodOptions| Ok(Box::new(Upper) as Box<dyn ExtractionMethod>)),
        );
        assert!(registry.contains("upper"));

        let method = registry.build("upper", &MethodOptions::new()).expect("build");
        let mut record = json!({ "title": "flight" }).as_object().cloned().unwrap();
        method.run(&mut record).expect("run");
        assert_eq!(record["title"], "FLIGHT");
    }

    #[test]
    fn scalar_values_render_as_text() {
        assert_eq!(value_as_string(&json!("2021")), Some("2021".into()));
        assert_eq!(value_as_string(&json!(2021)), Some("2021".into()));
        assert_eq!(value_as_string(&json!(-1.5)), Some("-1.5".into()));
        assert_eq!(value_as_string(&json!([1])), None);
    }
}
