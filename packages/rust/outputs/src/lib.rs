//! Record shaping and delivery.
//!
//! This crate provides:
//! - [`Recipes`] — per record type rename/drop rules loaded from `recipes_root`
//! - [`Mapping`] / [`MappingRegistry`] — transforms into the published shape
//! - [`Output`] / [`OutputRegistry`] — sinks, optionally buffered until the batch finishes

pub mod mappings;
pub mod outputs;
pub mod recipe;

pub use mappings::{Mapping, MappingFactory, MappingRegistry, RecipeMapping, StacMapping};
pub use outputs::{
    JsonFileOutput, JsonLinesOutput, LogOutput, Output, OutputFactory, OutputRegistry,
};
pub use recipe::{Recipe, RecipeRules, Recipes};
