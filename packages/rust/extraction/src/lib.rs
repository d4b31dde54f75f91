//! Extraction methods: named, configurable transformations over a record.
//!
//! This crate provides:
//! - [`ExtractionMethod`] — the capability every method implements
//! - [`ExtractionRegistry`] — name → factory lookup, populated at start-up
//! - [`methods`] — the built-in methods

pub mod methods;

pub use methods::{
    BboxExtract, DateCombinator, DefaultExtract, ExtractionFactory, ExtractionMethod,
    ExtractionRegistry, FacetMap, FacetPrefix, HashId, IsoDate, RegexExtract,
};
