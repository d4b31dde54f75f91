//! Record generation for stacforge.
//!
//! This crate ties description resolution, extraction, mapping and output
//! into the per-record pipeline ([`Generator::process`]) and the batch loop
//! around it ([`run_batch`]).

pub mod asset;
pub mod batch;
pub mod collection;
pub mod generator;
pub mod item;

#[cfg(test)]
mod test_support;

pub use asset::AssetStages;
pub use batch::{
    BatchOptions, BatchSummary, ProgressReporter, RecordOutcome, SilentProgress, run_batch,
};
pub use collection::CollectionStages;
pub use generator::{DEFAULT_CATEGORY, Generator, GeneratorCore, RecordStages};
pub use item::ItemStages;
