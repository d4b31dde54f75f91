//! Shared types, error model, and configuration for stacforge.
//!
//! This crate is the foundation depended on by all other stacforge crates.
//! It provides:
//! - [`StacForgeError`] — the unified error type
//! - Domain types ([`Record`], [`GeneratorType`], [`MethodConfig`], [`OutputRecord`])
//! - Configuration ([`AppConfig`], [`MethodDefaults`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_CACHE_CAPACITY, MethodDefaults, PluginConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{Result, StacForgeError};
pub use types::{GeneratorType, MethodConfig, MethodOptions, OutputRecord, Record};
