//! Shared types, error model, and configuration for shopgraph.
//!
//! This crate is the foundation depended on by all other shopgraph crates.
//! It provides:
//! - [`ShopGraphError`]: the unified error type
//! - Domain types ([`RawPageRecord`], [`FieldValue`], [`PageType`], [`RunId`])
//! - Configuration ([`AppConfig`], [`MappingConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, MappingConfig, PipelineSettings, StoreConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{Result, ShopGraphError};
pub use types::{FieldValue, PageType, RawPageRecord, RunId};
