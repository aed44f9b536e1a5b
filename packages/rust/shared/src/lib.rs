//! Shared types, error model, and configuration for docbinder.
//!
//! This crate is the foundation depended on by all other docbinder crates.
//! It provides:
//! - [`DocbinderError`] — the unified error type
//! - Domain types ([`ContentUnit`], [`Page`], [`NavEntry`], [`SiteManifest`])
//! - The fragment and member-ordering rules shared by page merging and navigation
//! - Configuration ([`SiteConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, ContentConfig, OutputConfig, SiteConfig, init_config, load_config,
    load_config_from,
};
pub use error::{DocbinderError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, ContentUnit, ManifestPage, NavEntry, NavGroup, NavLink, Page,
    SiteManifest, collection_order, fragment_from_path,
};
