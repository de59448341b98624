// src/config/mod.rs

//! Pipeline configuration: TOML model, loading, and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{JobConfig, PipelineFile, RunSection, SiteSection};
pub use validate::validate_config;
