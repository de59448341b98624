// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::PipelineFile;
use crate::config::validate::validate_config;
use crate::errors::{Result, StagerunError};

/// Load a pipeline file from a given path.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (DAG correctness, resource sanity). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        StagerunError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config: PipelineFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a pipeline file from path and run full validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML and applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - unknown or self `after` references,
///   - DAG cycles,
///   - resource requests that are internally inconsistent.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}
