pub mod config;
pub mod image;
pub mod metrics;
pub mod video;

use std::path::Path;

use anyhow::{Context, Result};
use mareye_core::pipeline::config::EnhanceConfig;
use serde::Serialize;

/// Load a TOML config, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EnhanceConfig> {
    match path {
        Some(path) => EnhanceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EnhanceConfig::default()),
    }
}

/// Print the single JSON result object on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
