//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default configuration file, picked up from the working directory
pub const DEFAULT_CONFIG: &str = "ccmap.yaml";

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<CcmapConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: CcmapConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Parse `--map` arguments in order
pub fn parse_map_specs<S: AsRef<str>>(specs: &[S]) -> Result<Vec<MappingConfig>> {
    specs
        .iter()
        .map(|spec| spec.as_ref().parse::<MappingConfig>().map_err(anyhow::Error::from))
        .collect()
}
