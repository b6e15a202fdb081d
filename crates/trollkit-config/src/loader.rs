//! YAML override loading.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::model::PipelineConfig;

/// Load a configuration document, filling omitted keys with defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub fn load_from_path(path: &Path) -> ConfigResult<PipelineConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::io("load.read", path, source))?;
    let config = parse_document(path, &raw)?;
    info!(path = %path.display(), "loaded configuration overrides");
    Ok(config)
}

fn parse_document(path: &Path, raw: &str) -> ConfigResult<PipelineConfig> {
    if raw.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
