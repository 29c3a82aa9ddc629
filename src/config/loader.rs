use super::schema::AnalysisConfig;
use super::validate::validate_config;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "descifrar.yaml";

/// Load and validate an analysis config from YAML.
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<AnalysisConfig> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;

    let config: AnalysisConfig = serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))?;

    validate_config(&config).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;

    debug!(path = %config_path.as_ref().display(), "loaded analysis config");
    Ok(config)
}
