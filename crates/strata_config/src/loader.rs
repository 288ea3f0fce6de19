//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::StrataConfig;
use std::io::ErrorKind;
use std::path::Path;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Loads and validates `strata.toml` from a directory.
///
/// A missing file yields the default configuration.
pub fn load_config(dir: &Path) -> Result<StrataConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    match std::fs::read_to_string(&config_path) {
        Ok(content) => load_config_from_str(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(StrataConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Parses and validates a `strata.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<StrataConfig, ConfigError> {
    let config: StrataConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that configuration values are usable.
pub fn validate_config(config: &StrataConfig) -> Result<(), ConfigError> {
    if config.lower.paramod_name_limit == 0 {
        return Err(ConfigError::ValidationError(
            "lower.paramod_name_limit must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
