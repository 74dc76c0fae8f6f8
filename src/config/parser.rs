use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML; every key has a serde default, so sparse files are fine
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Loads a configuration, falling back to defaults when no file is given or
/// the file does not exist
///
/// A malformed file is still an error: silently ignoring a typo in an
/// existing config would be worse than refusing to start.
///
/// # Arguments
///
/// * `path` - Optional path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err(ConfigError)` - The file exists but could not be parsed or validated
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(p) if p.exists() => load_config(p),
        Some(p) => {
            tracing::warn!("Config file {} not found, using defaults", p.display());
            Ok(Config::default())
        }
        None => Ok(Config::default()),
    }
}
