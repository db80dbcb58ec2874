use super::AppConfig;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Load configuration from `path`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(data) => {
            debug!(path = %path.display(), "Loaded configuration file");
            parse_config(&data)
        }
        Err(err) => {
            warn!(path = %path.display(), "No config file ({err}); using defaults");
            AppConfig::default()
        }
    }
}

/// Parse TOML into an [`AppConfig`], falling back to defaults on any error.
pub fn parse_config(data: &str) -> AppConfig {
    match toml::from_str(data) {
        Ok(config) => config,
        Err(err) => {
            warn!("Invalid config file ({err}); using defaults");
            AppConfig::default()
        }
    }
}
