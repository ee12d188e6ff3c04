//! Default paths for licwatch components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/licwatch/config.toml` or `~/.config/licwatch/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const LICWATCH_CONFIG_ENV: &str = "LICWATCH_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "licwatch";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$LICWATCH_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/licwatch/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/licwatch/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(LICWATCH_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the LICWATCH_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_contains_licwatch() {
        let path = config_path_without_env();
        assert!(path.to_string_lossy().contains("licwatch"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
