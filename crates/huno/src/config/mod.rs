mod credentials;

pub use credentials::SessionStore;

use crate::error::{HunoError, Result};
use std::path::PathBuf;

/// Default configuration directory name
const CONFIG_DIR_NAME: &str = "huno";

/// Environment variable enabling verbose per-attempt logging and disabling the cache
const DEBUG_ENV: &str = "HUNO_DEBUG";

/// Environment variable routing upstream traffic through an HTTP(S) proxy
const PROXY_ENV: &str = "HUNO_PROXY_URL";

/// Get the configuration directory path
/// Returns ~/.config/huno on Unix, ~/Library/Application Support/huno on macOS
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(CONFIG_DIR_NAME))
        .ok_or_else(|| HunoError::config("Could not determine config directory"))
}

/// Get the data directory path for storing session tokens and caches
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join(CONFIG_DIR_NAME))
        .ok_or_else(|| HunoError::config("Could not determine data directory"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &PathBuf) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Environment-driven runtime settings.
///
/// Read once at startup and passed explicitly into the client constructor;
/// nothing here is ambient process-wide state.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Verbose per-attempt logging, cache disabled
    pub debug: bool,
    /// Optional HTTP(S) proxy URL for all upstream traffic
    pub proxy_url: Option<String>,
}

impl Settings {
    /// Load settings from the environment
    pub fn from_env() -> Self {
        Self {
            debug: std::env::var(DEBUG_ENV).map(|v| v == "1").unwrap_or(false),
            proxy_url: std::env::var(PROXY_ENV).ok().filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_exists() {
        let dir = config_dir();
        assert!(dir.is_ok());
        let path = dir.unwrap();
        assert!(path.ends_with("huno"));
    }

    #[test]
    fn test_data_dir_exists() {
        let dir = data_dir();
        assert!(dir.is_ok());
        let path = dir.unwrap();
        assert!(path.ends_with("huno"));
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(!settings.debug);
        assert!(settings.proxy_url.is_none());
    }
}
