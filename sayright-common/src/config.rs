//! Configuration file resolution
//!
//! Locates the SayRight TOML config file following the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform default location (~/.config/sayright/config.toml or
//!    /etc/sayright/config.toml on Linux)

use crate::{Error, Result};
use std::path::PathBuf;

/// Resolve the configuration file path.
///
/// Returns `Ok(None)` when no explicit path was given and no file
/// exists at the platform default location — callers then run on
/// built-in defaults.
pub fn resolve_config_path(
    cli_arg: Option<&str>,
    env_var_name: &str,
) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    // Priority 3: Platform default location
    Ok(default_config_file().filter(|p| p.exists()))
}

/// Platform default configuration file path
fn default_config_file() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/sayright/config.toml first, then /etc/sayright/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("sayright").join("config.toml")) {
            if path.exists() {
                return Some(path);
            }
        }
        Some(PathBuf::from("/etc/sayright/config.toml"))
    } else {
        dirs::config_dir().map(|d| d.join("sayright").join("config.toml"))
    }
}
