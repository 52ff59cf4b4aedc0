//! Directory path management for the sca CLI
//!
//! All paths used by the CLI are centralized here.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "SCA_CONFIG";

/// Get the base sca directory (~/.config/sca/)
pub fn get_sca_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Failed to get config directory")?
        .join("sca"))
}

/// Get the config file path
///
/// `SCA_CONFIG` wins when set; otherwise `~/.config/sca/config.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(get_sca_dir()?.join("config.toml"))
}

/// Get the log directory (XDG_DATA_HOME/sca/logs/ or platform equivalent)
pub fn get_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("Failed to determine data directory (XDG_DATA_HOME or platform equivalent)")?;

    Ok(data_dir.join("sca").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sca_dir_is_under_config() {
        let dir = get_sca_dir().unwrap();
        assert!(dir.ends_with("sca"));
        assert_eq!(dir.parent().unwrap(), dirs::config_dir().unwrap());
    }

    #[test]
    fn test_log_dir_is_under_data_dir() {
        let log_dir = get_log_dir().unwrap();
        assert!(log_dir.ends_with("sca/logs"));
    }
}
