//! Configuration file I/O operations
//!
//! Reading and writing the config file. Both directions validate.

use super::paths::get_config_path;
use super::schema::ScaConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Load configuration from the default location
///
/// Returns a default (empty) config if the file doesn't exist.
pub fn load_config() -> Result<ScaConfig> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from `path`, validating it
pub fn load_config_from(path: &Path) -> Result<ScaConfig> {
    if !path.exists() {
        return Ok(ScaConfig::default());
    }

    let content =
        fs::read_to_string(path).context(format!("Failed to read config: {}", path.display()))?;

    let config: ScaConfig =
        toml::from_str(&content).context(format!("Failed to parse config: {}", path.display()))?;

    if let Err(errors) = config.validate() {
        anyhow::bail!(
            "Config validation failed in {}:\n  {}",
            path.display(),
            errors.join("\n  ")
        );
    }

    Ok(config)
}

/// Save configuration to `path`
///
/// Creates parent directories if needed.
pub fn save_config_to(config: &ScaConfig, path: &Path) -> Result<()> {
    if let Err(errors) = config.validate() {
        anyhow::bail!("cannot save invalid config:\n  {}", errors.join("\n  "));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(format!(
            "Failed to create config directory: {}",
            parent.display()
        ))?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, content).context(format!("Failed to write config: {}", path.display()))?;

    Ok(())
}

/// Write a default config file at the default location
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = get_config_path()?;
    if path.exists() && !force {
        anyhow::bail!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    save_config_to(&ScaConfig::default(), &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ScaConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = ScaConfig {
            strict: true,
            ..Default::default()
        };
        config
            .binding_base_uris
            .insert("binding.ws".to_string(), "http://localhost:8080".to_string());

        save_config_to(&config, &config_path).unwrap();
        let loaded = load_config_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_base_uri() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[binding-base-uris]\n\"binding.ws\" = \"not a uri\"\n",
        )
        .unwrap();

        let err = load_config_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("Config validation failed"));
    }

    #[test]
    fn test_save_refuses_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let mut config = ScaConfig::default();
        config
            .binding_base_uris
            .insert(String::new(), "http://localhost".to_string());

        assert!(save_config_to(&config, &config_path).is_err());
        assert!(!config_path.exists());
    }
}
