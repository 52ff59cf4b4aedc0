//! Configuration schema for the sca CLI
//!
//! Every field defaults, so partial config files load.

use sca_assembly::BuildOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ScaConfig {
    /// Treat assembly warnings as failures
    #[serde(default)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strict: bool,

    /// Base URI per binding type: `binding.ws` → `http://localhost:8080`
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub binding_base_uris: BTreeMap<String, String>,
}

impl ScaConfig {
    /// Validate the configuration for common errors
    ///
    /// Returns Ok(()) if valid, or Err with a list of error messages
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (binding_type, base) in &self.binding_base_uris {
            if let Err(e) = validate_base_uri(binding_type, base) {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build options carrying the configured base URIs
    pub fn build_options(&self) -> BuildOptions {
        self.binding_base_uris
            .iter()
            .fold(BuildOptions::default(), |options, (binding_type, base)| {
                options.with_base_uri(binding_type, base)
            })
    }
}

/// A base URI must be absolute and able to carry a path
pub fn validate_base_uri(binding_type: &str, base: &str) -> Result<(), String> {
    if binding_type.trim().is_empty() {
        return Err(format!("base URI '{}' has an empty binding type", base));
    }
    match Url::parse(base) {
        Ok(url) if !url.cannot_be_a_base() => Ok(()),
        Ok(_) => Err(format!(
            "base URI '{}' for '{}' cannot carry a path",
            base, binding_type
        )),
        Err(e) => Err(format!(
            "base URI '{}' for '{}' is not absolute: {}",
            base, binding_type, e
        )),
    }
}
