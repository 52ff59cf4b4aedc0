//! Contribution descriptors on disk
//!
//! A descriptor is one TOML or JSON document holding a whole
//! [`Contribution`]: the deployable composite name, every composite it may
//! use and the domain policy definitions.

use anyhow::{Context, Result, bail};
use sca_assembly::model::Contribution;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Toml,
    Json,
}

impl DescriptorFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) => bail!(
                "unsupported descriptor extension '.{}' for {} (expected .toml or .json)",
                ext,
                path.display()
            ),
            None => bail!(
                "descriptor {} has no extension (expected .toml or .json)",
                path.display()
            ),
        }
    }
}

/// Read and parse a contribution descriptor
pub fn load_descriptor(path: &Path) -> Result<Contribution> {
    let format = DescriptorFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;
    let contribution = parse_descriptor(&content, format)
        .with_context(|| format!("Failed to parse descriptor: {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        deployable = %contribution.deployable,
        composites = contribution.composites.len(),
        "loaded descriptor"
    );
    Ok(contribution)
}

pub fn parse_descriptor(content: &str, format: DescriptorFormat) -> Result<Contribution> {
    Ok(match format {
        DescriptorFormat::Toml => toml::from_str(content)?,
        DescriptorFormat::Json => serde_json::from_str(content)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sca_assembly::model::{Implementation, Multiplicity};

    const STORE: &str = r#"
deployable = "Store"

[[composite]]
name = "Store"

[[composite.component]]
name = "Catalog"

[composite.component.implementation]
kind = "atomic"
type = "implementation.java"

[[composite.component.implementation.service]]
name = "Catalog"
interface = { interface = { name = "CatalogService" } }

[[composite.component.implementation.reference]]
name = "currencyConverter"
multiplicity = "0..1"
"#;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DescriptorFormat::from_path(Path::new("store.toml")).unwrap(),
            DescriptorFormat::Toml
        );
        assert_eq!(
            DescriptorFormat::from_path(Path::new("store.JSON")).unwrap(),
            DescriptorFormat::Json
        );
        assert!(DescriptorFormat::from_path(Path::new("store.xml")).is_err());
        assert!(DescriptorFormat::from_path(Path::new("store")).is_err());
    }

    #[test]
    fn test_parse_toml_descriptor() {
        let contribution = parse_descriptor(STORE, DescriptorFormat::Toml).unwrap();
        assert_eq!(contribution.deployable.local, "Store");

        let catalog = &contribution.composites[0].components[0];
        let Some(Implementation::Atomic(component_type)) = &catalog.implementation else {
            panic!("expected an atomic implementation");
        };
        assert_eq!(component_type.implementation_type, "implementation.java");
        assert_eq!(
            component_type.references[0].multiplicity,
            Some(Multiplicity::ZeroOne)
        );
    }

    #[test]
    fn test_parse_json_composite_implementation() {
        let contribution = parse_descriptor(
            r#"{
                "deployable": "{urn:demo}Outer",
                "composite": [{
                    "name": "{urn:demo}Outer",
                    "component": [{
                        "name": "Mid",
                        "implementation": { "kind": "composite", "name": "{urn:demo}Inner" }
                    }]
                }]
            }"#,
            DescriptorFormat::Json,
        )
        .unwrap();

        assert_eq!(contribution.deployable.namespace.as_deref(), Some("urn:demo"));
        let mid = &contribution.composites[0].components[0];
        assert!(matches!(
            &mid.implementation,
            Some(Implementation::Composite { name }) if name.local == "Inner"
        ));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(parse_descriptor("deployable = ", DescriptorFormat::Toml).is_err());
    }
}
