//! `sca build` and `sca check`

use crate::config::ScaConfig;
use crate::config::schema::validate_base_uri;
use crate::descriptor::load_descriptor;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result, bail};
use sca_assembly::{BuildOptions, CompositeBuilder, Monitor, Problem, ResolvedComposite};
use std::path::Path;

/// Settings of one build invocation after merging flags with the config file
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub strict: bool,
    pub options: BuildOptions,
}

impl BuildSettings {
    /// Flags win over the config file; `--strict` can only turn strictness on
    pub fn merge(config: &ScaConfig, strict: bool, base_uris: Vec<(String, String)>) -> Self {
        let options = base_uris
            .into_iter()
            .fold(config.build_options(), |options, (binding_type, base)| {
                options.with_base_uri(binding_type, base)
            });
        Self {
            strict: strict || config.strict,
            options,
        }
    }
}

/// Result of a build that got past fatal errors
#[derive(Debug)]
pub struct BuildReport {
    pub resolved: ResolvedComposite,
    pub problems: Vec<Problem>,
}

/// Parse a `--base-uri binding.ws=http://host:port` argument
pub fn parse_base_uri(arg: &str) -> Result<(String, String), String> {
    let (binding_type, base) = arg
        .split_once('=')
        .ok_or_else(|| format!("invalid base URI '{}', expected TYPE=URI", arg))?;
    validate_base_uri(binding_type, base)?;
    Ok((binding_type.to_string(), base.to_string()))
}

/// Build the descriptor at `path`
///
/// Problems reported before a fatal error are printed to stderr so the
/// failure has context.
pub fn resolve(path: &Path, settings: &BuildSettings) -> Result<BuildReport> {
    let contribution = load_descriptor(path)?;
    let mut monitor = Monitor::new();
    let built = CompositeBuilder::new()
        .with_options(settings.options.clone())
        .build(&contribution, &mut monitor);

    match built {
        Ok(assembly) => Ok(BuildReport {
            resolved: assembly.snapshot(),
            problems: monitor.into_problems(),
        }),
        Err(e) => {
            eprint!("{}", output::render_problems(monitor.problems()));
            Err(e).with_context(|| format!("Failed to build {}", path.display()))
        }
    }
}

/// Fail when the report has errors, or any problem under `strict`
pub fn enforce(report: &BuildReport, strict: bool) -> Result<()> {
    let errors = report
        .problems
        .iter()
        .filter(|p| p.severity == sca_assembly::Severity::Error)
        .count();
    if errors > 0 {
        bail!("{} error(s) reported while building", errors);
    }
    if strict && !report.problems.is_empty() {
        bail!(
            "{} problem(s) reported while building (strict mode)",
            report.problems.len()
        );
    }
    Ok(())
}

pub fn run_build(descriptor: &Path, format: OutputFormat, settings: &BuildSettings) -> Result<()> {
    let report = resolve(descriptor, settings)?;

    println!(
        "{}",
        output::render(format, &report.resolved, &report.problems)?.trim_end()
    );
    if format == OutputFormat::Text {
        eprint!("{}", output::render_problems(&report.problems));
    }

    enforce(&report, settings.strict)
}

pub fn run_check(descriptor: &Path, settings: &BuildSettings) -> Result<()> {
    let report = resolve(descriptor, settings)?;

    eprint!("{}", output::render_problems(&report.problems));
    enforce(&report, settings.strict)?;

    println!(
        "ok: {} ({} warning(s))",
        report.resolved.name,
        report.problems.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sca_assembly::Severity;

    #[test]
    fn test_parse_base_uri() {
        assert_eq!(
            parse_base_uri("binding.ws=http://localhost:8080").unwrap(),
            (
                "binding.ws".to_string(),
                "http://localhost:8080".to_string()
            )
        );
        assert!(parse_base_uri("binding.ws").unwrap_err().contains("TYPE=URI"));
        assert!(parse_base_uri("binding.ws=relative/path").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = ScaConfig::default();
        config
            .binding_base_uris
            .insert("binding.ws".to_string(), "http://config:1".to_string());
        config
            .binding_base_uris
            .insert("binding.rmi".to_string(), "rmi://config:2".to_string());

        let settings = BuildSettings::merge(
            &config,
            false,
            vec![("binding.ws".to_string(), "http://flag:3".to_string())],
        );

        assert!(!settings.strict);
        assert_eq!(settings.options.base_uris["binding.ws"], "http://flag:3");
        assert_eq!(settings.options.base_uris["binding.rmi"], "rmi://config:2");
    }

    #[test]
    fn test_strict_from_config() {
        let config = ScaConfig {
            strict: true,
            ..Default::default()
        };
        assert!(BuildSettings::merge(&config, false, Vec::new()).strict);
    }

    #[test]
    fn test_enforce() {
        let warning = Problem {
            severity: Severity::Warning,
            message_id: "ReferenceWithoutTargets",
            model: "C/B#r".to_string(),
            params: vec!["r".to_string()],
        };
        let report = BuildReport {
            resolved: ResolvedComposite {
                name: "C".to_string(),
                components: Vec::new(),
                services: Vec::new(),
                references: Vec::new(),
                properties: Vec::new(),
                wires: Vec::new(),
            },
            problems: vec![warning.clone()],
        };

        assert!(enforce(&report, false).is_ok());
        assert!(enforce(&report, true).is_err());

        let report = BuildReport {
            problems: vec![Problem {
                severity: Severity::Error,
                ..warning
            }],
            ..report
        };
        assert!(enforce(&report, false).is_err());
    }
}
