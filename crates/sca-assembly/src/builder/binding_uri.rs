//! Binding URI assignment
//!
//! Service binding URIs are composed from the component URI, the binding's
//! own URI or name, and an optional per-binding-type base URI. Flattened
//! `$promoted$` services and reference bindings then copy the URIs of the
//! bindings they stand for.

use super::BuildOptions;
use crate::assembly::{Assembly, CompositeId, ServiceId, PROMOTED_PREFIX};
use crate::endpoint::EndpointTarget;
use crate::error::{BuildError, Result};
use crate::model::Binding;
use crate::monitor::Monitor;
use url::Url;

/// Base for resolving relative component and binding URIs
const SYNTHETIC_BASE: &str = "sca://assembly/";

pub(crate) fn assign_binding_uris(
    assembly: &mut Assembly,
    options: &BuildOptions,
    monitor: &mut Monitor,
) -> Result<()> {
    let composites = assembly.composites_bottom_up();
    for &composite in &composites {
        report_duplicate_bindings(assembly, composite, monitor);

        for component in assembly.composite(composite).components.clone() {
            let component_uri = assembly.component(component).uri.clone();
            let services: Vec<ServiceId> = assembly
                .component(component)
                .services
                .iter()
                .copied()
                .filter(|&s| !assembly.service(s).name.starts_with(PROMOTED_PREFIX))
                .collect();
            let several = services.len() != 1;
            for service in services {
                assign_service_uris(assembly, service, component_uri.as_deref(), several, options)?;
            }
        }

        let implementing_uri = assembly
            .composite(composite)
            .implements
            .and_then(|c| assembly.component(c).uri.clone());
        let services = assembly.composite(composite).services.clone();
        let several = services.len() != 1;
        for service in services {
            assign_service_uris(assembly, service, implementing_uri.as_deref(), several, options)?;
        }
    }

    for &composite in &composites {
        sync_promoted_services(assembly, composite);
    }
    for &composite in &composites {
        sync_reference_bindings(assembly, composite);
    }
    Ok(())
}

fn assign_service_uris(
    assembly: &mut Assembly,
    service: ServiceId,
    component_uri: Option<&str>,
    several_services: bool,
    options: &BuildOptions,
) -> Result<()> {
    let node = assembly.service_mut(service);
    let bindings = node.bindings.clone();
    for binding in &mut node.bindings {
        let same_type = bindings
            .iter()
            .filter(|b| b.binding_type == binding.binding_type)
            .count();
        let include_name = several_services || same_type > 1 || component_uri.is_none();
        let name = if include_name {
            binding.name.as_deref()
        } else {
            None
        };
        let base = options.base_uris.get(&binding.binding_type).map(String::as_str);
        let uri = compose(component_uri, binding.uri.as_deref(), name, base)?;
        tracing::trace!(service = %node.name, binding = %binding.binding_type, %uri, "binding uri");
        binding.uri = Some(uri);
    }
    Ok(())
}

fn parse(uri: &str) -> Result<Url> {
    Url::parse(uri).map_err(|source| BuildError::InvalidBindingUri {
        uri: uri.to_string(),
        source,
    })
}

fn join(base: &Url, relative: &str) -> Result<Url> {
    base.join(relative).map_err(|source| BuildError::InvalidBindingUri {
        uri: relative.to_string(),
        source,
    })
}

/// Compose the URI of one binding
///
/// An absolute binding URI is kept as is. Otherwise the binding URI, or the
/// binding name when it must be included, is resolved against the component
/// URI. Relative results start with `/` and are resolved against `base` when
/// one is configured for the binding type.
pub(crate) fn compose(
    component_uri: Option<&str>,
    binding_uri: Option<&str>,
    name: Option<&str>,
    base: Option<&str>,
) -> Result<String> {
    if let Some(uri) = binding_uri {
        if Url::parse(uri).is_ok() {
            return Ok(uri.to_string());
        }
    }
    let target = binding_uri.or(name);
    if let Some(component) = component_uri {
        check_characters(component, &['#', '?'])?;
    }
    if let Some(target) = target {
        check_characters(target, &[])?;
    }

    if let Some(absolute) = component_uri.filter(|c| Url::parse(c).is_ok()) {
        let component = parse(&format!("{}/", absolute.trim_end_matches('/')))?;
        let joined = match target {
            Some(target) => join(&component, target)?,
            None => component,
        };
        return Ok(joined.as_str().trim_end_matches('/').to_string());
    }

    let mut resolved = parse(SYNTHETIC_BASE)?;
    if let Some(component) = component_uri {
        resolved = join(&resolved, &format!("{}/", component.trim_end_matches('/')))?;
    }
    if let Some(target) = target {
        resolved = join(&resolved, target)?;
    }

    let mut relative = resolved.path().to_string();
    if let Some(query) = resolved.query() {
        relative.push('?');
        relative.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        relative.push('#');
        relative.push_str(fragment);
    }
    let trimmed = relative.trim_end_matches('/');
    let relative = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    match base {
        Some(base) => {
            let base = parse(&format!("{}/", base.trim_end_matches('/')))?;
            Ok(join(&base, relative.trim_start_matches('/'))?.to_string())
        }
        None => Ok(relative),
    }
}

/// Reject whitespace, control characters and the given delimiters
fn check_characters(uri: &str, delimiters: &[char]) -> Result<()> {
    match uri
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || delimiters.contains(c))
    {
        Some(character) => Err(BuildError::IllegalUriCharacter {
            uri: uri.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

fn report_duplicate_bindings(
    assembly: &Assembly,
    composite: CompositeId,
    monitor: &mut Monitor,
) {
    let node = assembly.composite(composite);
    let mut services = node.services.clone();
    let mut references = node.references.clone();
    for &component in &node.components {
        services.extend(
            assembly
                .component(component)
                .services
                .iter()
                .copied()
                .filter(|&s| !assembly.service(s).name.starts_with(PROMOTED_PREFIX)),
        );
        references.extend(assembly.component(component).references.iter().copied());
    }

    for service in services {
        for name in duplicate_slots(&assembly.service(service).bindings) {
            monitor.warning(
                "MultipleBindingsForService",
                assembly.service_path(service),
                &[&assembly.service(service).name, &name],
            );
        }
    }
    for reference in references {
        for name in duplicate_slots(&assembly.reference(reference).bindings) {
            monitor.warning(
                "MultipleBindingsForReference",
                assembly.reference_path(reference),
                &[&assembly.reference(reference).name, &name],
            );
        }
    }
}

/// Names of bindings sharing type and name with an earlier binding, each once
fn duplicate_slots(bindings: &[Binding]) -> Vec<String> {
    let mut reported: Vec<&Binding> = Vec::new();
    let mut names = Vec::new();
    for (position, binding) in bindings.iter().enumerate() {
        let earlier = bindings[..position].iter().any(|b| b.same_slot(binding));
        if earlier && !reported.iter().any(|b| b.same_slot(binding)) {
            reported.push(binding);
            names.push(binding.name.clone().unwrap_or_default());
        }
    }
    names
}

/// `$promoted$` services answer on the URIs of the composite service
fn sync_promoted_services(assembly: &mut Assembly, composite: CompositeId) {
    for service_id in assembly.composite(composite).services.clone() {
        let Some((_, promoted)) = assembly.service(service_id).promotion().and_then(|p| p.resolved)
        else {
            continue;
        };
        if !assembly.service(promoted).name.starts_with(PROMOTED_PREFIX) {
            continue;
        }
        let outer = assembly.service(service_id).bindings.clone();
        for binding in &mut assembly.service_mut(promoted).bindings {
            if let Some(source) = outer.iter().find(|b| b.same_slot(binding)) {
                binding.uri = source.uri.clone();
            }
        }
    }
}

/// Reference bindings without a URI take the URI of the target binding
/// their endpoint resolved to
fn sync_reference_bindings(assembly: &mut Assembly, composite: CompositeId) {
    for component in assembly.composite(composite).components.clone() {
        for reference_id in assembly.component(component).references.clone() {
            let targets: Vec<Option<String>> = assembly
                .reference(reference_id)
                .endpoints
                .iter()
                .map(|endpoint| match (&endpoint.target, &endpoint.target_binding) {
                    (EndpointTarget::Resolved { service, .. }, Some(target_binding)) => assembly
                        .service(*service)
                        .bindings
                        .iter()
                        .find(|b| b.same_slot(target_binding))
                        .and_then(|b| b.uri.clone()),
                    _ => None,
                })
                .collect();

            let reference = assembly.reference_mut(reference_id);
            for (endpoint, uri) in reference.endpoints.iter_mut().zip(targets) {
                let Some(uri) = uri else {
                    continue;
                };
                if let Some(target_binding) = endpoint.target_binding.as_mut() {
                    target_binding.uri = Some(uri.clone());
                }
                let Some(source_binding) = endpoint.source_binding.as_mut() else {
                    continue;
                };
                if source_binding.uri.is_none() {
                    source_binding.uri = Some(uri.clone());
                }
                if let Some(binding) = reference
                    .bindings
                    .iter_mut()
                    .find(|b| b.same_slot(source_binding) && b.uri.is_none())
                {
                    binding.uri = Some(uri);
                }
            }
        }
    }
}
