//! Composite service and reference promotion
//!
//! Promotion targets are resolved against the composite's index, then every
//! composite service is redirected to a `$promoted$.<name>` service created on
//! the innermost component of its promotion chain. After this stage the
//! activation layer never has to walk nested composites to find the component
//! that actually implements a composite service.

use super::index::CompositeIndex;
use crate::assembly::{
    Assembly, ComponentId, CompositeId, ImplementationNode, Owner, ReferenceKind, ServiceId,
    ServiceKind, ServiceNode, PROMOTED_PREFIX,
};
use crate::endpoint::Endpoint;
use crate::error::{BuildError, Result};
use crate::interface::InterfaceContractMapper;
use crate::model::Callback;
use crate::monitor::Monitor;
use std::collections::HashSet;

pub(crate) fn resolve_promotions(
    assembly: &mut Assembly,
    mapper: &dyn InterfaceContractMapper,
    monitor: &mut Monitor,
) -> Result<()> {
    for composite in assembly.composites_bottom_up() {
        propagate_nested_interfaces(assembly, composite);
        let index = CompositeIndex::build(assembly, composite);
        connect_composite_services(assembly, composite, &index, mapper, monitor);
        connect_composite_references(assembly, composite, &index, mapper, monitor);
        flatten_composite_services(assembly, composite)?;
    }
    Ok(())
}

/// Component services and references of composite-implemented components
/// take the interface their composite settled on during its own promotion
fn propagate_nested_interfaces(assembly: &mut Assembly, composite: CompositeId) {
    for component in assembly.composite(composite).components.clone() {
        if !matches!(
            assembly.component(component).implementation,
            ImplementationNode::Composite(_)
        ) {
            continue;
        }
        for service in assembly.component(component).services.clone() {
            if assembly.service(service).interface.is_some() {
                continue;
            }
            if let Some(implementation) = assembly.service(service).implementation_service {
                let interface = assembly.service(implementation).interface.clone();
                assembly.service_mut(service).interface = interface;
            }
        }
        for reference in assembly.component(component).references.clone() {
            if assembly.reference(reference).interface.is_some() {
                continue;
            }
            if let Some(implementation) = assembly.reference(reference).implementation_reference {
                let interface = assembly.reference(implementation).interface.clone();
                assembly.reference_mut(reference).interface = interface;
            }
        }
    }
}

fn connect_composite_services(
    assembly: &mut Assembly,
    composite: CompositeId,
    index: &CompositeIndex,
    mapper: &dyn InterfaceContractMapper,
    monitor: &mut Monitor,
) {
    let composite_name = assembly.composite(composite).name.to_string();
    for service_id in assembly.composite(composite).services.clone() {
        let Some(target) = assembly.service(service_id).promotion().map(|p| p.target.clone())
        else {
            continue;
        };
        let Some(&(component, promoted)) = index.services.get(&target) else {
            monitor.warning(
                "PromotedServiceNotFound",
                assembly.composite_path(composite),
                &[&composite_name, &target],
            );
            continue;
        };

        let promoted_interface = assembly.service(promoted).interface.clone();
        let path = assembly.service_path(service_id);
        let service = assembly.service_mut(service_id);
        if let ServiceKind::Promoting(promotion) = &mut service.kind {
            promotion.resolved = Some((component, promoted));
        }
        match (&service.interface, &promoted_interface) {
            (None, _) => service.interface = promoted_interface,
            (Some(own), Some(promoted)) if !mapper.is_compatible(own, promoted) => {
                monitor.warning("ServiceInterfaceNotSubSet", path, &[&target]);
            }
            _ => {}
        }
    }
}

fn connect_composite_references(
    assembly: &mut Assembly,
    composite: CompositeId,
    index: &CompositeIndex,
    mapper: &dyn InterfaceContractMapper,
    monitor: &mut Monitor,
) {
    let composite_name = assembly.composite(composite).name.to_string();
    for reference_id in assembly.composite(composite).references.clone() {
        let targets: Vec<String> = assembly
            .reference(reference_id)
            .promotions()
            .iter()
            .map(|p| p.target.clone())
            .collect();

        for (position, target) in targets.iter().enumerate() {
            let Some(&(component, promoted)) = index.references.get(target) else {
                monitor.warning(
                    "PromotedReferenceNotFound",
                    assembly.composite_path(composite),
                    &[&composite_name, target],
                );
                continue;
            };
            assembly.reference_mut(promoted).promoted = true;

            let promoted_interface = assembly.reference(promoted).interface.clone();
            let path = assembly.reference_path(reference_id);
            let reference = assembly.reference_mut(reference_id);
            if let ReferenceKind::Promoting(promotions) = &mut reference.kind {
                promotions[position].resolved = Some((component, promoted));
            }
            match (&reference.interface, &promoted_interface) {
                (None, _) => reference.interface = promoted_interface,
                (Some(own), Some(promoted)) if !mapper.is_compatible(own, promoted) => {
                    monitor.warning("ReferenceInterfaceNotSubSet", path, &[target]);
                }
                _ => {}
            }
        }
    }
}

/// Follow a promotion chain to the service that is not itself a promotion
///
/// Returns `None` when a link of the chain was left unresolved.
fn innermost_service(
    assembly: &Assembly,
    origin: ServiceId,
    start: (ComponentId, ServiceId),
) -> Result<Option<(ComponentId, ServiceId)>> {
    let mut visited = HashSet::from([origin]);
    let mut chain = vec![assembly.service_path(origin)];
    let mut current = start;
    loop {
        let Some(implementation) = assembly.service(current.1).implementation_service else {
            return Ok(Some(current));
        };
        let ServiceKind::Promoting(promotion) = &assembly.service(implementation).kind else {
            return Ok(Some(current));
        };
        chain.push(assembly.service_path(implementation));
        if !visited.insert(implementation) {
            return Err(BuildError::PromotionCycle(chain));
        }
        match promotion.resolved {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
}

fn flatten_composite_services(assembly: &mut Assembly, composite: CompositeId) -> Result<()> {
    for service_id in assembly.composite(composite).services.clone() {
        let Some(start) = assembly.service(service_id).promotion().and_then(|p| p.resolved) else {
            continue;
        };
        let Some((component, inner_id)) = innermost_service(assembly, service_id, start)? else {
            continue;
        };

        let outer = assembly.service(service_id);
        let inner = assembly.service(inner_id);
        let mut node = ServiceNode::new(
            format!("{}{}", PROMOTED_PREFIX, outer.name),
            Owner::Component(component),
        );
        node.implementation_service = inner.implementation_service;
        node.interface = outer.interface.clone().or_else(|| inner.interface.clone());
        node.bindings = if outer.bindings.is_empty() {
            inner.bindings.clone()
        } else {
            outer.bindings.clone()
        };
        if node.interface.as_ref().is_some_and(|c| c.callback.is_some()) {
            node.callback = Some(Callback {
                bindings: outer
                    .callback
                    .as_ref()
                    .map(|cb| cb.bindings.clone())
                    .unwrap_or_default(),
                ..Default::default()
            });
        }

        tracing::debug!(
            composite_service = %assembly.service_path(service_id),
            promoted = %node.name,
            component = %assembly.component(component).name,
            "flattened promotion chain"
        );
        let promoted_id = assembly.add_service(node);
        assembly.component_mut(component).services.push(promoted_id);
        if let ServiceKind::Promoting(promotion) = &mut assembly.service_mut(service_id).kind {
            promotion.resolved = Some((component, promoted_id));
        }
    }
    Ok(())
}

/// Hand the endpoints of references on composite-implemented components to
/// the inner component references their composite promotes
///
/// Runs top-down after wiring so that multi-level promotions receive the
/// endpoints computed at the outermost level.
pub(crate) fn push_down_reference_endpoints(assembly: &mut Assembly) {
    let root = assembly.root();
    push_down(assembly, root);
}

fn push_down(assembly: &mut Assembly, composite: CompositeId) {
    for component in assembly.composite(composite).components.clone() {
        let ImplementationNode::Composite(child) = assembly.component(component).implementation
        else {
            continue;
        };
        for reference_id in assembly.component(component).references.clone() {
            let reference = assembly.reference(reference_id);
            let Some(implementation) = reference.implementation_reference else {
                continue;
            };
            if reference.endpoints.is_empty() {
                continue;
            }
            let endpoints = reference.endpoints.clone();
            let bindings = reference.bindings.clone();
            let targets: Vec<_> = assembly
                .reference(implementation)
                .promotions()
                .iter()
                .filter_map(|p| p.resolved)
                .collect();

            for (inner_component, inner_reference) in targets {
                let inner = assembly.reference_mut(inner_reference);
                inner.endpoints.extend(endpoints.iter().cloned().map(|endpoint| Endpoint {
                    source_component: inner_component,
                    source_reference: inner_reference,
                    ..endpoint
                }));
                for binding in &bindings {
                    if !inner.bindings.iter().any(|b| b.same_slot(binding)) {
                        inner.bindings.push(binding.clone());
                    }
                }
            }
        }
        push_down(assembly, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ScaBindingFactory;
    use crate::builder::configure::configure;
    use crate::builder::test_support::{atomic, composite_component, contribution, load, root_component};
    use crate::interface::DefaultContractMapper;
    use crate::model::{Composite, CompositeService, QName};

    fn nested_assembly(target: &str) -> Assembly {
        let inner = Composite {
            name: QName::local("Inner"),
            components: vec![atomic("Leaf", &["S"], &[])],
            services: vec![CompositeService {
                name: "Svc1".to_string(),
                promote: "Leaf/S".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let outer = Composite {
            name: QName::local("Outer"),
            components: vec![composite_component("Mid", "Inner")],
            services: vec![CompositeService {
                name: "Top".to_string(),
                promote: target.to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut assembly = load(&contribution("Outer", vec![outer, inner]));
        configure(&mut assembly, &DefaultContractMapper, &ScaBindingFactory, &mut Monitor::new());
        assembly
    }

    #[test]
    fn test_outer_service_redirected_to_innermost_component() {
        let mut assembly = nested_assembly("Mid/Svc1");
        let mut monitor = Monitor::new();
        resolve_promotions(&mut assembly, &DefaultContractMapper, &mut monitor).unwrap();

        let top = assembly.composite(assembly.root()).services[0];
        let (component, promoted) = assembly.service(top).promotion().unwrap().resolved.unwrap();
        assert_eq!(assembly.component(component).name, "Leaf");
        assert_eq!(assembly.service(promoted).name, "$promoted$.Top");
        assert_eq!(assembly.service(promoted).bindings, assembly.service(top).bindings);
        assert!(monitor.problems().is_empty());
    }

    #[test]
    fn test_unknown_promotion_target_reported() {
        let mut assembly = nested_assembly("Mid/Nothing");
        let mut monitor = Monitor::new();
        resolve_promotions(&mut assembly, &DefaultContractMapper, &mut monitor).unwrap();

        assert_eq!(monitor.count("PromotedServiceNotFound"), 1);
        let top = assembly.composite(assembly.root()).services[0];
        assert!(assembly.service(top).promotion().unwrap().resolved.is_none());
    }

    #[test]
    fn test_cyclic_chain_is_fatal() {
        let assembly = nested_assembly("Mid/Svc1");
        let mid = root_component(&assembly, "Mid");
        let mid_service = assembly.find_service(mid, "Svc1").unwrap();
        let inner_service = assembly.service(mid_service).implementation_service.unwrap();

        let mut assembly = assembly;
        if let ServiceKind::Promoting(promotion) = &mut assembly.service_mut(inner_service).kind {
            promotion.resolved = Some((mid, mid_service));
        }
        let top = assembly.composite(assembly.root()).services[0];
        let result = innermost_service(&assembly, top, (mid, mid_service));
        assert!(matches!(result, Err(BuildError::PromotionCycle(chain)) if chain.len() == 3));
    }
}
