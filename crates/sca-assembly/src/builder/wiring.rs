//! Reference to service wiring
//!
//! Wires declared on a composite become reference targets first. Each
//! component reference then gets its endpoints from the first strategy that
//! applies: autowire, explicit targets, targets of the implementation-level
//! reference, and finally binding URIs. The number of endpoints is checked
//! against the reference multiplicity.

use super::index::CompositeIndex;
use crate::assembly::{Assembly, ComponentId, CompositeId, ReferenceId, PROMOTED_PREFIX};
use crate::endpoint::{Endpoint, EndpointBuilder, EndpointTarget};
use crate::interface::{compatible, InterfaceContractMapper};
use crate::model::{Binding, InterfaceContract};
use crate::monitor::Monitor;

pub(crate) fn wire(
    assembly: &mut Assembly,
    mapper: &dyn InterfaceContractMapper,
    endpoint_builder: &dyn EndpointBuilder,
    monitor: &mut Monitor,
) {
    for composite in assembly.composites_bottom_up() {
        let index = CompositeIndex::build(assembly, composite);
        connect_wires(assembly, composite, &index, mapper, monitor);

        for component in assembly.composite(composite).components.clone() {
            for reference in assembly.component(component).references.clone() {
                let wiring = Wiring {
                    assembly: &*assembly,
                    index: &index,
                    mapper,
                    composite,
                    component,
                    reference,
                };
                let endpoints = wiring.resolve(endpoint_builder, monitor);
                apply_endpoints(assembly, reference, endpoints, monitor);
            }
        }
    }
}

/// Turn composite wires into reference targets and drop them
fn connect_wires(
    assembly: &mut Assembly,
    composite: CompositeId,
    index: &CompositeIndex,
    mapper: &dyn InterfaceContractMapper,
    monitor: &mut Monitor,
) {
    let wires = std::mem::take(&mut assembly.composite_mut(composite).wires);
    let path = assembly.composite_path(composite);
    for wire in wires {
        let Some(&(_, reference)) = index.references.get(&wire.source) else {
            monitor.warning("WireSourceNotFound", path.as_str(), &[&wire.source]);
            continue;
        };
        let Some(&(_, service)) = index.services.get(&wire.target) else {
            monitor.warning("WireTargetNotFound", path.as_str(), &[&wire.target]);
            continue;
        };
        if !compatible(
            mapper,
            assembly.reference(reference).interface.as_ref(),
            assembly.service(service).interface.as_ref(),
        ) {
            monitor.warning(
                "WireIncompatibleInterface",
                path.as_str(),
                &[&wire.source, &wire.target],
            );
            continue;
        }
        let targets = &mut assembly.reference_mut(reference).targets;
        if !targets.contains(&wire.target) {
            targets.push(wire.target);
        }
    }
}

/// Endpoint discovery for one component reference
struct Wiring<'a> {
    assembly: &'a Assembly,
    index: &'a CompositeIndex,
    mapper: &'a dyn InterfaceContractMapper,
    composite: CompositeId,
    component: ComponentId,
    reference: ReferenceId,
}

impl Wiring<'_> {
    fn resolve(&self, endpoint_builder: &dyn EndpointBuilder, monitor: &mut Monitor) -> Vec<Endpoint> {
        let reference = self.assembly.reference(self.reference);
        let implementation_targets = reference
            .implementation_reference
            .map(|id| self.assembly.reference(id).targets.as_slice())
            .unwrap_or_default();

        let mut endpoints = if reference.autowire.unwrap_or(false) {
            self.autowire(monitor)
        } else if !reference.targets.is_empty() {
            if reference.bindings.iter().any(|b| b.uri.is_some()) {
                monitor.warning(
                    "ReferenceEndPointMixWithTarget",
                    self.assembly.reference_path(self.reference),
                    &[&reference.name],
                );
            }
            self.named_targets(&reference.targets, "ReferenceIncompatibleInterface", monitor)
        } else if !implementation_targets.is_empty() {
            self.named_targets(implementation_targets, "ComponentIncompatibleInterface", monitor)
        } else {
            Vec::new()
        };

        if endpoints.is_empty() {
            endpoints = self.binding_uri_targets(monitor);
        }

        for endpoint in &mut endpoints {
            if !matches!(endpoint.target, EndpointTarget::External { .. }) {
                endpoint.interface = reference.interface.clone();
                endpoint_builder.build(endpoint, self.assembly, monitor);
            }
        }
        endpoints
    }

    fn interface(&self) -> Option<&InterfaceContract> {
        self.assembly.reference(self.reference).interface.as_ref()
    }

    fn endpoint(&self, target: EndpointTarget, candidates: Vec<Binding>) -> Endpoint {
        let mut endpoint = Endpoint::new(self.component, self.reference, target);
        endpoint.candidate_bindings = candidates;
        endpoint
    }

    /// Every compatible service of every other component in the composite
    fn autowire(&self, monitor: &mut Monitor) -> Vec<Endpoint> {
        let reference = self.assembly.reference(self.reference);
        let multiplicity = reference.effective_multiplicity();
        let mut endpoints = Vec::new();

        for &target in &self.assembly.composite(self.composite).components {
            if target == self.component {
                continue;
            }
            for &service_id in &self.assembly.component(target).services {
                let service = self.assembly.service(service_id);
                if service.is_callback || service.name.starts_with(PROMOTED_PREFIX) {
                    continue;
                }
                if compatible(self.mapper, self.interface(), service.interface.as_ref()) {
                    endpoints.push(self.endpoint(
                        EndpointTarget::Resolved {
                            component: target,
                            service: service_id,
                        },
                        reference.bindings.clone(),
                    ));
                    if multiplicity.is_single() {
                        break;
                    }
                }
            }
        }

        if endpoints.is_empty() && multiplicity.requires_target() {
            monitor.warning(
                "NoComponentReferenceTarget",
                self.assembly.reference_path(self.reference),
                &[&reference.name],
            );
        }
        endpoints
    }

    fn named_targets(
        &self,
        names: &[String],
        incompatible_id: &'static str,
        monitor: &mut Monitor,
    ) -> Vec<Endpoint> {
        let reference = self.assembly.reference(self.reference);
        let path = self.assembly.reference_path(self.reference);
        let mut endpoints = Vec::new();

        for name in names {
            match self.index.services.get(name) {
                Some(&(component, service)) => {
                    let target_interface = self.assembly.service(service).interface.as_ref();
                    if compatible(self.mapper, self.interface(), target_interface) {
                        endpoints.push(self.endpoint(
                            EndpointTarget::Resolved { component, service },
                            reference.bindings.clone(),
                        ));
                    } else {
                        monitor.warning(incompatible_id, path.as_str(), &[&reference.name, name]);
                    }
                }
                None => {
                    endpoints.push(self.endpoint(
                        EndpointTarget::Unresolved {
                            name: name.clone(),
                            bindings: reference.bindings.clone(),
                        },
                        reference.bindings.clone(),
                    ));
                    monitor.warning(
                        "ComponentReferenceTargetNotFound",
                        path.as_str(),
                        &[&reference.name, name],
                    );
                }
            }
        }
        endpoints
    }

    /// Binding URIs naming `component/service` in the composite resolve to
    /// that service; any other URI is taken as an external address
    fn binding_uri_targets(&self, monitor: &mut Monitor) -> Vec<Endpoint> {
        let reference = self.assembly.reference(self.reference);
        let mut endpoints = Vec::new();

        for binding in &reference.bindings {
            let Some(uri) = &binding.uri else {
                continue;
            };
            let path = match url::Url::parse(uri) {
                Ok(parsed) => parsed.path().trim_start_matches('/').to_string(),
                Err(_) => uri.trim_start_matches('/').to_string(),
            };

            match self.index.services.get(&path) {
                Some(&(component, service)) => {
                    let target_interface = self.assembly.service(service).interface.as_ref();
                    if compatible(self.mapper, self.interface(), target_interface) {
                        endpoints.push(self.endpoint(
                            EndpointTarget::Resolved { component, service },
                            vec![binding.clone()],
                        ));
                    } else {
                        monitor.warning(
                            "ReferenceIncompatibleInterface",
                            self.assembly.reference_path(self.reference),
                            &[&reference.name, uri],
                        );
                    }
                }
                None => {
                    let mut endpoint =
                        self.endpoint(EndpointTarget::External { uri: uri.clone() }, Vec::new());
                    endpoint.source_binding = Some(binding.clone());
                    endpoints.push(endpoint);
                }
            }
        }
        endpoints
    }
}

/// Store the endpoints, narrow the bindings to the ones they use and check
/// the multiplicity
fn apply_endpoints(
    assembly: &mut Assembly,
    reference_id: ReferenceId,
    endpoints: Vec<Endpoint>,
    monitor: &mut Monitor,
) {
    let path = assembly.reference_path(reference_id);
    let reference = assembly.reference_mut(reference_id);

    let all_external = endpoints
        .iter()
        .all(|e| matches!(e.target, EndpointTarget::External { .. }));
    if !endpoints.is_empty() && !all_external {
        let used = distinct(endpoints.iter().filter_map(|e| e.source_binding.as_ref()));
        if !used.is_empty() {
            reference.bindings = used;
        }
        let callback_bindings =
            distinct(endpoints.iter().filter_map(|e| e.source_callback_binding.as_ref()));
        if let Some(callback) = reference.callback.as_mut() {
            if !callback_bindings.is_empty() {
                callback.bindings = callback_bindings;
            }
        }
    }

    let multiplicity = reference.effective_multiplicity();
    let count = endpoints.len();
    let configured_by_binding = reference
        .bindings
        .iter()
        .any(|b| !b.is_optimizable() || b.uri.is_some());
    let satisfied =
        multiplicity.accepts(count) || (count == 0 && multiplicity.requires_target() && configured_by_binding);

    if !satisfied {
        if count == 0 {
            if !reference.promoted && !reference.is_callback {
                monitor.warning("ReferenceWithoutTargets", path.as_str(), &[&reference.name]);
            }
        } else {
            monitor.warning(
                "TooManyReferenceTargets",
                path.as_str(),
                &[&reference.name, &count.to_string()],
            );
        }
    }

    tracing::trace!(reference = %path, endpoints = count, "wired reference");
    reference.endpoints = endpoints;
    reference.targets.clear();
}

fn distinct<'a>(bindings: impl Iterator<Item = &'a Binding>) -> Vec<Binding> {
    let mut out: Vec<Binding> = Vec::new();
    for binding in bindings {
        if !out.contains(binding) {
            out.push(binding.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ScaBindingFactory;
    use crate::builder::configure::configure;
    use crate::builder::test_support::{atomic, contract, contribution, load, root_component};
    use crate::endpoint::DefaultEndpointBuilder;
    use crate::interface::DefaultContractMapper;
    use crate::model::{Component, Composite, Multiplicity, QName, Reference, Wire};
    use proptest::prelude::*;

    fn build(components: Vec<Component>, wires: Vec<Wire>, autowire: Option<bool>) -> (Assembly, Monitor) {
        let mut assembly = load(&contribution(
            "C",
            vec![Composite {
                name: QName::local("C"),
                autowire,
                components,
                wires,
                ..Default::default()
            }],
        ));
        let mut monitor = Monitor::new();
        configure(&mut assembly, &DefaultContractMapper, &ScaBindingFactory, &mut monitor);
        wire(&mut assembly, &DefaultContractMapper, &DefaultEndpointBuilder, &mut monitor);
        (assembly, monitor)
    }

    fn with_reference(mut component: Component, reference: Reference) -> Component {
        component.references.push(reference);
        component
    }

    fn reference_of(assembly: &Assembly, component: &str, name: &str) -> ReferenceId {
        let component = root_component(assembly, component);
        assembly.find_reference(component, name).unwrap()
    }

    #[test]
    fn test_explicit_target_resolves() {
        let a = with_reference(
            atomic("A", &[], &["r"]),
            Reference {
                name: "r".to_string(),
                targets: vec!["B/S".to_string()],
                ..Default::default()
            },
        );
        let (assembly, monitor) = build(vec![a, atomic("B", &["S"], &[])], vec![], None);

        let r = assembly.reference(reference_of(&assembly, "A", "r"));
        assert_eq!(r.endpoints.len(), 1);
        assert!(r.endpoints[0].is_resolved());
        assert_eq!(r.endpoints[0].target_name(&assembly), "B/S");
        assert!(r.endpoints[0].built);
        assert!(r.targets.is_empty());
        assert!(monitor.problems().is_empty(), "{:?}", monitor.problems());
    }

    #[test]
    fn test_unknown_target_is_unresolved() {
        let a = with_reference(
            atomic("A", &[], &["r"]),
            Reference {
                name: "r".to_string(),
                targets: vec!["Nowhere/S".to_string()],
                ..Default::default()
            },
        );
        let (assembly, monitor) = build(vec![a], vec![], None);

        let r = assembly.reference(reference_of(&assembly, "A", "r"));
        assert!(matches!(
            &r.endpoints[0].target,
            EndpointTarget::Unresolved { name, .. } if name == "Nowhere/S"
        ));
        assert_eq!(monitor.count("ComponentReferenceTargetNotFound"), 1);
    }

    #[test]
    fn test_wires_become_targets_and_are_consumed() {
        let wires = vec![
            Wire {
                source: "A/r".to_string(),
                target: "B".to_string(),
            },
            Wire {
                source: "A/missing".to_string(),
                target: "B".to_string(),
            },
        ];
        let (assembly, monitor) = build(
            vec![atomic("A", &[], &["r"]), atomic("B", &["S"], &[])],
            wires,
            None,
        );

        let r = assembly.reference(reference_of(&assembly, "A", "r"));
        assert_eq!(r.endpoints.len(), 1);
        assert!(assembly.composite(assembly.root()).wires.is_empty());
        assert_eq!(monitor.count("WireSourceNotFound"), 1);
    }

    #[test]
    fn test_autowire_skips_own_component() {
        let mut a = atomic("A", &["S"], &[]);
        a.references.push(Reference {
            name: "r".to_string(),
            interface: Some(contract("Quote")),
            multiplicity: Some(Multiplicity::ZeroN),
            ..Default::default()
        });
        let mut b = atomic("B", &[], &[]);
        if let Some(crate::model::Implementation::Atomic(ty)) = b.implementation.as_mut() {
            ty.services.push(crate::model::Service {
                name: "Quotes".to_string(),
                interface: Some(contract("Quote")),
                ..Default::default()
            });
        }
        let (assembly, _) = build(vec![a, b], vec![], Some(true));

        let r = assembly.reference(reference_of(&assembly, "A", "r"));
        let targets: Vec<String> = r.endpoints.iter().map(|e| e.target_name(&assembly)).collect();
        assert_eq!(targets, vec!["B/Quotes".to_string()]);
    }

    #[test]
    fn test_incompatible_target_reported() {
        let mut a = atomic("A", &[], &[]);
        a.references.push(Reference {
            name: "r".to_string(),
            interface: Some(contract("Quote")),
            targets: vec!["B/S".to_string()],
            ..Default::default()
        });
        let mut b = atomic("B", &[], &[]);
        if let Some(crate::model::Implementation::Atomic(ty)) = b.implementation.as_mut() {
            ty.services.push(crate::model::Service {
                name: "S".to_string(),
                interface: Some(InterfaceContract::new(crate::model::Interface {
                    name: "Billing".to_string(),
                    remotable: false,
                    operations: vec!["charge".to_string()],
                })),
                ..Default::default()
            });
        }
        let (assembly, monitor) = build(vec![a, b], vec![], None);

        assert_eq!(monitor.count("ReferenceIncompatibleInterface"), 1);
        assert_eq!(monitor.count("ReferenceWithoutTargets"), 1);
        let r = assembly.reference(reference_of(&assembly, "A", "r"));
        assert!(r.endpoints.is_empty());
    }

    #[test]
    fn test_binding_uri_resolves_in_composite_or_external() {
        let a = with_reference(
            atomic("A", &[], &["r", "ext"]),
            Reference {
                name: "r".to_string(),
                bindings: vec![Binding::sca().with_uri("B/S")],
                ..Default::default()
            },
        );
        let a = with_reference(
            a,
            Reference {
                name: "ext".to_string(),
                bindings: vec![Binding::new("binding.ws").with_uri("http://example.com/quotes")],
                ..Default::default()
            },
        );
        let (assembly, monitor) = build(vec![a, atomic("B", &["S"], &[])], vec![], None);

        let r = assembly.reference(reference_of(&assembly, "A", "r"));
        assert_eq!(r.endpoints[0].target_name(&assembly), "B/S");
        let ext = assembly.reference(reference_of(&assembly, "A", "ext"));
        assert_eq!(
            ext.endpoints[0].target,
            EndpointTarget::External {
                uri: "http://example.com/quotes".to_string()
            }
        );
        assert!(monitor.problems().is_empty(), "{:?}", monitor.problems());
    }

    #[test]
    fn test_missing_required_target_reported() {
        let (_, monitor) = build(vec![atomic("A", &[], &["r"])], vec![], None);
        assert_eq!(monitor.count("ReferenceWithoutTargets"), 1);
    }

    proptest! {
        #[test]
        fn prop_multiplicity_checked_against_target_count(
            count in 0usize..4,
            multiplicity in prop_oneof![
                Just(Multiplicity::ZeroOne),
                Just(Multiplicity::OneOne),
                Just(Multiplicity::ZeroN),
                Just(Multiplicity::OneN),
            ],
        ) {
            let names: Vec<String> = (0..count).map(|i| format!("T{}", i)).collect();
            let mut components: Vec<Component> =
                names.iter().map(|n| atomic(n, &["S"], &[])).collect();
            components.push(with_reference(
                atomic("A", &[], &["r"]),
                Reference {
                    name: "r".to_string(),
                    multiplicity: Some(multiplicity),
                    targets: names.clone(),
                    ..Default::default()
                },
            ));
            let (assembly, monitor) = build(components, vec![], None);

            let r = assembly.reference(reference_of(&assembly, "A", "r"));
            prop_assert_eq!(r.endpoints.len(), count);
            let problems = monitor.count("ReferenceWithoutTargets") + monitor.count("TooManyReferenceTargets");
            prop_assert_eq!(problems == 0, multiplicity.accepts(count));
        }
    }
}
