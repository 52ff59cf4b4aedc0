//! Component configuration against the implementation's component type
//!
//! Every component service, reference and property is linked to the
//! implementation-level declaration of the same name. Declarations the
//! component leaves out are synthesized so that each component exposes the
//! full component type. Interfaces, multiplicities, bindings, callbacks,
//! autowire and property settings default from the implementation.

use crate::assembly::{
    Assembly, ComponentId, CompositeId, ImplementationNode, Owner, ReferenceId, ReferenceNode,
    ServiceId, ServiceNode, SELF_REFERENCE_PREFIX,
};
use crate::interface::InterfaceContractMapper;
use crate::model::{Callback, InterfaceContract, Property};
use crate::monitor::Monitor;
use std::collections::{HashMap, HashSet};

pub(crate) fn reconcile_component(
    assembly: &mut Assembly,
    component: ComponentId,
    mapper: &dyn InterfaceContractMapper,
    monitor: &mut Monitor,
) {
    let path = assembly.component_path(component);
    match &assembly.component(component).implementation {
        ImplementationNode::Missing => {
            monitor.warning(
                "MissingComponentImplementation",
                path.as_str(),
                &[&assembly.component(component).name],
            );
        }
        ImplementationNode::Unresolved(name) => {
            monitor.warning("ImplementationNotFound", path.as_str(), &[&name.to_string()]);
        }
        ImplementationNode::Atomic(_) | ImplementationNode::Composite(_) => {}
    }

    reconcile_services(assembly, component, &path, mapper, monitor);
    reconcile_references(assembly, component, &path, mapper, monitor);
    reconcile_properties(assembly, component, &path, monitor);
}

/// First declaration wins; later ones with the same name are reported
fn index_by_name<T: Copy>(
    entries: Vec<(String, T)>,
    message_id: &'static str,
    path: &str,
    monitor: &mut Monitor,
) -> (Vec<(String, T)>, HashMap<String, T>) {
    let mut ordered = Vec::new();
    let mut by_name = HashMap::new();
    for (name, id) in entries {
        if by_name.contains_key(&name) {
            monitor.warning(message_id, path, &[&name]);
            continue;
        }
        by_name.insert(name.clone(), id);
        ordered.push((name, id));
    }
    (ordered, by_name)
}

fn reconcile_services(
    assembly: &mut Assembly,
    component: ComponentId,
    path: &str,
    mapper: &dyn InterfaceContractMapper,
    monitor: &mut Monitor,
) {
    let declared: Vec<(String, ServiceId)> = assembly
        .implementation_services(component)
        .into_iter()
        .map(|id| (assembly.service(id).name.clone(), id))
        .collect();
    let (declared, by_name) =
        index_by_name(declared, "DuplicateImplementationServiceName", path, monitor);

    let mut configured = HashSet::new();
    for service_id in assembly.component(component).services.clone() {
        let name = assembly.service(service_id).name.clone();
        match by_name.get(&name) {
            Some(&implementation) => {
                assembly.service_mut(service_id).implementation_service = Some(implementation);
            }
            None => monitor.warning("ServiceNotFoundForComponentService", path, &[&name]),
        }
        configured.insert(name);
    }

    for (name, implementation) in declared {
        if configured.contains(&name) {
            continue;
        }
        let mut node = ServiceNode::new(name, Owner::Component(component));
        node.is_callback = assembly.service(implementation).is_callback;
        node.implementation_service = Some(implementation);
        let id = assembly.add_service(node);
        assembly.component_mut(component).services.push(id);
    }

    for service_id in assembly.component(component).services.clone() {
        let Some(implementation) = assembly.service(service_id).implementation_service else {
            continue;
        };
        let declared = assembly.service(implementation).clone();
        let service = assembly.service_mut(service_id);

        if service.interface.is_none() {
            service.interface = declared.interface.clone();
        } else if let (Some(component_contract), Some(declared_contract)) =
            (&service.interface, &declared.interface)
        {
            if component_contract != declared_contract
                && !mapper.is_compatible(component_contract, declared_contract)
            {
                monitor.warning("ServiceIncompatibleComponentInterface", path, &[&service.name]);
            }
        }

        if service.bindings.is_empty() {
            service.bindings = declared.bindings.clone();
        }
        inherit_callback(&mut service.callback, declared.callback.as_ref());
    }
}

fn reconcile_references(
    assembly: &mut Assembly,
    component: ComponentId,
    path: &str,
    mapper: &dyn InterfaceContractMapper,
    monitor: &mut Monitor,
) {
    let declared: Vec<(String, ReferenceId)> = assembly
        .implementation_references(component)
        .into_iter()
        .map(|id| (assembly.reference(id).name.clone(), id))
        .collect();
    let (declared, by_name) =
        index_by_name(declared, "DuplicateImplementationReferenceName", path, monitor);

    let mut configured = HashSet::new();
    for reference_id in assembly.component(component).references.clone() {
        let name = assembly.reference(reference_id).name.clone();
        match by_name.get(&name) {
            Some(&implementation) => {
                assembly.reference_mut(reference_id).implementation_reference = Some(implementation);
            }
            None if name.starts_with(SELF_REFERENCE_PREFIX) => {}
            None => monitor.warning("ReferenceNotFoundForComponentReference", path, &[&name]),
        }
        configured.insert(name);
    }

    for (name, implementation) in declared {
        if configured.contains(&name) {
            continue;
        }
        let mut node = ReferenceNode::new(name, Owner::Component(component));
        node.is_callback = assembly.reference(implementation).is_callback;
        node.implementation_reference = Some(implementation);
        let id = assembly.add_reference(node);
        assembly.component_mut(component).references.push(id);
    }

    let component_autowire = assembly.component(component).autowire;
    for reference_id in assembly.component(component).references.clone() {
        let declared = assembly
            .reference(reference_id)
            .implementation_reference
            .map(|id| assembly.reference(id).clone());
        let reference = assembly.reference_mut(reference_id);

        let Some(declared) = declared else {
            if reference.autowire.is_none() {
                reference.autowire = component_autowire;
            }
            continue;
        };

        match reference.multiplicity {
            Some(multiplicity) => {
                if !multiplicity.is_valid_override(declared.effective_multiplicity()) {
                    monitor.warning(
                        "ReferenceIncompatibleMultiplicity",
                        path,
                        &[&reference.name],
                    );
                }
            }
            None => reference.multiplicity = declared.multiplicity,
        }

        if reference.interface.is_none() {
            reference.interface = declared.interface.clone();
        } else if let (Some(component_contract), Some(declared_contract)) =
            (&reference.interface, &declared.interface)
        {
            if component_contract != declared_contract
                && !mapper.is_compatible(declared_contract, component_contract)
            {
                monitor.warning(
                    "ReferenceIncompatibleComponentInterface",
                    path,
                    &[&reference.name],
                );
            }
        }

        if reference.bindings.is_empty() {
            reference.bindings = declared.bindings.clone();
        }
        inherit_callback(&mut reference.callback, declared.callback.as_ref());

        if reference.autowire.is_none() {
            reference.autowire = declared.autowire.or(component_autowire);
        }
    }
}

/// An absent callback is inherited, a callback without bindings takes the
/// declared callback bindings
fn inherit_callback(callback: &mut Option<Callback>, declared: Option<&Callback>) {
    if let Some(callback) = callback.as_mut() {
        if callback.bindings.is_empty() {
            if let Some(declared) = declared {
                callback.bindings = declared.bindings.clone();
            }
        }
    } else {
        *callback = declared.cloned();
    }
}

fn reconcile_properties(
    assembly: &mut Assembly,
    component: ComponentId,
    path: &str,
    monitor: &mut Monitor,
) {
    let declared: Vec<(String, usize)> = assembly
        .implementation_properties(component)
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.clone(), i))
        .collect();
    let (declared, by_name) =
        index_by_name(declared, "DuplicateImplementationPropertyName", path, monitor);
    let implementation_properties = assembly.implementation_properties(component);

    let node = assembly.component_mut(component);
    let configured: HashSet<String> = node.properties.iter().map(|p| p.name.clone()).collect();

    for property in &mut node.properties {
        let Some(&index) = by_name.get(&property.name) else {
            monitor.warning("PropertyNotFound", path, &[&property.name]);
            continue;
        };
        reconcile_property(property, &implementation_properties[index], path, monitor);
    }

    for (name, index) in declared {
        if configured.contains(&name) {
            continue;
        }
        let declared = &implementation_properties[index];
        if declared.must_supply && declared.value.is_none() {
            monitor.warning("PropertyMustSupplyNull", path, &[&name]);
        }
        node.properties.push(declared.clone());
    }
}

fn reconcile_property(property: &mut Property, declared: &Property, path: &str, monitor: &mut Monitor) {
    if !declared.must_supply && property.must_supply {
        monitor.warning("PropertyMustSupplyIncompatible", path, &[&property.name]);
    }
    property.must_supply |= declared.must_supply;

    if property.value.is_none() {
        property.value = declared.value.clone();
    }
    if property.value.is_none() && property.source.is_none() && declared.must_supply {
        monitor.warning("PropertyMustSupplyNull", path, &[&property.name]);
    }

    if !declared.many && property.many {
        monitor.warning("PropertyOverrideManyAttribute", path, &[&property.name]);
    }
    property.many = declared.many;

    if property.property_type.is_none() {
        property.property_type = declared.property_type.clone();
    }
}

/// Mirror services and references for bidirectional interfaces
///
/// A reference whose contract has a callback interface gets a callback
/// service of the same name, a service with a callback interface gets a
/// callback reference, unless the component already declares one.
pub(crate) fn configure_callbacks(assembly: &mut Assembly, component: ComponentId) {
    for reference_id in assembly.component(component).references.clone() {
        let reference = assembly.reference(reference_id);
        let Some(callback_interface) = callback_interface(reference.interface.as_ref()) else {
            continue;
        };
        let callback_bindings = reference
            .callback
            .as_ref()
            .map(|cb| cb.bindings.clone())
            .unwrap_or_default();
        let name = reference.name.clone();

        let service_id = match assembly.find_service(component, &name) {
            Some(existing) => existing,
            None => {
                let mut node = ServiceNode::new(name, Owner::Component(component));
                node.is_callback = true;
                node.interface = Some(callback_interface);
                let id = assembly.add_service(node);
                assembly.component_mut(component).services.push(id);
                id
            }
        };
        let service = assembly.service_mut(service_id);
        if service.bindings.is_empty() {
            service.bindings = callback_bindings;
        }
    }

    for service_id in assembly.component(component).services.clone() {
        let service = assembly.service(service_id);
        let Some(callback_interface) = callback_interface(service.interface.as_ref()) else {
            continue;
        };
        let callback_bindings = service
            .callback
            .as_ref()
            .map(|cb| cb.bindings.clone())
            .unwrap_or_default();
        let name = service.name.clone();

        let reference_id = match assembly.find_reference(component, &name) {
            Some(existing) => existing,
            None => {
                let mut node = ReferenceNode::new(name, Owner::Component(component));
                node.is_callback = true;
                node.interface = Some(callback_interface);
                let id = assembly.add_reference(node);
                assembly.component_mut(component).references.push(id);
                id
            }
        };
        let reference = assembly.reference_mut(reference_id);
        if reference.bindings.is_empty() {
            reference.bindings = callback_bindings;
        }
    }
}

fn callback_interface(contract: Option<&InterfaceContract>) -> Option<InterfaceContract> {
    contract
        .and_then(|c| c.callback.clone())
        .map(InterfaceContract::new)
}

/// Resolve `$name` property sources top-down
///
/// Property values of a component implemented by a composite become the
/// values of that composite's properties, which nested components can source.
pub(crate) fn source_properties(assembly: &mut Assembly, monitor: &mut Monitor) {
    let root = assembly.root();
    source_composite_properties(assembly, root, monitor);
}

fn source_composite_properties(
    assembly: &mut Assembly,
    composite: CompositeId,
    monitor: &mut Monitor,
) {
    let composite_properties: HashMap<String, Option<String>> = assembly
        .composite(composite)
        .properties
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect();

    for component in assembly.composite(composite).components.clone() {
        let path = assembly.component_path(component);
        for property in &mut assembly.component_mut(component).properties {
            let Some(source) = &property.source else {
                continue;
            };
            let name = source
                .trim_start_matches('$')
                .split('/')
                .next()
                .unwrap_or_default();
            match composite_properties.get(name) {
                Some(value) => {
                    if value.is_some() {
                        property.value = value.clone();
                    }
                }
                None => monitor.warning("PropertySourceNotFound", path.as_str(), &[source.as_str()]),
            }
        }

        if let ImplementationNode::Composite(child) = assembly.component(component).implementation {
            let values: Vec<Property> = assembly.component(component).properties.clone();
            for property in &mut assembly.composite_mut(child).properties {
                if let Some(configured) = values.iter().find(|p| p.name == property.name) {
                    if configured.value.is_some() {
                        property.value = configured.value.clone();
                    }
                }
            }
            source_composite_properties(assembly, child, monitor);
        }
    }
}
