//! Component URIs, autowire inheritance and per-composite configuration

use super::defaults::apply_default_bindings;
use super::index::CompositeIndex;
use super::reconcile;
use crate::assembly::{Assembly, CompositeId, ImplementationNode};
use crate::binding::BindingFactory;
use crate::interface::InterfaceContractMapper;
use crate::monitor::Monitor;

pub(crate) fn configure(
    assembly: &mut Assembly,
    mapper: &dyn InterfaceContractMapper,
    factory: &dyn BindingFactory,
    monitor: &mut Monitor,
) {
    let root = assembly.root();
    assign_uris(assembly, root, None);
    inherit_autowire(assembly, root);

    for composite in assembly.composites_bottom_up() {
        for component in assembly.composite(composite).components.clone() {
            reconcile::reconcile_component(assembly, component, mapper, monitor);
            reconcile::configure_callbacks(assembly, component);
        }
        CompositeIndex::build_reporting(assembly, composite, monitor);
        apply_default_bindings(assembly, composite, factory);
    }

    reconcile::source_properties(assembly, monitor);
}

/// Top-level components are named by their name, nested ones by the URI of
/// the component they implement followed by their name
fn assign_uris(assembly: &mut Assembly, composite: CompositeId, parent_uri: Option<&str>) {
    for component in assembly.composite(composite).components.clone() {
        let node = assembly.component_mut(component);
        let uri = match parent_uri {
            Some(parent) => format!("{}/{}", parent, node.name),
            None => node.name.clone(),
        };
        node.uri = Some(uri.clone());
        if let ImplementationNode::Composite(child) = node.implementation {
            assign_uris(assembly, child, Some(&uri));
        }
    }
}

/// Components without an autowire setting take their composite's
fn inherit_autowire(assembly: &mut Assembly, composite: CompositeId) {
    let autowire = assembly.composite(composite).autowire;
    for component in assembly.composite(composite).components.clone() {
        let node = assembly.component_mut(component);
        if node.autowire.is_none() {
            node.autowire = autowire;
        }
        if let ImplementationNode::Composite(child) = node.implementation {
            inherit_autowire(assembly, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ScaBindingFactory;
    use crate::builder::test_support::{atomic, composite_component, contribution, load};
    use crate::interface::DefaultContractMapper;
    use crate::model::{Composite, QName};

    #[test]
    fn test_nested_component_uris() {
        let inner = Composite {
            name: QName::local("Inner"),
            components: vec![atomic("Leaf", &["S"], &[])],
            ..Default::default()
        };
        let outer = Composite {
            name: QName::local("Outer"),
            autowire: Some(true),
            components: vec![composite_component("Mid", "Inner")],
            ..Default::default()
        };
        let mut assembly = load(&contribution("Outer", vec![outer, inner]));
        let mut monitor = Monitor::new();
        configure(&mut assembly, &DefaultContractMapper, &ScaBindingFactory, &mut monitor);

        let mid = assembly.composite(assembly.root()).components[0];
        assert_eq!(assembly.component(mid).uri.as_deref(), Some("Mid"));
        let ImplementationNode::Composite(child) = assembly.component(mid).implementation else {
            panic!("expected composite implementation");
        };
        let leaf = assembly.composite(child).components[0];
        assert_eq!(assembly.component(leaf).uri.as_deref(), Some("Mid/Leaf"));
        assert_eq!(assembly.component(leaf).autowire, None);
        assert_eq!(assembly.component(mid).autowire, Some(true));
    }

    #[test]
    fn test_services_get_named_default_binding() {
        let root = Composite {
            name: QName::local("C"),
            components: vec![atomic("A", &["S"], &["r"])],
            ..Default::default()
        };
        let mut assembly = load(&contribution("C", vec![root]));
        let mut monitor = Monitor::new();
        configure(&mut assembly, &DefaultContractMapper, &ScaBindingFactory, &mut monitor);

        let a = assembly.composite(assembly.root()).components[0];
        let service = assembly.find_service(a, "S").unwrap();
        let reference = assembly.find_reference(a, "r").unwrap();
        assert_eq!(assembly.service(service).bindings[0].name.as_deref(), Some("S"));
        assert_eq!(assembly.reference(reference).bindings[0].name.as_deref(), Some("r"));
        assert!(monitor.problems().is_empty());
    }
}
