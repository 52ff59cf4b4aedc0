//! Name lookup tables for the components of one composite

use crate::assembly::{Assembly, ComponentId, CompositeId, ReferenceId, ServiceId, PROMOTED_PREFIX};
use crate::monitor::Monitor;
use std::collections::{HashMap, HashSet};

/// Components, `component/service` and `component/reference` names of a composite
///
/// A component with exactly one non-callback, non-promoted service is also
/// reachable by its bare name in `services`. Later entries win on duplicates.
#[derive(Debug, Default)]
pub(crate) struct CompositeIndex {
    pub components: HashMap<String, ComponentId>,
    pub services: HashMap<String, (ComponentId, ServiceId)>,
    pub references: HashMap<String, (ComponentId, ReferenceId)>,
}

impl CompositeIndex {
    pub fn build(assembly: &Assembly, composite: CompositeId) -> Self {
        Self::index(assembly, composite, None)
    }

    /// Build the index and report duplicate names
    pub fn build_reporting(assembly: &Assembly, composite: CompositeId, monitor: &mut Monitor) -> Self {
        Self::index(assembly, composite, Some(monitor))
    }

    fn index(assembly: &Assembly, composite: CompositeId, mut monitor: Option<&mut Monitor>) -> Self {
        let mut index = Self::default();
        let composite_path = assembly.composite_path(composite);

        for &component_id in &assembly.composite(composite).components {
            let component = assembly.component(component_id);
            if index.components.insert(component.name.clone(), component_id).is_some() {
                if let Some(monitor) = monitor.as_deref_mut() {
                    monitor.warning("DuplicateComponentName", composite_path.as_str(), &[&component.name]);
                }
            }
            let component_path = assembly.component_path(component_id);

            let mut addressable = Vec::new();
            for &service_id in &component.services {
                let service = assembly.service(service_id);
                let key = format!("{}/{}", component.name, service.name);
                if index.services.insert(key, (component_id, service_id)).is_some() {
                    if let Some(monitor) = monitor.as_deref_mut() {
                        monitor.warning(
                            "DuplicateComponentServiceName",
                            component_path.as_str(),
                            &[&service.name],
                        );
                    }
                }
                if !service.is_callback && !service.name.starts_with(PROMOTED_PREFIX) {
                    addressable.push(service_id);
                }
            }
            if let [only] = addressable.as_slice() {
                index
                    .services
                    .insert(component.name.clone(), (component_id, *only));
            }

            for &reference_id in &component.references {
                let reference = assembly.reference(reference_id);
                let key = format!("{}/{}", component.name, reference.name);
                if index.references.insert(key, (component_id, reference_id)).is_some() {
                    if let Some(monitor) = monitor.as_deref_mut() {
                        monitor.warning(
                            "DuplicateComponentReferenceName",
                            component_path.as_str(),
                            &[&reference.name],
                        );
                    }
                }
            }

            if let Some(monitor) = monitor.as_deref_mut() {
                let mut seen = HashSet::new();
                for property in &component.properties {
                    if !seen.insert(property.name.as_str()) {
                        monitor.warning(
                            "DuplicateComponentPropertyName",
                            component_path.as_str(),
                            &[&property.name],
                        );
                    }
                }
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly;
    use crate::binding::ProcessorRegistry;
    use crate::model::{Component, ComponentType, Composite, Contribution, Implementation, QName, Service};

    fn component(name: &str, services: &[&str]) -> Component {
        Component {
            name: name.to_string(),
            implementation: Some(Implementation::Atomic(ComponentType {
                implementation_type: "implementation.java".to_string(),
                ..Default::default()
            })),
            services: services
                .iter()
                .map(|s| Service {
                    name: s.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn load(components: Vec<Component>) -> Assembly {
        let contribution = Contribution {
            deployable: QName::local("C"),
            composites: vec![Composite {
                name: QName::local("C"),
                components,
                ..Default::default()
            }],
            ..Default::default()
        };
        assembly::load(&contribution, &ProcessorRegistry::default(), &mut Monitor::new()).unwrap()
    }

    #[test]
    fn test_single_service_indexed_by_component_name() {
        let assembly = load(vec![component("A", &["S1"]), component("B", &["S1", "S2"])]);
        let index = CompositeIndex::build(&assembly, assembly.root());

        assert!(index.services.contains_key("A/S1"));
        assert!(index.services.contains_key("A"));
        assert!(index.services.contains_key("B/S2"));
        assert!(!index.services.contains_key("B"));
    }

    #[test]
    fn test_duplicates_reported_and_last_wins() {
        let assembly = load(vec![component("A", &["S1"]), component("A", &["S2"])]);
        let mut monitor = Monitor::new();
        let index = CompositeIndex::build_reporting(&assembly, assembly.root(), &mut monitor);

        assert_eq!(monitor.count("DuplicateComponentName"), 1);
        let last = assembly.composite(assembly.root()).components[1];
        assert_eq!(index.components["A"], last);
    }
}
