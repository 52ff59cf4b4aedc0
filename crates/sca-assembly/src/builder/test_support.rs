//! Fixture builders shared by the builder stage tests

use crate::assembly::{self, Assembly, ComponentId};
use crate::binding::ProcessorRegistry;
use crate::model::{
    Component, ComponentType, Composite, Contribution, Implementation, Interface,
    InterfaceContract, QName, Reference, Service,
};
use crate::monitor::Monitor;

pub fn contract(name: &str) -> InterfaceContract {
    InterfaceContract::new(Interface::named(name))
}

/// Component with an atomic implementation declaring the given services and
/// references; the component itself configures none of them
pub fn atomic(name: &str, services: &[&str], references: &[&str]) -> Component {
    Component {
        name: name.to_string(),
        implementation: Some(Implementation::Atomic(ComponentType {
            implementation_type: "implementation.java".to_string(),
            services: services
                .iter()
                .map(|s| Service {
                    name: s.to_string(),
                    ..Default::default()
                })
                .collect(),
            references: references
                .iter()
                .map(|r| Reference {
                    name: r.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })),
        ..Default::default()
    }
}

pub fn composite_component(name: &str, composite: &str) -> Component {
    Component {
        name: name.to_string(),
        implementation: Some(Implementation::Composite {
            name: QName::local(composite),
        }),
        ..Default::default()
    }
}

pub fn contribution(deployable: &str, composites: Vec<Composite>) -> Contribution {
    Contribution {
        deployable: QName::local(deployable),
        composites,
        ..Default::default()
    }
}

pub fn load(contribution: &Contribution) -> Assembly {
    assembly::load(contribution, &ProcessorRegistry::default(), &mut Monitor::new()).unwrap()
}

/// Component of the root composite by name
pub fn root_component(assembly: &Assembly, name: &str) -> ComponentId {
    assembly.find_component(assembly.root(), name).unwrap()
}
