//! Serializable view of a built assembly

use super::{Assembly, ComponentId, CompositeId, ImplementationNode, ReferenceId, ServiceId};
use crate::endpoint::EndpointTarget;
use crate::model::{Binding, ConfiguredOperation, Multiplicity, Property, QName, Wire};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComposite {
    pub name: String,
    pub components: Vec<ResolvedComponent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ResolvedCompositeService>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ResolvedCompositeReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wires: Vec<Wire>,
}

impl ResolvedComposite {
    pub fn component(&self, name: &str) -> Option<&ResolvedComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComponent {
    pub name: String,
    pub uri: Option<String>,
    pub implementation: String,
    pub services: Vec<ResolvedService>,
    pub references: Vec<ResolvedReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<Box<ResolvedComposite>>,
}

impl ResolvedComponent {
    pub fn service(&self, name: &str) -> Option<&ResolvedService> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn reference(&self, name: &str) -> Option<&ResolvedReference> {
        self.references.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedService {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub callback: bool,
    pub bindings: Vec<Binding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub callback_bindings: Vec<Binding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReference {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    pub multiplicity: Multiplicity,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub callback: bool,
    pub bindings: Vec<Binding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub callback_bindings: Vec<Binding>,
    pub endpoints: Vec<ResolvedEndpoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Resolved,
    Unresolved,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEndpoint {
    pub status: EndpointStatus,
    /// `component/service`, the raw target name, or the external URI
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCompositeService {
    pub name: String,
    /// `component/service` the service finally promotes
    pub promoted: Option<String>,
    pub bindings: Vec<Binding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCompositeReference {
    pub name: String,
    pub promoted: Vec<String>,
    pub bindings: Vec<Binding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
}

pub(super) fn snapshot(assembly: &Assembly, id: CompositeId) -> ResolvedComposite {
    let composite = assembly.composite(id);
    ResolvedComposite {
        name: composite.name.to_string(),
        components: composite
            .components
            .iter()
            .map(|&c| component(assembly, c))
            .collect(),
        services: composite
            .services
            .iter()
            .map(|&s| composite_service(assembly, s))
            .collect(),
        references: composite
            .references
            .iter()
            .map(|&r| composite_reference(assembly, r))
            .collect(),
        properties: composite.properties.clone(),
        wires: composite.wires.clone(),
    }
}

fn component(assembly: &Assembly, id: ComponentId) -> ResolvedComponent {
    let node = assembly.component(id);
    let (implementation, composite) = match &node.implementation {
        ImplementationNode::Missing => ("<none>".to_string(), None),
        ImplementationNode::Unresolved(name) => (format!("<unresolved {}>", name), None),
        ImplementationNode::Atomic(atomic) => (atomic.implementation_type.clone(), None),
        ImplementationNode::Composite(child) => (
            format!("implementation.composite {}", assembly.composite(*child).name),
            Some(Box::new(snapshot(assembly, *child))),
        ),
    };
    ResolvedComponent {
        name: node.name.clone(),
        uri: node.uri.clone(),
        implementation,
        services: node.services.iter().map(|&s| service(assembly, s)).collect(),
        references: node
            .references
            .iter()
            .map(|&r| reference(assembly, r))
            .collect(),
        properties: node.properties.clone(),
        composite,
    }
}

fn service(assembly: &Assembly, id: ServiceId) -> ResolvedService {
    let node = assembly.service(id);
    ResolvedService {
        name: node.name.clone(),
        interface: node.interface.as_ref().map(|c| c.interface.name.clone()),
        callback: node.is_callback,
        bindings: node.bindings.clone(),
        callback_bindings: node
            .callback
            .as_ref()
            .map(|cb| cb.bindings.clone())
            .unwrap_or_default(),
        intents: node.intents.clone(),
        policy_sets: node.policy_sets.clone(),
        operations: node.operations.clone(),
    }
}

fn reference(assembly: &Assembly, id: ReferenceId) -> ResolvedReference {
    let node = assembly.reference(id);
    ResolvedReference {
        name: node.name.clone(),
        interface: node.interface.as_ref().map(|c| c.interface.name.clone()),
        multiplicity: node.effective_multiplicity(),
        callback: node.is_callback,
        bindings: node.bindings.clone(),
        callback_bindings: node
            .callback
            .as_ref()
            .map(|cb| cb.bindings.clone())
            .unwrap_or_default(),
        endpoints: node
            .endpoints
            .iter()
            .map(|endpoint| ResolvedEndpoint {
                status: match endpoint.target {
                    EndpointTarget::Resolved { .. } => EndpointStatus::Resolved,
                    EndpointTarget::Unresolved { .. } => EndpointStatus::Unresolved,
                    EndpointTarget::External { .. } => EndpointStatus::External,
                },
                target: endpoint.target_name(assembly),
                binding: endpoint.source_binding.clone(),
            })
            .collect(),
        intents: node.intents.clone(),
        policy_sets: node.policy_sets.clone(),
        operations: node.operations.clone(),
    }
}

fn composite_service(assembly: &Assembly, id: ServiceId) -> ResolvedCompositeService {
    let node = assembly.service(id);
    ResolvedCompositeService {
        name: node.name.clone(),
        promoted: node.promotion().and_then(|p| p.resolved).map(|(c, s)| {
            format!(
                "{}/{}",
                assembly.component(c).name,
                assembly.service(s).name
            )
        }),
        bindings: node.bindings.clone(),
        intents: node.intents.clone(),
        policy_sets: node.policy_sets.clone(),
    }
}

fn composite_reference(assembly: &Assembly, id: ReferenceId) -> ResolvedCompositeReference {
    let node = assembly.reference(id);
    ResolvedCompositeReference {
        name: node.name.clone(),
        promoted: node
            .promotions()
            .iter()
            .map(|p| match p.resolved {
                Some((c, r)) => format!(
                    "{}/{}",
                    assembly.component(c).name,
                    assembly.reference(r).name
                ),
                None => p.target.clone(),
            })
            .collect(),
        bindings: node.bindings.clone(),
        intents: node.intents.clone(),
        policy_sets: node.policy_sets.clone(),
    }
}
