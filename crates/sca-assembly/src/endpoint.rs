//! Reference to service linkage

use crate::assembly::{Assembly, ComponentId, ReferenceId, ServiceId};
use crate::model::{Binding, InterfaceContract};
use crate::monitor::Monitor;

/// What an endpoint points at
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointTarget {
    /// A service of a component in the same composite
    Resolved {
        component: ComponentId,
        service: ServiceId,
    },
    /// A named target not present in the composite, left for runtime
    /// resolution; carries the reference bindings as matching candidates
    Unresolved { name: String, bindings: Vec<Binding> },
    /// A hand-configured binding URI pointing outside the assembly
    External { uri: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub source_component: ComponentId,
    pub source_reference: ReferenceId,
    pub target: EndpointTarget,
    pub interface: Option<InterfaceContract>,
    pub candidate_bindings: Vec<Binding>,
    /// Reference binding chosen to reach the target
    pub source_binding: Option<Binding>,
    /// Target service binding matching `source_binding`
    pub target_binding: Option<Binding>,
    pub source_callback_binding: Option<Binding>,
    /// Set once the endpoint builder has run
    pub built: bool,
}

impl Endpoint {
    pub fn new(
        source_component: ComponentId,
        source_reference: ReferenceId,
        target: EndpointTarget,
    ) -> Self {
        Self {
            source_component,
            source_reference,
            target,
            interface: None,
            candidate_bindings: Vec::new(),
            source_binding: None,
            target_binding: None,
            source_callback_binding: None,
            built: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.target, EndpointTarget::Resolved { .. })
    }

    /// Target name for display: `component/service`, the raw name or the URI
    pub fn target_name(&self, assembly: &Assembly) -> String {
        match &self.target {
            EndpointTarget::Resolved { component, service } => format!(
                "{}/{}",
                assembly.component(*component).name,
                assembly.service(*service).name
            ),
            EndpointTarget::Unresolved { name, .. } => name.clone(),
            EndpointTarget::External { uri } => uri.clone(),
        }
    }
}

/// Binding-type specific target discovery for an endpoint
pub trait EndpointBuilder {
    fn build(&self, endpoint: &mut Endpoint, assembly: &Assembly, monitor: &mut Monitor);
}

/// Matches candidate reference bindings with target service bindings by type
///
/// For a resolved target the first candidate whose binding type is also
/// offered by the target service is chosen; without one the first candidate
/// is kept and `NoMatchingBinding` is reported. Unresolved targets keep their
/// first candidate so runtime resolution has a binding to start from.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEndpointBuilder;

impl EndpointBuilder for DefaultEndpointBuilder {
    fn build(&self, endpoint: &mut Endpoint, assembly: &Assembly, monitor: &mut Monitor) {
        match &endpoint.target {
            EndpointTarget::Resolved { service, .. } => {
                let target_service = assembly.service(*service);
                let matched = endpoint.candidate_bindings.iter().find_map(|candidate| {
                    target_service
                        .bindings
                        .iter()
                        .find(|b| b.binding_type == candidate.binding_type)
                        .map(|target| (candidate.clone(), target.clone()))
                });
                match matched {
                    Some((source, target)) => {
                        endpoint.source_callback_binding = assembly
                            .reference(endpoint.source_reference)
                            .callback
                            .as_ref()
                            .and_then(|cb| {
                                cb.bindings
                                    .iter()
                                    .find(|b| b.binding_type == source.binding_type)
                                    .cloned()
                            });
                        endpoint.source_binding = Some(source);
                        endpoint.target_binding = Some(target);
                    }
                    None => {
                        monitor.warning(
                            "NoMatchingBinding",
                            assembly.reference_path(endpoint.source_reference),
                            &[&target_service.name],
                        );
                        endpoint.source_binding = endpoint.candidate_bindings.first().cloned();
                    }
                }
            }
            EndpointTarget::Unresolved { .. } => {
                endpoint.source_binding = endpoint.candidate_bindings.first().cloned();
            }
            EndpointTarget::External { .. } => {}
        }
        endpoint.built = true;
    }
}
