//! Loading a contribution into the arena
//!
//! Each use of a composite as a component implementation gets its own copy,
//! so nested assemblies can be configured independently. Includes are
//! flattened into the including composite. Bindings are validated by the
//! binding processors on the way in.

use super::{
    AtomicImplementation, Assembly, ComponentId, ComponentNode, CompositeId, CompositeNode,
    ImplementationNode, Owner, ReferenceId, ReferenceKind, ReferenceNode, ReferencePromotion,
    ServiceId, ServiceKind, ServiceNode, ServicePromotion,
};
use crate::binding::ProcessorRegistry;
use crate::error::{BuildError, Result};
use crate::model::{
    Binding, Callback, Component, Composite, CompositeReference, CompositeService, Contribution,
    Implementation, QName, Reference, Service,
};
use crate::monitor::Monitor;
use std::collections::HashSet;

pub(crate) fn load(
    contribution: &Contribution,
    processors: &ProcessorRegistry,
    monitor: &mut Monitor,
) -> Result<Assembly> {
    let deployable = contribution
        .find_composite(&contribution.deployable)
        .ok_or_else(|| BuildError::DeployableNotFound(contribution.deployable.to_string()))?;

    let mut loader = Loader {
        contribution,
        processors,
        assembly: Assembly::new(contribution.definitions.clone()),
        stack: Vec::new(),
    };
    let root = loader.instantiate(deployable, None, monitor)?;
    loader.assembly.set_root(root);

    tracing::debug!(
        deployable = %contribution.deployable,
        composites = loader.assembly.composites.len(),
        components = loader.assembly.components.len(),
        "loaded contribution"
    );
    Ok(loader.assembly)
}

/// A composite with its includes merged in
struct Flattened {
    components: Vec<Component>,
    services: Vec<CompositeService>,
    references: Vec<CompositeReference>,
    properties: Vec<crate::model::Property>,
    wires: Vec<crate::model::Wire>,
}

struct Loader<'a> {
    contribution: &'a Contribution,
    processors: &'a ProcessorRegistry,
    assembly: Assembly,
    /// Composites being instantiated, outermost first
    stack: Vec<QName>,
}

impl Loader<'_> {
    fn instantiate(
        &mut self,
        raw: &Composite,
        implements: Option<ComponentId>,
        monitor: &mut Monitor,
    ) -> Result<CompositeId> {
        if self.stack.contains(&raw.name) {
            let mut cycle: Vec<String> = self.stack.iter().map(|n| n.to_string()).collect();
            cycle.push(raw.name.to_string());
            return Err(BuildError::ImplementationCycle(cycle));
        }
        self.stack.push(raw.name.clone());

        let flattened = self.flatten_includes(raw, monitor);
        let id = self.assembly.add_composite(CompositeNode {
            name: raw.name.clone(),
            autowire: raw.autowire,
            components: Vec::new(),
            services: Vec::new(),
            references: Vec::new(),
            properties: flattened.properties,
            wires: flattened.wires,
            intents: raw.intents.clone(),
            policy_sets: raw.policy_sets.clone(),
            implements,
        });

        for component in &flattened.components {
            let component_id = self.add_component(id, component, monitor)?;
            self.assembly.composite_mut(id).components.push(component_id);
        }

        for service in &flattened.services {
            let service_id = self.add_composite_service(id, service)?;
            self.assembly.composite_mut(id).services.push(service_id);
        }

        for reference in &flattened.references {
            let reference_id = self.add_composite_reference(id, reference)?;
            self.assembly.composite_mut(id).references.push(reference_id);
        }

        self.stack.pop();
        Ok(id)
    }

    fn flatten_includes(&self, raw: &Composite, monitor: &mut Monitor) -> Flattened {
        let mut flattened = Flattened {
            components: raw.components.clone(),
            services: raw.services.clone(),
            references: raw.references.clone(),
            properties: raw.properties.clone(),
            wires: raw.wires.clone(),
        };
        let mut visited = HashSet::new();
        visited.insert(raw.name.clone());
        self.merge_includes(raw, &mut flattened, &mut visited, monitor);
        flattened
    }

    fn merge_includes(
        &self,
        raw: &Composite,
        into: &mut Flattened,
        visited: &mut HashSet<QName>,
        monitor: &mut Monitor,
    ) {
        for name in &raw.includes {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(included) = self.contribution.find_composite(name) else {
                monitor.warning(
                    "IncludedCompositeNotFound",
                    raw.name.to_string(),
                    &[&name.to_string()],
                );
                continue;
            };
            into.components
                .extend(included.components.iter().cloned().map(|mut component| {
                    if component.autowire.is_none() {
                        component.autowire = included.autowire;
                    }
                    component
                }));
            into.services.extend(included.services.iter().cloned());
            into.references.extend(included.references.iter().cloned());
            into.properties.extend(included.properties.iter().cloned());
            into.wires.extend(included.wires.iter().cloned());
            self.merge_includes(included, into, visited, monitor);
        }
    }

    fn add_component(
        &mut self,
        parent: CompositeId,
        raw: &Component,
        monitor: &mut Monitor,
    ) -> Result<ComponentId> {
        let id = self.assembly.add_component(ComponentNode {
            name: raw.name.clone(),
            uri: None,
            parent,
            implementation: ImplementationNode::Missing,
            services: Vec::new(),
            references: Vec::new(),
            properties: raw.properties.clone(),
            autowire: raw.autowire,
            intents: raw.intents.clone(),
            policy_sets: raw.policy_sets.clone(),
        });

        let implementation = match &raw.implementation {
            None => ImplementationNode::Missing,
            Some(Implementation::Atomic(component_type)) => {
                let owner = Owner::ComponentType(id);
                let mut services = Vec::new();
                for service in &component_type.services {
                    services.push(self.add_service(owner, service)?);
                }
                let mut references = Vec::new();
                for reference in &component_type.references {
                    references.push(self.add_reference(owner, reference)?);
                }
                ImplementationNode::Atomic(AtomicImplementation {
                    implementation_type: component_type.implementation_type.clone(),
                    services,
                    references,
                    properties: component_type.properties.clone(),
                    intents: component_type.intents.clone(),
                    policy_sets: component_type.policy_sets.clone(),
                    operations: component_type.operations.clone(),
                })
            }
            Some(Implementation::Composite { name }) => {
                let contribution = self.contribution;
                match contribution.find_composite(name) {
                    Some(nested) => {
                        ImplementationNode::Composite(self.instantiate(nested, Some(id), monitor)?)
                    }
                    None => ImplementationNode::Unresolved(name.clone()),
                }
            }
        };
        self.assembly.component_mut(id).implementation = implementation;

        let owner = Owner::Component(id);
        for service in &raw.services {
            let service_id = self.add_service(owner, service)?;
            self.assembly.component_mut(id).services.push(service_id);
        }
        for reference in &raw.references {
            let reference_id = self.add_reference(owner, reference)?;
            self.assembly.component_mut(id).references.push(reference_id);
        }
        Ok(id)
    }

    fn add_service(&mut self, owner: Owner, raw: &Service) -> Result<ServiceId> {
        let mut node = ServiceNode::new(raw.name.clone(), owner);
        node.interface = raw.interface.clone();
        node.intents = raw.intents.clone();
        node.policy_sets = raw.policy_sets.clone();
        node.operations = raw.operations.clone();
        let id = self.assembly.add_service(node);
        let path = self.assembly.service_path(id);
        let bindings = self.process_bindings(&raw.bindings, &path)?;
        let callback = self.process_callback(raw.callback.as_ref(), &path)?;
        let node = self.assembly.service_mut(id);
        node.bindings = bindings;
        node.callback = callback;
        Ok(id)
    }

    fn add_reference(&mut self, owner: Owner, raw: &Reference) -> Result<ReferenceId> {
        let mut node = ReferenceNode::new(raw.name.clone(), owner);
        node.interface = raw.interface.clone();
        node.multiplicity = raw.multiplicity;
        node.targets = raw.targets.clone();
        node.autowire = raw.autowire;
        node.intents = raw.intents.clone();
        node.policy_sets = raw.policy_sets.clone();
        node.operations = raw.operations.clone();
        let id = self.assembly.add_reference(node);
        let path = self.assembly.reference_path(id);
        let bindings = self.process_bindings(&raw.bindings, &path)?;
        let callback = self.process_callback(raw.callback.as_ref(), &path)?;
        let node = self.assembly.reference_mut(id);
        node.bindings = bindings;
        node.callback = callback;
        Ok(id)
    }

    fn add_composite_service(
        &mut self,
        composite: CompositeId,
        raw: &CompositeService,
    ) -> Result<ServiceId> {
        let mut node = ServiceNode::new(raw.name.clone(), Owner::Composite(composite));
        node.kind = ServiceKind::Promoting(ServicePromotion {
            target: raw.promote.clone(),
            resolved: None,
        });
        node.interface = raw.interface.clone();
        node.intents = raw.intents.clone();
        node.policy_sets = raw.policy_sets.clone();
        node.operations = raw.operations.clone();
        let id = self.assembly.add_service(node);
        let path = self.assembly.service_path(id);
        let bindings = self.process_bindings(&raw.bindings, &path)?;
        let callback = self.process_callback(raw.callback.as_ref(), &path)?;
        let node = self.assembly.service_mut(id);
        node.bindings = bindings;
        node.callback = callback;
        Ok(id)
    }

    fn add_composite_reference(
        &mut self,
        composite: CompositeId,
        raw: &CompositeReference,
    ) -> Result<ReferenceId> {
        let mut node = ReferenceNode::new(raw.name.clone(), Owner::Composite(composite));
        node.kind = ReferenceKind::Promoting(
            raw.promote
                .iter()
                .map(|target| ReferencePromotion {
                    target: target.clone(),
                    resolved: None,
                })
                .collect(),
        );
        node.interface = raw.interface.clone();
        node.multiplicity = raw.multiplicity;
        node.intents = raw.intents.clone();
        node.policy_sets = raw.policy_sets.clone();
        node.operations = raw.operations.clone();
        let id = self.assembly.add_reference(node);
        let path = self.assembly.reference_path(id);
        let bindings = self.process_bindings(&raw.bindings, &path)?;
        let callback = self.process_callback(raw.callback.as_ref(), &path)?;
        let node = self.assembly.reference_mut(id);
        node.bindings = bindings;
        node.callback = callback;
        Ok(id)
    }

    fn process_bindings(&self, bindings: &[Binding], path: &str) -> Result<Vec<Binding>> {
        bindings
            .iter()
            .map(|binding| {
                let mut binding = binding.clone();
                self.processors
                    .normalize(&mut binding)
                    .map_err(|source| BuildError::Binding {
                        model: path.to_string(),
                        source,
                    })?;
                Ok(binding)
            })
            .collect()
    }

    fn process_callback(&self, callback: Option<&Callback>, path: &str) -> Result<Option<Callback>> {
        callback
            .map(|callback| {
                Ok(Callback {
                    bindings: self.process_bindings(&callback.bindings, path)?,
                    intents: callback.intents.clone(),
                    policy_sets: callback.policy_sets.clone(),
                })
            })
            .transpose()
    }
}
