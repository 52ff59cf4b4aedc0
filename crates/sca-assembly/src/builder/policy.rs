//! Effective intents and policy sets of every attach point
//!
//! Policy flows down the structure: composite into component, component
//! into implementation, service and reference, and those into their bindings
//! and callbacks. Composite services and references take the policy of what
//! they promote. Policy problems abort the build.

use crate::assembly::{Assembly, ComponentId, CompositeId, ImplementationNode};
use crate::error::Result;
use crate::model::{Binding, Callback, ConfiguredOperation, Definitions, QName};
use crate::policy::{add_inherited, add_inherited_operations, PolicyComputer};

pub(crate) fn compute_policies(assembly: &mut Assembly) -> Result<()> {
    let definitions = assembly.definitions().clone();
    let computer = PolicyComputer::new(&definitions);

    for composite in assembly.composites_bottom_up() {
        let (intents, policy_sets) = {
            let node = assembly.composite(composite);
            (node.intents.clone(), node.policy_sets.clone())
        };
        for component in assembly.composite(composite).components.clone() {
            let node = assembly.component_mut(component);
            add_inherited(&intents, &mut node.intents);
            add_inherited(&policy_sets, &mut node.policy_sets);
            compute_component(assembly, &computer, component)?;
        }
        compute_composite_services(assembly, &computer, composite)?;
        compute_composite_references(assembly, &computer, composite)?;
    }
    Ok(())
}

fn compute_component(
    assembly: &mut Assembly,
    computer: &PolicyComputer<'_>,
    component: ComponentId,
) -> Result<()> {
    let definitions = computer.definitions();
    let node = assembly.component(component).clone();

    if let ImplementationNode::Atomic(atomic) = &mut assembly.component_mut(component).implementation {
        let attach_type = atomic.implementation_type.clone();
        let extension = definitions.implementation_type(&attach_type);
        computer.validate_intents(&attach_type, &atomic.intents)?;
        computer.validate_policy_sets(&attach_type, &atomic.policy_sets)?;

        let mut intents = atomic.intents.clone();
        intents.extend(computer.inheritable_intents(&attach_type, &node.intents)?);
        let mut intents = computer.normalize_intents(&intents);
        add_inherited(
            &computer.inheritable_policy_sets(&attach_type, &node.policy_sets)?,
            &mut atomic.policy_sets,
        );
        computer.trim_inherent(extension, &mut intents);
        computer.trim_provided(&mut intents, &atomic.policy_sets);
        computer.intents_for_operations(
            Some(attach_type.as_str()),
            extension,
            &mut atomic.operations,
            &intents,
        )?;
        atomic.intents = intents;
    }

    for service_id in node.services {
        let implementation = assembly
            .service(service_id)
            .implementation_service
            .map(|id| assembly.service(id).clone());
        let service = assembly.service_mut(service_id);
        add_inherited(&node.intents, &mut service.intents);
        add_inherited(&node.policy_sets, &mut service.policy_sets);
        if let Some(implementation) = implementation {
            add_inherited(&implementation.intents, &mut service.intents);
            add_inherited(&implementation.policy_sets, &mut service.policy_sets);
            add_inherited_operations(&implementation.operations, &mut service.operations);
        }
        service.intents = computer.normalize_intents(&service.intents);
        let parent = ParentPolicy::of(&service.intents, &service.policy_sets, &service.operations);
        parent.compute_bindings(computer, &mut service.bindings)?;
        parent.compute_callback(computer, service.callback.as_mut())?;
    }

    for reference_id in node.references {
        let implementation = assembly
            .reference(reference_id)
            .implementation_reference
            .map(|id| assembly.reference(id).clone());
        let reference = assembly.reference_mut(reference_id);
        add_inherited(&node.intents, &mut reference.intents);
        add_inherited(&node.policy_sets, &mut reference.policy_sets);
        if let Some(implementation) = implementation {
            add_inherited(&implementation.intents, &mut reference.intents);
            add_inherited(&implementation.policy_sets, &mut reference.policy_sets);
            add_inherited_operations(&implementation.operations, &mut reference.operations);
        }
        reference.intents = computer.normalize_intents(&reference.intents);
        let parent = ParentPolicy::of(&reference.intents, &reference.policy_sets, &reference.operations);
        parent.compute_bindings(computer, &mut reference.bindings)?;
        parent.compute_callback(computer, reference.callback.as_mut())?;
        for endpoint in &mut reference.endpoints {
            if let Some(binding) = endpoint.source_binding.as_mut() {
                parent.compute_bindings(computer, std::slice::from_mut(binding))?;
            }
        }
    }
    Ok(())
}

fn compute_composite_services(
    assembly: &mut Assembly,
    computer: &PolicyComputer<'_>,
    composite: CompositeId,
) -> Result<()> {
    let (intents, policy_sets) = {
        let node = assembly.composite(composite);
        (node.intents.clone(), node.policy_sets.clone())
    };
    for service_id in assembly.composite(composite).services.clone() {
        let promoted = assembly
            .service(service_id)
            .promotion()
            .and_then(|p| p.resolved)
            .map(|(_, promoted)| assembly.service(promoted).clone());
        let service = assembly.service_mut(service_id);
        add_inherited(&intents, &mut service.intents);
        add_inherited(&policy_sets, &mut service.policy_sets);
        if let Some(promoted) = promoted {
            add_inherited(&promoted.intents, &mut service.intents);
            add_inherited(&promoted.policy_sets, &mut service.policy_sets);
        }
        service.intents = computer.normalize_intents(&service.intents);
        let parent = ParentPolicy::of(&service.intents, &service.policy_sets, &service.operations);
        parent.compute_bindings(computer, &mut service.bindings)?;
        parent.compute_callback(computer, service.callback.as_mut())?;
    }
    Ok(())
}

fn compute_composite_references(
    assembly: &mut Assembly,
    computer: &PolicyComputer<'_>,
    composite: CompositeId,
) -> Result<()> {
    let (intents, policy_sets) = {
        let node = assembly.composite(composite);
        (node.intents.clone(), node.policy_sets.clone())
    };
    for reference_id in assembly.composite(composite).references.clone() {
        let promoted: Vec<_> = assembly
            .reference(reference_id)
            .promotions()
            .iter()
            .filter_map(|p| p.resolved)
            .map(|(_, promoted)| {
                let node = assembly.reference(promoted);
                (node.intents.clone(), node.policy_sets.clone())
            })
            .collect();
        let reference = assembly.reference_mut(reference_id);
        add_inherited(&intents, &mut reference.intents);
        add_inherited(&policy_sets, &mut reference.policy_sets);
        for (promoted_intents, promoted_sets) in &promoted {
            add_inherited(promoted_intents, &mut reference.intents);
            add_inherited(promoted_sets, &mut reference.policy_sets);
        }
        reference.intents = computer.normalize_intents(&reference.intents);
        let parent = ParentPolicy::of(&reference.intents, &reference.policy_sets, &reference.operations);
        parent.compute_bindings(computer, &mut reference.bindings)?;
        parent.compute_callback(computer, reference.callback.as_mut())?;
    }
    Ok(())
}

/// Policy of a service or reference, inherited by its bindings
struct ParentPolicy {
    intents: Vec<QName>,
    policy_sets: Vec<QName>,
    operations: Vec<ConfiguredOperation>,
}

impl ParentPolicy {
    fn of(intents: &[QName], policy_sets: &[QName], operations: &[ConfiguredOperation]) -> Self {
        Self {
            intents: intents.to_vec(),
            policy_sets: policy_sets.to_vec(),
            operations: operations.to_vec(),
        }
    }

    fn compute_bindings(&self, computer: &PolicyComputer<'_>, bindings: &mut [Binding]) -> Result<()> {
        for binding in bindings {
            compute_binding(computer, binding, self)?;
        }
        Ok(())
    }

    /// The callback element inherits from its contract, its bindings from
    /// the callback element
    fn compute_callback(&self, computer: &PolicyComputer<'_>, callback: Option<&mut Callback>) -> Result<()> {
        let Some(callback) = callback else {
            return Ok(());
        };
        add_inherited(&self.intents, &mut callback.intents);
        add_inherited(&self.policy_sets, &mut callback.policy_sets);
        callback.intents = computer.normalize_intents(&callback.intents);
        ParentPolicy::of(&callback.intents, &callback.policy_sets, &self.operations)
            .compute_bindings(computer, &mut callback.bindings)
    }
}

fn compute_binding(computer: &PolicyComputer<'_>, binding: &mut Binding, parent: &ParentPolicy) -> Result<()> {
    let definitions: &Definitions = computer.definitions();
    let attach_type = binding.binding_type.clone();
    let extension = definitions.binding_type(&attach_type);
    computer.validate_intents(&attach_type, &binding.intents)?;
    computer.validate_policy_sets(&attach_type, &binding.policy_sets)?;

    let mut intents = binding.intents.clone();
    intents.extend(computer.inheritable_intents(&attach_type, &parent.intents)?);
    let mut intents = computer.normalize_intents(&intents);

    let mut policy_sets = binding.policy_sets.clone();
    add_inherited(
        &computer.inheritable_policy_sets(&attach_type, &parent.policy_sets)?,
        &mut policy_sets,
    );

    computer.trim_inherent(extension, &mut intents);
    computer.trim_provided(&mut intents, &policy_sets);
    computer.attach_domain_policy_sets(&attach_type, &mut intents, &mut policy_sets);

    add_inherited_operations(&parent.operations, &mut binding.operations);
    computer.intents_for_operations(Some(attach_type.as_str()), extension, &mut binding.operations, &intents)?;

    binding.intents = intents;
    binding.policy_sets = policy_sets;
    Ok(())
}
