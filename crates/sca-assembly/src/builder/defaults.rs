//! Default bindings and binding names
//!
//! Services and references without bindings get the binding produced by the
//! [`BindingFactory`]. Bindings without a name take the name of their service
//! or reference. Running this twice changes nothing.

use crate::assembly::{Assembly, CompositeId};
use crate::binding::BindingFactory;
use crate::model::{Binding, Callback};

pub(crate) fn apply_default_bindings(
    assembly: &mut Assembly,
    composite: CompositeId,
    factory: &dyn BindingFactory,
) {
    let node = assembly.composite(composite);
    let mut services = node.services.clone();
    let mut references = node.references.clone();
    for &component in &node.components {
        services.extend(assembly.component(component).services.iter().copied());
        references.extend(assembly.component(component).references.iter().copied());
    }

    for service in services {
        let service = assembly.service_mut(service);
        fill(&service.name, &mut service.bindings, service.callback.as_mut(), factory);
    }
    for reference in references {
        let reference = assembly.reference_mut(reference);
        fill(&reference.name, &mut reference.bindings, reference.callback.as_mut(), factory);
    }
}

fn fill(
    contract: &str,
    bindings: &mut Vec<Binding>,
    callback: Option<&mut Callback>,
    factory: &dyn BindingFactory,
) {
    if bindings.is_empty() {
        bindings.push(factory.default_binding());
    }
    name_bindings(contract, bindings);
    if let Some(callback) = callback {
        name_bindings(contract, &mut callback.bindings);
    }
}

fn name_bindings(contract: &str, bindings: &mut [Binding]) {
    for binding in bindings.iter_mut().filter(|b| b.name.is_none()) {
        binding.name = Some(contract.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ScaBindingFactory;

    #[test]
    fn test_fill_is_idempotent() {
        let mut bindings = Vec::new();
        let mut callback = Callback {
            bindings: vec![Binding::new("binding.ws")],
            ..Default::default()
        };
        fill("orders", &mut bindings, Some(&mut callback), &ScaBindingFactory);

        assert_eq!(bindings, vec![Binding::sca().with_name("orders")]);
        assert_eq!(callback.bindings[0].name.as_deref(), Some("orders"));

        let (before, callback_before) = (bindings.clone(), callback.clone());
        fill("orders", &mut bindings, Some(&mut callback), &ScaBindingFactory);
        assert_eq!(bindings, before);
        assert_eq!(callback, callback_before);
    }

    #[test]
    fn test_explicit_names_kept() {
        let mut bindings = vec![Binding::new("binding.ws").with_name("soap")];
        fill("orders", &mut bindings, None, &ScaBindingFactory);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].name.as_deref(), Some("soap"));
    }
}
