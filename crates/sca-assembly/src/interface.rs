//! Interface compatibility checks used for matching references to services

use crate::model::{Interface, InterfaceContract};

/// Decides whether a reference contract can be satisfied by a service contract
pub trait InterfaceContractMapper {
    fn is_compatible(&self, source: &InterfaceContract, target: &InterfaceContract) -> bool;
}

/// Name and operation based compatibility
///
/// Two interfaces are compatible when they have the same name, or when they
/// agree on remotability and the target offers every operation of the source.
/// An interface with an empty name is a wildcard. When the source declares a
/// callback interface, the target must declare a compatible one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContractMapper;

impl DefaultContractMapper {
    fn interfaces_compatible(source: &Interface, target: &Interface) -> bool {
        if source.name.is_empty() || target.name.is_empty() || source.name == target.name {
            return true;
        }
        if source.remotable != target.remotable {
            return false;
        }
        !source.operations.is_empty()
            && source
                .operations
                .iter()
                .all(|op| target.operations.contains(op))
    }
}

impl InterfaceContractMapper for DefaultContractMapper {
    fn is_compatible(&self, source: &InterfaceContract, target: &InterfaceContract) -> bool {
        if !Self::interfaces_compatible(&source.interface, &target.interface) {
            return false;
        }
        match (&source.callback, &target.callback) {
            (Some(source_cb), Some(target_cb)) => Self::interfaces_compatible(source_cb, target_cb),
            (Some(_), None) => false,
            _ => true,
        }
    }
}

/// Compatibility of optional contracts; an undeclared contract matches anything
pub(crate) fn compatible(
    mapper: &dyn InterfaceContractMapper,
    source: Option<&InterfaceContract>,
    target: Option<&InterfaceContract>,
) -> bool {
    match (source, target) {
        (Some(source), Some(target)) => mapper.is_compatible(source, target),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(name: &str, ops: &[&str]) -> InterfaceContract {
        InterfaceContract::new(Interface {
            name: name.to_string(),
            remotable: false,
            operations: ops.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_same_name_is_compatible() {
        let mapper = DefaultContractMapper;
        assert!(mapper.is_compatible(&contract("I", &[]), &contract("I", &[])));
    }

    #[test]
    fn test_operation_subset_is_compatible() {
        let mapper = DefaultContractMapper;
        let reference = contract("Quotes", &["get"]);
        let service = contract("StockQuotes", &["get", "list"]);
        assert!(mapper.is_compatible(&reference, &service));
        assert!(!mapper.is_compatible(&service, &reference));
    }

    #[test]
    fn test_remotable_mismatch_is_incompatible() {
        let mapper = DefaultContractMapper;
        let mut remote = contract("A", &["get"]);
        remote.interface.remotable = true;
        assert!(!mapper.is_compatible(&remote, &contract("B", &["get"])));
    }

    #[test]
    fn test_missing_callback_on_target_is_incompatible() {
        let mapper = DefaultContractMapper;
        let source = contract("I", &[]).with_callback(Interface::named("ICallback"));
        assert!(!mapper.is_compatible(&source, &contract("I", &[])));
        let target = contract("I", &[]).with_callback(Interface::named("ICallback"));
        assert!(mapper.is_compatible(&source, &target));
    }

    #[test]
    fn test_undeclared_contract_matches() {
        let mapper = DefaultContractMapper;
        let declared = contract("I", &[]);
        assert!(compatible(&mapper, None, Some(&declared)));
        assert!(compatible(&mapper, Some(&declared), None));
    }
}
