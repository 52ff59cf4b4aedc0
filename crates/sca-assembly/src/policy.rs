//! Intent and policy set computation for a single attach point
//!
//! [`PolicyComputer`] holds the domain definitions and offers the steps the
//! policy stage of the builder chains together: profile expansion,
//! normalization, inheritance filtering, trimming of provided intents and
//! per-operation propagation.

use crate::error::{BuildError, Result};
use crate::model::{ConfiguredOperation, Definitions, ExtensionType, QName};
use std::collections::HashSet;

pub struct PolicyComputer<'a> {
    definitions: &'a Definitions,
}

impl<'a> PolicyComputer<'a> {
    pub fn new(definitions: &'a Definitions) -> Self {
        Self { definitions }
    }

    pub fn definitions(&self) -> &'a Definitions {
        self.definitions
    }

    /// Replace every profile intent by the intents it requires, recursively
    pub fn expand_profiles(&self, intents: &[QName]) -> Vec<QName> {
        let mut expanded = Vec::new();
        let mut visiting = HashSet::new();
        for intent in intents {
            self.expand_into(intent, &mut expanded, &mut visiting);
        }
        expanded
    }

    fn expand_into(&self, name: &QName, out: &mut Vec<QName>, visiting: &mut HashSet<QName>) {
        match self.definitions.intent(name) {
            Some(intent) if intent.is_profile() => {
                if !visiting.insert(name.clone()) {
                    return;
                }
                for required in &intent.requires {
                    self.expand_into(required, out, visiting);
                }
                visiting.remove(name);
            }
            _ => out.push(name.clone()),
        }
    }

    /// Base intent of a qualified intent
    ///
    /// Uses the explicit `qualifiable` of the definition, otherwise the name
    /// without its last `.qualifier` when that base intent is defined.
    pub fn qualifiable_of(&self, name: &QName) -> Option<QName> {
        if let Some(explicit) = self
            .definitions
            .intent(name)
            .and_then(|i| i.qualifiable.clone())
        {
            return Some(explicit);
        }
        name.qualifiable()
            .filter(|base| self.definitions.intent(base).is_some())
    }

    /// Innermost qualifiable intent of a chain of qualifications
    pub fn root_qualifiable(&self, name: &QName) -> QName {
        let mut current = name.clone();
        let mut seen = HashSet::new();
        while let Some(base) = self.qualifiable_of(&current) {
            if !seen.insert(current.clone()) {
                break;
            }
            current = base;
        }
        current
    }

    /// Expand profiles, remove duplicates and drop base intents whose
    /// qualified form is present
    pub fn normalize_intents(&self, intents: &[QName]) -> Vec<QName> {
        let expanded = self.expand_profiles(intents);
        let deduped = dedup(expanded);
        let qualified_bases: HashSet<QName> = deduped
            .iter()
            .filter_map(|intent| self.qualifiable_of(intent))
            .collect();
        deduped
            .into_iter()
            .filter(|intent| !qualified_bases.contains(intent))
            .collect()
    }

    /// Inherited intents that apply to `attach_type`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PolicyValidation`] when an inherited intent is not
    /// defined in the domain.
    pub fn inheritable_intents(&self, attach_type: &str, inherited: &[QName]) -> Result<Vec<QName>> {
        let mut applicable = Vec::new();
        for name in self.expand_profiles(inherited) {
            let intent = self.definitions.intent(&name).ok_or_else(|| {
                BuildError::PolicyValidation(format!(
                    "Policy Intent '{}' is not defined in this domain",
                    name
                ))
            })?;
            if intent.constrains_type(attach_type) {
                applicable.push(name);
            }
        }
        Ok(applicable)
    }

    /// Check intents attached directly to an extension of `attach_type`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PolicyValidation`] when an intent is not defined
    /// or does not constrain `attach_type`.
    pub fn validate_intents(&self, attach_type: &str, intents: &[QName]) -> Result<()> {
        for name in self.expand_profiles(intents) {
            match self.definitions.intent(&name) {
                None => {
                    return Err(BuildError::PolicyValidation(format!(
                        "Policy Intent '{}' is not defined in this domain",
                        name
                    )));
                }
                Some(intent) if !intent.constrains_type(attach_type) => {
                    return Err(BuildError::PolicyValidation(format!(
                        "Policy Intent '{}' does not constrain extension type {}",
                        name, attach_type
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Inherited policy sets that can be attached to `attach_type`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PolicyValidation`] when an inherited policy set
    /// is not defined in the domain.
    pub fn inheritable_policy_sets(
        &self,
        attach_type: &str,
        inherited: &[QName],
    ) -> Result<Vec<QName>> {
        let mut applicable = Vec::new();
        for name in inherited {
            let policy_set = self.definitions.policy_set(name).ok_or_else(|| {
                BuildError::PolicyValidation(format!(
                    "Policy Set '{}' is not defined in this domain",
                    name
                ))
            })?;
            if policy_set.applies_to(attach_type) {
                applicable.push(name.clone());
            }
        }
        Ok(applicable)
    }

    /// Check policy sets attached directly to an extension of `attach_type`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PolicyValidation`] when a policy set is not
    /// defined or does not apply to `attach_type`.
    pub fn validate_policy_sets(&self, attach_type: &str, policy_sets: &[QName]) -> Result<()> {
        for name in policy_sets {
            match self.definitions.policy_set(name) {
                None => {
                    return Err(BuildError::PolicyValidation(format!(
                        "Policy Set '{}' is not defined in this domain",
                        name
                    )));
                }
                Some(set) if !set.applies_to(attach_type) => {
                    return Err(BuildError::PolicyValidation(format!(
                        "Policy Set '{}' does not constrain extension type {}",
                        name, attach_type
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Drop intents the extension type always or optionally provides
    pub fn trim_inherent(&self, extension: Option<&ExtensionType>, intents: &mut Vec<QName>) {
        if let Some(extension) = extension {
            intents.retain(|intent| !extension.provides_inherently(intent));
        }
    }

    /// Drop intents satisfied by one of the attached policy sets
    pub fn trim_provided(&self, intents: &mut Vec<QName>, policy_sets: &[QName]) {
        for name in policy_sets {
            if let Some(set) = self.definitions.policy_set(name) {
                let provides = self.expand_profiles(&set.provides);
                intents.retain(|intent| !provides.contains(intent) && !set.satisfies(intent));
            }
        }
    }

    /// Attach domain policy sets applicable to `attach_type` that satisfy a
    /// still-required intent, trimming the intents they satisfy
    pub fn attach_domain_policy_sets(
        &self,
        attach_type: &str,
        intents: &mut Vec<QName>,
        policy_sets: &mut Vec<QName>,
    ) {
        if intents.is_empty() {
            return;
        }
        for set in self.definitions.applicable_policy_sets(attach_type) {
            if set.applies_to.is_empty() {
                continue;
            }
            let before = intents.len();
            self.trim_provided(intents, std::slice::from_ref(&set.name));
            if intents.len() != before && !policy_sets.contains(&set.name) {
                policy_sets.push(set.name.clone());
            }
        }
    }

    /// Propagate parent intents into configured operations and normalize them
    ///
    /// A parent intent is inherited unless the operation already requires an
    /// intent of the same family, i.e. one whose local name starts with the
    /// local name of the parent intent's root qualifiable intent.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PolicyValidation`] when an operation names a
    /// policy set that is not defined or does not apply to `attach_type`.
    pub fn intents_for_operations(
        &self,
        attach_type: Option<&str>,
        extension: Option<&ExtensionType>,
        operations: &mut [ConfiguredOperation],
        parent_intents: &[QName],
    ) -> Result<()> {
        for operation in operations.iter_mut() {
            let mut intents = self.expand_profiles(&operation.intents);
            let inherited: Vec<QName> = parent_intents
                .iter()
                .filter(|parent| {
                    let root = self.root_qualifiable(parent);
                    !intents
                        .iter()
                        .any(|own| own.local.starts_with(root.local.as_str()))
                })
                .cloned()
                .collect();
            intents.extend(inherited);
            let mut intents = self.normalize_intents(&intents);
            self.trim_inherent(extension, &mut intents);
            operation.intents = intents;

            for name in &operation.policy_sets {
                match (self.definitions.policy_set(name), attach_type) {
                    (None, _) => {
                        return Err(BuildError::PolicyValidation(format!(
                            "Policy Set '{}' specified for operation {} is not defined in this domain",
                            name, operation.name
                        )));
                    }
                    (Some(set), Some(attach_type)) if !set.applies_to(attach_type) => {
                        return Err(BuildError::PolicyValidation(format!(
                            "Policy Set '{}' specified for operation {} does not constrain extension type {}",
                            name, operation.name, attach_type
                        )));
                    }
                    _ => {}
                }
            }
            operation.policy_sets = dedup(std::mem::take(&mut operation.policy_sets));
        }
        Ok(())
    }
}

/// Add `source` entries missing from `target`, keeping order
pub fn add_inherited(source: &[QName], target: &mut Vec<QName>) {
    for name in source {
        if !target.contains(name) {
            target.push(name.clone());
        }
    }
}

/// Merge configured operations of `source` into `target` by operation name
pub fn add_inherited_operations(source: &[ConfiguredOperation], target: &mut Vec<ConfiguredOperation>) {
    for operation in source {
        match target.iter_mut().find(|t| t.name == operation.name) {
            Some(existing) => {
                add_inherited(&operation.intents, &mut existing.intents);
                add_inherited(&operation.policy_sets, &mut existing.policy_sets);
            }
            None => target.push(operation.clone()),
        }
    }
}

fn dedup(names: Vec<QName>) -> Vec<QName> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Intent, PolicySet};

    fn intent(name: &str, constrains: &[&str]) -> Intent {
        Intent {
            name: QName::local(name),
            constrains: constrains.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn definitions() -> Definitions {
        Definitions {
            intents: vec![
                intent("confidentiality", &["binding"]),
                intent("confidentiality.message", &["binding"]),
                intent("confidentiality.transport", &["binding"]),
                intent("integrity", &["binding"]),
                intent("authentication", &["binding"]),
                intent("managedTransaction", &["implementation"]),
                Intent {
                    name: QName::local("secure"),
                    requires: vec![QName::local("integrity"), QName::local("authentication")],
                    ..Default::default()
                },
            ],
            policy_sets: vec![PolicySet {
                name: QName::local("wsIntegrity"),
                provides: vec![QName::local("integrity")],
                applies_to: vec!["binding.ws".to_string()],
                ..Default::default()
            }],
            binding_types: vec![ExtensionType {
                name: "binding.sca".to_string(),
                always_provides: vec![QName::local("authentication")],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn names(intents: &[QName]) -> Vec<String> {
        intents.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_qualified_intent_replaces_its_base() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);
        let normalized = computer.normalize_intents(&[
            QName::local("confidentiality"),
            QName::local("confidentiality.message"),
        ]);
        assert_eq!(names(&normalized), vec!["confidentiality.message"]);
    }

    #[test]
    fn test_profile_expansion_and_dedup() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);
        let normalized =
            computer.normalize_intents(&[QName::local("secure"), QName::local("integrity")]);
        assert_eq!(names(&normalized), vec!["integrity", "authentication"]);
    }

    #[test]
    fn test_inheritable_filters_by_constraint() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);
        let inherited = computer
            .inheritable_intents(
                "binding.ws",
                &[QName::local("integrity"), QName::local("managedTransaction")],
            )
            .unwrap();
        assert_eq!(names(&inherited), vec!["integrity"]);
    }

    #[test]
    fn test_undefined_intent_is_fatal() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);
        let err = computer
            .inheritable_intents("binding.ws", &[QName::local("nonRepudiation")])
            .unwrap_err();
        assert!(err.to_string().contains("not defined in this domain"));
    }

    #[test]
    fn test_direct_intent_must_constrain_type() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);
        let err = computer
            .validate_intents("binding.ws", &[QName::local("managedTransaction")])
            .unwrap_err();
        assert!(err.to_string().contains("does not constrain extension type binding.ws"));
    }

    #[test]
    fn test_policy_set_must_apply() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);
        assert!(computer
            .validate_policy_sets("binding.ws", &[QName::local("wsIntegrity")])
            .is_ok());
        assert!(computer
            .validate_policy_sets("binding.jms", &[QName::local("wsIntegrity")])
            .is_err());
        assert!(computer
            .validate_policy_sets("binding.ws", &[QName::local("missing")])
            .is_err());
    }

    #[test]
    fn test_trimming() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);

        let mut intents = vec![QName::local("authentication"), QName::local("integrity")];
        computer.trim_inherent(defs.binding_type("binding.sca"), &mut intents);
        assert_eq!(names(&intents), vec!["integrity"]);

        let mut sets = Vec::new();
        computer.attach_domain_policy_sets("binding.ws", &mut intents, &mut sets);
        assert!(intents.is_empty());
        assert_eq!(names(&sets), vec!["wsIntegrity"]);
    }

    #[test]
    fn test_operation_keeps_own_qualified_form() {
        let defs = definitions();
        let computer = PolicyComputer::new(&defs);
        let mut operations = vec![ConfiguredOperation {
            name: "placeOrder".to_string(),
            intents: vec![QName::local("confidentiality.transport")],
            policy_sets: Vec::new(),
        }];
        computer
            .intents_for_operations(
                Some("binding.ws"),
                None,
                &mut operations,
                &[QName::local("confidentiality.message"), QName::local("integrity")],
            )
            .unwrap();
        assert_eq!(
            names(&operations[0].intents),
            vec!["confidentiality.transport", "integrity"]
        );
    }
}
