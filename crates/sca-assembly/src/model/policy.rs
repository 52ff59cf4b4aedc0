use super::QName;
use serde::{Deserialize, Serialize};

/// Policy definitions of a domain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default, rename = "intent", skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<Intent>,

    #[serde(default, rename = "policy_set", skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<PolicySet>,

    #[serde(default, rename = "binding_type", skip_serializing_if = "Vec::is_empty")]
    pub binding_types: Vec<ExtensionType>,

    #[serde(default, rename = "implementation_type", skip_serializing_if = "Vec::is_empty")]
    pub implementation_types: Vec<ExtensionType>,
}

impl Definitions {
    pub fn intent(&self, name: &QName) -> Option<&Intent> {
        self.intents.iter().find(|i| &i.name == name)
    }

    pub fn policy_set(&self, name: &QName) -> Option<&PolicySet> {
        self.policy_sets.iter().find(|p| &p.name == name)
    }

    pub fn binding_type(&self, name: &str) -> Option<&ExtensionType> {
        self.binding_types.iter().find(|t| t.name == name)
    }

    pub fn implementation_type(&self, name: &str) -> Option<&ExtensionType> {
        self.implementation_types.iter().find(|t| t.name == name)
    }

    /// Policy sets whose `applies_to` covers the given extension type
    pub fn applicable_policy_sets(&self, attach_type: &str) -> Vec<&PolicySet> {
        self.policy_sets
            .iter()
            .filter(|p| p.applies_to(attach_type))
            .collect()
    }
}

/// A named non-functional requirement
///
/// An intent with `requires` is a profile intent and stands for the intents it
/// lists. An intent is qualified when `qualifiable` names its base intent, or,
/// absent that, when its local name has a `.qualifier` suffix whose base is
/// also defined.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intent {
    pub name: QName,

    /// Extension types (or type families such as `binding`) this intent applies to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constrains: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<QName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifiable: Option<QName>,
}

impl Intent {
    pub fn is_profile(&self) -> bool {
        !self.requires.is_empty()
    }

    /// Whether this intent may be attached to an extension of `attach_type`
    ///
    /// `binding` constrains `binding.ws`; an intent without constraints
    /// applies everywhere.
    pub fn constrains_type(&self, attach_type: &str) -> bool {
        self.constrains.is_empty()
            || self.constrains.iter().any(|c| {
                attach_type == c
                    || attach_type
                        .strip_prefix(c.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
    }
}

/// Concrete policy satisfying one or more intents
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicySet {
    pub name: QName,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<QName>,

    /// Extension types this policy set can be attached to; empty means any
    #[serde(default, rename = "applies_to", skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,

    /// Intents satisfied through intent-to-policy mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mapped_intents: Vec<QName>,
}

impl PolicySet {
    pub fn applies_to(&self, attach_type: &str) -> bool {
        self.applies_to.is_empty() || self.applies_to.iter().any(|t| t == attach_type)
    }

    pub fn satisfies(&self, intent: &QName) -> bool {
        self.provides.contains(intent) || self.mapped_intents.contains(intent)
    }
}

/// Binding or implementation type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtensionType {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub always_provides: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub may_provide: Vec<QName>,
}

impl ExtensionType {
    pub fn provides_inherently(&self, intent: &QName) -> bool {
        self.always_provides.contains(intent) || self.may_provide.contains(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_constrains_type_family() {
        let intent = Intent {
            name: QName::local("confidentiality"),
            constrains: vec!["binding".to_string()],
            ..Default::default()
        };
        assert!(intent.constrains_type("binding.ws"));
        assert!(intent.constrains_type("binding"));
        assert!(!intent.constrains_type("bindingx"));
        assert!(!intent.constrains_type("implementation.java"));
    }

    #[test]
    fn test_unconstrained_intent_applies_everywhere() {
        let intent = Intent {
            name: QName::local("logging"),
            ..Default::default()
        };
        assert!(intent.constrains_type("implementation.java"));
    }

    #[test]
    fn test_policy_set_applies_to() {
        let set = PolicySet {
            name: QName::local("wsSecurity"),
            applies_to: vec!["binding.ws".to_string()],
            provides: vec![QName::local("confidentiality")],
            ..Default::default()
        };
        assert!(set.applies_to("binding.ws"));
        assert!(!set.applies_to("binding.jms"));
        assert!(set.satisfies(&QName::local("confidentiality")));
    }
}
