use super::QName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Binding type of the default in-domain binding
pub const SCA_BINDING: &str = "binding.sca";

/// A binding on a service, reference or callback
///
/// Binding-specific configuration travels in `attributes` and is interpreted
/// by the binding processor registered for `binding_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub binding_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

impl Binding {
    pub fn new(binding_type: impl Into<String>) -> Self {
        Self {
            binding_type: binding_type.into(),
            name: None,
            uri: None,
            attributes: BTreeMap::new(),
            intents: Vec::new(),
            policy_sets: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn sca() -> Self {
        Self::new(SCA_BINDING)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// In-domain bindings can be short-circuited when both ends are local
    pub fn is_optimizable(&self) -> bool {
        self.binding_type == SCA_BINDING
    }

    /// Same binding type and same name
    pub fn same_slot(&self, other: &Binding) -> bool {
        self.binding_type == other.binding_type && self.name == other.name
    }
}

/// Callback element of a service or reference
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Callback {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
}

/// Per-operation policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfiguredOperation {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
}
