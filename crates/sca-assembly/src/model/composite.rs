//! Descriptor model as produced by a parser
//!
//! These types are plain data. The builder never mutates them; it loads them
//! into an [`Assembly`](crate::assembly::Assembly) arena and works there.

use super::{Binding, Callback, ConfiguredOperation, InterfaceContract, Multiplicity, QName};
use crate::model::policy::Definitions;
use serde::{Deserialize, Serialize};

/// A deployable unit: the composites it contains and the policy definitions of its domain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contribution {
    /// Name of the composite to build
    pub deployable: QName,

    #[serde(default, rename = "composite")]
    pub composites: Vec<Composite>,

    #[serde(default)]
    pub definitions: Definitions,
}

impl Contribution {
    pub fn find_composite(&self, name: &QName) -> Option<&Composite> {
        self.composites.iter().find(|c| &c.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Composite {
    pub name: QName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autowire: Option<bool>,

    #[serde(default, rename = "component", skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    #[serde(default, rename = "service", skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<CompositeService>,

    #[serde(default, rename = "reference", skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<CompositeReference>,

    #[serde(default, rename = "property", skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,

    #[serde(default, rename = "wire", skip_serializing_if = "Vec::is_empty")]
    pub wires: Vec<Wire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Component {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Implementation>,

    #[serde(default, rename = "service", skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    #[serde(default, rename = "reference", skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    #[serde(default, rename = "property", skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autowire: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,
}

/// What a component runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Implementation {
    /// A leaf implementation described by its component type
    Atomic(ComponentType),
    /// Another composite of the contribution, used by name
    Composite { name: QName },
}

/// Services, references and properties an atomic implementation exposes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentType {
    /// Implementation type, e.g. `implementation.java`
    #[serde(rename = "type")]
    pub implementation_type: String,

    #[serde(default, rename = "service", skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    #[serde(default, rename = "reference", skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    #[serde(default, rename = "property", skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

/// Service declared on a component or a component type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<InterfaceContract>,

    #[serde(default, rename = "binding", skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

/// Reference declared on a component or a component type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<InterfaceContract>,

    #[serde(default, rename = "binding", skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<Multiplicity>,

    /// `component` or `component/service` names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autowire: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

/// Composite-level service promoting `component` or `component/service`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeService {
    pub name: String,

    pub promote: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<InterfaceContract>,

    #[serde(default, rename = "binding", skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

/// Composite-level reference promoting one or more `component/reference` names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeReference {
    pub name: String,

    pub promote: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<InterfaceContract>,

    #[serde(default, rename = "binding", skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<Multiplicity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_sets: Vec<QName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ConfiguredOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Property {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub many: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub must_supply: bool,

    /// `$name` of a property of the enclosing composite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Explicit `source` reference to `target` service connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub source: String,
    pub target: String,
}
