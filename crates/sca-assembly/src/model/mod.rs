//! Descriptor data model

mod binding;
mod composite;
mod contract;
pub mod policy;
mod qname;

pub use binding::{Binding, Callback, ConfiguredOperation, SCA_BINDING};
pub use composite::{
    Component, ComponentType, Composite, CompositeReference, CompositeService, Contribution,
    Implementation, Property, Reference, Service, Wire,
};
pub use contract::{Interface, InterfaceContract, Multiplicity};
pub use policy::{Definitions, ExtensionType, Intent, PolicySet};
pub use qname::QName;
