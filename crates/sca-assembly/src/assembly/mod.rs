//! Arena holding the working assembly graph
//!
//! Every composite, component, service and reference lives in one of the
//! arena's vectors and is addressed by a typed handle. Cross links (promotion
//! targets, implementation-level counterparts, endpoint targets) are handles,
//! never owning pointers, so the graph can be walked and rewritten freely
//! during a build.

mod load;
mod snapshot;

pub(crate) use load::load;
pub use snapshot::{
    EndpointStatus, ResolvedComponent, ResolvedComposite, ResolvedCompositeReference,
    ResolvedCompositeService, ResolvedEndpoint, ResolvedReference, ResolvedService,
};

use crate::endpoint::Endpoint;
use crate::model::{
    Binding, Callback, ConfiguredOperation, Definitions, InterfaceContract, Multiplicity,
    Property, QName, Wire,
};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to a composite in the arena
    CompositeId
);
handle!(
    /// Handle to a component in the arena
    ComponentId
);
handle!(
    /// Handle to a component, component-type or composite service
    ServiceId
);
handle!(
    /// Handle to a component, component-type or composite reference
    ReferenceId
);

/// Prefix of the component services synthesized for flattened promotion chains
pub const PROMOTED_PREFIX: &str = "$promoted$.";

/// Prefix of references an implementation uses to call its own services
pub const SELF_REFERENCE_PREFIX: &str = "$self$.";

#[derive(Debug, Clone)]
pub struct CompositeNode {
    pub name: QName,
    pub autowire: Option<bool>,
    pub components: Vec<ComponentId>,
    pub services: Vec<ServiceId>,
    pub references: Vec<ReferenceId>,
    pub properties: Vec<Property>,
    pub wires: Vec<Wire>,
    pub intents: Vec<QName>,
    pub policy_sets: Vec<QName>,
    /// Component using this composite as its implementation
    pub implements: Option<ComponentId>,
}

#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub name: String,
    /// Hierarchical URI, assigned once during configuration
    pub uri: Option<String>,
    pub parent: CompositeId,
    pub implementation: ImplementationNode,
    pub services: Vec<ServiceId>,
    pub references: Vec<ReferenceId>,
    pub properties: Vec<Property>,
    pub autowire: Option<bool>,
    pub intents: Vec<QName>,
    pub policy_sets: Vec<QName>,
}

#[derive(Debug, Clone)]
pub enum ImplementationNode {
    /// The component declares no implementation
    Missing,
    /// The named composite is not part of the contribution
    Unresolved(QName),
    Atomic(AtomicImplementation),
    Composite(CompositeId),
}

/// Component type of a leaf implementation
#[derive(Debug, Clone)]
pub struct AtomicImplementation {
    pub implementation_type: String,
    pub services: Vec<ServiceId>,
    pub references: Vec<ReferenceId>,
    pub properties: Vec<Property>,
    pub intents: Vec<QName>,
    pub policy_sets: Vec<QName>,
    pub operations: Vec<ConfiguredOperation>,
}

/// Where a service or reference is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Component(ComponentId),
    /// Declared by the atomic implementation of the component
    ComponentType(ComponentId),
    Composite(CompositeId),
}

#[derive(Debug, Clone)]
pub enum ServiceKind {
    Plain,
    Promoting(ServicePromotion),
}

/// Promotion target of a composite service
#[derive(Debug, Clone)]
pub struct ServicePromotion {
    /// `component` or `component/service` as written in the descriptor
    pub target: String,
    pub resolved: Option<(ComponentId, ServiceId)>,
}

#[derive(Debug, Clone)]
pub enum ReferenceKind {
    Plain,
    Promoting(Vec<ReferencePromotion>),
}

/// One promoted `component/reference` of a composite reference
#[derive(Debug, Clone)]
pub struct ReferencePromotion {
    pub target: String,
    pub resolved: Option<(ComponentId, ReferenceId)>,
}

#[derive(Debug, Clone)]
pub struct ServiceNode {
    pub name: String,
    pub owner: Owner,
    pub kind: ServiceKind,
    pub interface: Option<InterfaceContract>,
    pub bindings: Vec<Binding>,
    pub callback: Option<Callback>,
    pub intents: Vec<QName>,
    pub policy_sets: Vec<QName>,
    pub operations: Vec<ConfiguredOperation>,
    /// Synthesized to receive callbacks for a reference of the same name
    pub is_callback: bool,
    /// Implementation-level service this component service configures
    pub implementation_service: Option<ServiceId>,
}

#[derive(Debug, Clone)]
pub struct ReferenceNode {
    pub name: String,
    pub owner: Owner,
    pub kind: ReferenceKind,
    pub interface: Option<InterfaceContract>,
    pub bindings: Vec<Binding>,
    pub callback: Option<Callback>,
    pub multiplicity: Option<Multiplicity>,
    /// Raw target names, consumed by wiring
    pub targets: Vec<String>,
    pub autowire: Option<bool>,
    pub endpoints: Vec<Endpoint>,
    pub intents: Vec<QName>,
    pub policy_sets: Vec<QName>,
    pub operations: Vec<ConfiguredOperation>,
    /// Synthesized to send callbacks for a service of the same name
    pub is_callback: bool,
    /// Promoted by a reference of the enclosing composite
    pub promoted: bool,
    /// Implementation-level reference this component reference configures
    pub implementation_reference: Option<ReferenceId>,
}

impl ServiceNode {
    pub(crate) fn new(name: impl Into<String>, owner: Owner) -> Self {
        Self {
            name: name.into(),
            owner,
            kind: ServiceKind::Plain,
            interface: None,
            bindings: Vec::new(),
            callback: None,
            intents: Vec::new(),
            policy_sets: Vec::new(),
            operations: Vec::new(),
            is_callback: false,
            implementation_service: None,
        }
    }

    pub fn promotion(&self) -> Option<&ServicePromotion> {
        match &self.kind {
            ServiceKind::Promoting(promotion) => Some(promotion),
            ServiceKind::Plain => None,
        }
    }
}

impl ReferenceNode {
    pub(crate) fn new(name: impl Into<String>, owner: Owner) -> Self {
        Self {
            name: name.into(),
            owner,
            kind: ReferenceKind::Plain,
            interface: None,
            bindings: Vec::new(),
            callback: None,
            multiplicity: None,
            targets: Vec::new(),
            autowire: None,
            endpoints: Vec::new(),
            intents: Vec::new(),
            policy_sets: Vec::new(),
            operations: Vec::new(),
            is_callback: false,
            promoted: false,
            implementation_reference: None,
        }
    }

    pub fn effective_multiplicity(&self) -> Multiplicity {
        self.multiplicity.unwrap_or_default()
    }

    pub fn promotions(&self) -> &[ReferencePromotion] {
        match &self.kind {
            ReferenceKind::Promoting(promotions) => promotions,
            ReferenceKind::Plain => &[],
        }
    }
}

/// The working graph of one build
#[derive(Debug, Clone)]
pub struct Assembly {
    composites: Vec<CompositeNode>,
    components: Vec<ComponentNode>,
    services: Vec<ServiceNode>,
    references: Vec<ReferenceNode>,
    root: CompositeId,
    definitions: Definitions,
}

impl Assembly {
    pub(crate) fn new(definitions: Definitions) -> Self {
        Self {
            composites: Vec::new(),
            components: Vec::new(),
            services: Vec::new(),
            references: Vec::new(),
            root: CompositeId(0),
            definitions,
        }
    }

    pub fn root(&self) -> CompositeId {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: CompositeId) {
        self.root = root;
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn composite(&self, id: CompositeId) -> &CompositeNode {
        &self.composites[id.0]
    }

    pub fn composite_mut(&mut self, id: CompositeId) -> &mut CompositeNode {
        &mut self.composites[id.0]
    }

    pub fn component(&self, id: ComponentId) -> &ComponentNode {
        &self.components[id.0]
    }

    pub fn component_mut(&mut self, id: ComponentId) -> &mut ComponentNode {
        &mut self.components[id.0]
    }

    pub fn service(&self, id: ServiceId) -> &ServiceNode {
        &self.services[id.0]
    }

    pub fn service_mut(&mut self, id: ServiceId) -> &mut ServiceNode {
        &mut self.services[id.0]
    }

    pub fn reference(&self, id: ReferenceId) -> &ReferenceNode {
        &self.references[id.0]
    }

    pub fn reference_mut(&mut self, id: ReferenceId) -> &mut ReferenceNode {
        &mut self.references[id.0]
    }

    pub(crate) fn add_composite(&mut self, node: CompositeNode) -> CompositeId {
        self.composites.push(node);
        CompositeId(self.composites.len() - 1)
    }

    pub(crate) fn add_component(&mut self, node: ComponentNode) -> ComponentId {
        self.components.push(node);
        ComponentId(self.components.len() - 1)
    }

    pub(crate) fn add_service(&mut self, node: ServiceNode) -> ServiceId {
        self.services.push(node);
        ServiceId(self.services.len() - 1)
    }

    pub(crate) fn add_reference(&mut self, node: ReferenceNode) -> ReferenceId {
        self.references.push(node);
        ReferenceId(self.references.len() - 1)
    }

    /// Composites reachable from the root, children before their parent
    pub fn composites_bottom_up(&self) -> Vec<CompositeId> {
        let mut order = Vec::new();
        self.collect_bottom_up(self.root, &mut order);
        order
    }

    fn collect_bottom_up(&self, id: CompositeId, order: &mut Vec<CompositeId>) {
        for &component in &self.composite(id).components {
            if let ImplementationNode::Composite(child) = self.component(component).implementation {
                self.collect_bottom_up(child, order);
            }
        }
        order.push(id);
    }

    /// Services the implementation of a component declares
    pub fn implementation_services(&self, component: ComponentId) -> Vec<ServiceId> {
        match &self.component(component).implementation {
            ImplementationNode::Atomic(atomic) => atomic.services.clone(),
            ImplementationNode::Composite(composite) => self.composite(*composite).services.clone(),
            ImplementationNode::Missing | ImplementationNode::Unresolved(_) => Vec::new(),
        }
    }

    /// References the implementation of a component declares
    pub fn implementation_references(&self, component: ComponentId) -> Vec<ReferenceId> {
        match &self.component(component).implementation {
            ImplementationNode::Atomic(atomic) => atomic.references.clone(),
            ImplementationNode::Composite(composite) => {
                self.composite(*composite).references.clone()
            }
            ImplementationNode::Missing | ImplementationNode::Unresolved(_) => Vec::new(),
        }
    }

    /// Properties the implementation of a component declares
    pub fn implementation_properties(&self, component: ComponentId) -> Vec<Property> {
        match &self.component(component).implementation {
            ImplementationNode::Atomic(atomic) => atomic.properties.clone(),
            ImplementationNode::Composite(composite) => {
                self.composite(*composite).properties.clone()
            }
            ImplementationNode::Missing | ImplementationNode::Unresolved(_) => Vec::new(),
        }
    }

    pub fn find_service(&self, component: ComponentId, name: &str) -> Option<ServiceId> {
        self.component(component)
            .services
            .iter()
            .copied()
            .find(|&s| self.service(s).name == name)
    }

    pub fn find_reference(&self, component: ComponentId, name: &str) -> Option<ReferenceId> {
        self.component(component)
            .references
            .iter()
            .copied()
            .find(|&r| self.reference(r).name == name)
    }

    pub fn find_component(&self, composite: CompositeId, name: &str) -> Option<ComponentId> {
        self.composite(composite)
            .components
            .iter()
            .copied()
            .find(|&c| self.component(c).name == name)
    }

    /// Diagnostic path of a composite, e.g. `Store/Catalog` for a nested one
    pub fn composite_path(&self, id: CompositeId) -> String {
        let composite = self.composite(id);
        match composite.implements {
            Some(component) => self.component_path(component),
            None => composite.name.local.clone(),
        }
    }

    pub fn component_path(&self, id: ComponentId) -> String {
        let component = self.component(id);
        format!("{}/{}", self.composite_path(component.parent), component.name)
    }

    fn owner_path(&self, owner: Owner) -> String {
        match owner {
            Owner::Component(c) => self.component_path(c),
            Owner::ComponentType(c) => format!("{}[componentType]", self.component_path(c)),
            Owner::Composite(c) => self.composite_path(c),
        }
    }

    pub fn service_path(&self, id: ServiceId) -> String {
        let service = self.service(id);
        format!("{}#service({})", self.owner_path(service.owner), service.name)
    }

    pub fn reference_path(&self, id: ReferenceId) -> String {
        let reference = self.reference(id);
        format!("{}#reference({})", self.owner_path(reference.owner), reference.name)
    }

    /// Resolved graph as a serializable tree rooted at the deployable composite
    pub fn snapshot(&self) -> ResolvedComposite {
        snapshot::snapshot(self, self.root)
    }
}
