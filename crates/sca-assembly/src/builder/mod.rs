//! The composite build pipeline
//!
//! A build runs these stages in order over one [`Assembly`]:
//!
//! 1. load the deployable composite and its nested implementations
//! 2. configure components: URIs, reconciliation with component types,
//!    callbacks, default bindings and sourced properties
//! 3. resolve composite service and reference promotions
//! 4. wire references to their target services
//! 5. compute effective policy
//! 6. assign binding URIs
//!
//! Recoverable problems go to the caller's [`Monitor`]; only structural
//! failures abort with a [`BuildError`](crate::error::BuildError).

mod binding_uri;
mod configure;
mod defaults;
mod index;
mod policy;
mod promotion;
mod reconcile;
mod wiring;

#[cfg(test)]
pub(crate) mod test_support;

use crate::assembly::{self, Assembly};
use crate::binding::{BindingFactory, ProcessorRegistry, ScaBindingFactory};
use crate::endpoint::{DefaultEndpointBuilder, EndpointBuilder};
use crate::error::Result;
use crate::interface::{DefaultContractMapper, InterfaceContractMapper};
use crate::model::Contribution;
use crate::monitor::Monitor;
use std::collections::BTreeMap;

/// Build-wide settings
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Base URI per binding type, e.g. `binding.ws` -> `http://localhost:8080`
    pub base_uris: BTreeMap<String, String>,
}

impl BuildOptions {
    pub fn with_base_uri(mut self, binding_type: impl Into<String>, base: impl Into<String>) -> Self {
        self.base_uris.insert(binding_type.into(), base.into());
        self
    }
}

/// Runs the build pipeline with pluggable interface matching, endpoint
/// building and default binding policies
pub struct CompositeBuilder {
    options: BuildOptions,
    mapper: Box<dyn InterfaceContractMapper>,
    endpoint_builder: Box<dyn EndpointBuilder>,
    binding_factory: Box<dyn BindingFactory>,
    processors: ProcessorRegistry,
}

impl Default for CompositeBuilder {
    fn default() -> Self {
        Self {
            options: BuildOptions::default(),
            mapper: Box::new(DefaultContractMapper),
            endpoint_builder: Box::new(DefaultEndpointBuilder),
            binding_factory: Box::new(ScaBindingFactory),
            processors: ProcessorRegistry::default(),
        }
    }
}

impl CompositeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_mapper(mut self, mapper: impl InterfaceContractMapper + 'static) -> Self {
        self.mapper = Box::new(mapper);
        self
    }

    pub fn with_endpoint_builder(mut self, builder: impl EndpointBuilder + 'static) -> Self {
        self.endpoint_builder = Box::new(builder);
        self
    }

    pub fn with_binding_factory(mut self, factory: impl BindingFactory + 'static) -> Self {
        self.binding_factory = Box::new(factory);
        self
    }

    pub fn with_processors(mut self, processors: ProcessorRegistry) -> Self {
        self.processors = processors;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Resolve the deployable composite of `contribution`
    ///
    /// # Errors
    ///
    /// Fails when the deployable composite is missing, composite
    /// implementations or promotions form a cycle, policy attachment is
    /// invalid, a binding URI cannot be composed, or a binding processor
    /// rejects a binding's configuration.
    pub fn build(&self, contribution: &Contribution, monitor: &mut Monitor) -> Result<Assembly> {
        let mut assembly = assembly::load(contribution, &self.processors, monitor)?;
        let mapper = self.mapper.as_ref();

        configure::configure(&mut assembly, mapper, self.binding_factory.as_ref(), monitor);
        tracing::debug!(problems = monitor.problems().len(), "configured components");

        promotion::resolve_promotions(&mut assembly, mapper, monitor)?;
        tracing::debug!(problems = monitor.problems().len(), "resolved promotions");

        wiring::wire(&mut assembly, mapper, self.endpoint_builder.as_ref(), monitor);
        promotion::push_down_reference_endpoints(&mut assembly);
        tracing::debug!(problems = monitor.problems().len(), "wired references");

        policy::compute_policies(&mut assembly)?;
        tracing::debug!("computed policies");

        binding_uri::assign_binding_uris(&mut assembly, &self.options, monitor)?;
        tracing::debug!(problems = monitor.problems().len(), "assigned binding URIs");

        tracing::info!(
            deployable = %contribution.deployable,
            warnings = monitor.problems().len(),
            "built composite"
        );
        Ok(assembly)
    }
}
