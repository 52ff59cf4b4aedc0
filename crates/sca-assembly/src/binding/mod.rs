//! Binding extension processors and the default binding factory
//!
//! Binding-specific configuration is carried as string attributes on
//! [`Binding`]. A [`BindingProcessor`] reads those attributes into a typed
//! payload, rejecting invalid configuration, and writes the payload back in
//! canonical form.

pub mod jms;

use crate::error::BindingError;
use crate::model::{Binding, SCA_BINDING};
use std::collections::BTreeMap;

pub use jms::{JmsBinding, JmsBindingProcessor, JMS_BINDING};

pub const WS_BINDING: &str = "binding.ws";

/// Typed configuration of a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingPayload {
    Sca,
    WebService { wsdl_element: Option<String> },
    Jms(JmsBinding),
    /// Binding type without a registered processor
    Generic(BTreeMap<String, String>),
}

/// Reads and writes the configuration of one binding type
pub trait BindingProcessor: Send + Sync {
    fn binding_type(&self) -> &'static str;

    fn read(&self, binding: &Binding) -> Result<BindingPayload, BindingError>;

    fn write(&self, payload: &BindingPayload, binding: &mut Binding);
}

/// Produces the binding given to services and references that declare none
pub trait BindingFactory {
    fn default_binding(&self) -> Binding;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScaBindingFactory;

impl BindingFactory for ScaBindingFactory {
    fn default_binding(&self) -> Binding {
        Binding::sca()
    }
}

#[derive(Debug, Default)]
pub struct ScaBindingProcessor;

impl BindingProcessor for ScaBindingProcessor {
    fn binding_type(&self) -> &'static str {
        SCA_BINDING
    }

    fn read(&self, _binding: &Binding) -> Result<BindingPayload, BindingError> {
        Ok(BindingPayload::Sca)
    }

    fn write(&self, _payload: &BindingPayload, binding: &mut Binding) {
        binding.attributes.clear();
    }
}

/// `binding.ws`, whose only attribute is an optional `wsdl-element` pointer
///
/// The pointer has the form `namespace#wsdl.port(Service/Port)`,
/// `#wsdl.service(Service)`, `#wsdl.binding(Binding)` or
/// `#wsdl.endpoint(Service/Endpoint)`.
#[derive(Debug, Default)]
pub struct WebServiceBindingProcessor;

impl WebServiceBindingProcessor {
    fn valid_wsdl_element(value: &str) -> bool {
        let Some((_, element)) = value.split_once('#') else {
            return false;
        };
        ["wsdl.port(", "wsdl.service(", "wsdl.binding(", "wsdl.endpoint("]
            .iter()
            .any(|prefix| {
                element
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(')'))
                    .is_some_and(|inner| !inner.is_empty())
            })
    }
}

impl BindingProcessor for WebServiceBindingProcessor {
    fn binding_type(&self) -> &'static str {
        WS_BINDING
    }

    fn read(&self, binding: &Binding) -> Result<BindingPayload, BindingError> {
        let wsdl_element = binding.attributes.get("wsdl-element").cloned();
        if let Some(value) = &wsdl_element {
            if !Self::valid_wsdl_element(value) {
                return Err(BindingError::InvalidAttribute {
                    attribute: "wsdl-element".to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(BindingPayload::WebService { wsdl_element })
    }

    fn write(&self, payload: &BindingPayload, binding: &mut Binding) {
        if let BindingPayload::WebService { wsdl_element } = payload {
            binding.attributes.clear();
            if let Some(value) = wsdl_element {
                binding
                    .attributes
                    .insert("wsdl-element".to_string(), value.clone());
            }
        }
    }
}

/// Processors keyed by binding type
pub struct ProcessorRegistry {
    processors: BTreeMap<&'static str, Box<dyn BindingProcessor>>,
}

impl ProcessorRegistry {
    /// Registry without any processor; every binding reads as generic
    pub fn empty() -> Self {
        Self {
            processors: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, processor: Box<dyn BindingProcessor>) {
        self.processors.insert(processor.binding_type(), processor);
    }

    pub fn binding_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.processors.keys().copied()
    }

    pub fn read(&self, binding: &Binding) -> Result<BindingPayload, BindingError> {
        match self.processors.get(binding.binding_type.as_str()) {
            Some(processor) => processor.read(binding),
            None => Ok(BindingPayload::Generic(binding.attributes.clone())),
        }
    }

    /// Validate a binding and rewrite its attributes in canonical form
    pub fn normalize(&self, binding: &mut Binding) -> Result<(), BindingError> {
        if let Some(processor) = self.processors.get(binding.binding_type.as_str()) {
            let payload = processor.read(binding)?;
            processor.write(&payload, binding);
        }
        Ok(())
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ScaBindingProcessor));
        registry.register(Box::new(WebServiceBindingProcessor));
        registry.register(Box::new(JmsBindingProcessor));
        registry
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.processors.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_types() {
        let registry = ProcessorRegistry::default();
        let types: Vec<_> = registry.binding_types().collect();
        assert_eq!(types, vec!["binding.jms", "binding.sca", "binding.ws"]);
    }

    #[test]
    fn test_unknown_binding_reads_generic() {
        let registry = ProcessorRegistry::default();
        let mut binding = Binding::new("binding.rmi");
        binding
            .attributes
            .insert("host".to_string(), "localhost".to_string());
        let payload = registry.read(&binding).unwrap();
        assert!(matches!(payload, BindingPayload::Generic(attrs) if attrs.len() == 1));
    }

    #[test]
    fn test_wsdl_element_validation() {
        let registry = ProcessorRegistry::default();
        let mut binding = Binding::new(WS_BINDING);
        binding.attributes.insert(
            "wsdl-element".to_string(),
            "http://example.com/quotes#wsdl.port(QuoteService/QuotePort)".to_string(),
        );
        assert!(registry.normalize(&mut binding).is_ok());

        binding
            .attributes
            .insert("wsdl-element".to_string(), "QuoteService".to_string());
        assert!(registry.normalize(&mut binding).is_err());
    }

    #[test]
    fn test_default_binding_is_sca() {
        let binding = ScaBindingFactory.default_binding();
        assert_eq!(binding.binding_type, SCA_BINDING);
        assert!(binding.is_optimizable());
    }
}
