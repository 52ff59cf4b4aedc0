//! `binding.jms` reader, validator and writer

use super::{BindingPayload, BindingProcessor};
use crate::error::BindingError;
use crate::model::Binding;
use std::collections::BTreeMap;

pub const JMS_BINDING: &str = "binding.jms";

/// Connection factory used when none is configured
pub const DEFAULT_CONNECTION_FACTORY: &str = "ConnectionFactory";

const URI_SCHEME: &str = "jms:";
const CONNECTION_FACTORY_TOKEN: &str = "connectionFactoryName=";
const CORRELATION_SCHEMES: &[&str] = &["RequestMsgIDToCorrelID", "RequestCorrelIDToCorrelID", "None"];
const DELIVERY_MODES: &[&str] = &["persistent", "nonpersistent"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DestinationType {
    #[default]
    Queue,
    Topic,
}

impl DestinationType {
    fn parse(value: &str) -> Result<Self, BindingError> {
        match value {
            "queue" => Ok(DestinationType::Queue),
            "topic" => Ok(DestinationType::Topic),
            other => Err(BindingError::InvalidAttribute {
                attribute: "destination-type".to_string(),
                value: other.to_string(),
            }),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            DestinationType::Queue => "queue",
            DestinationType::Topic => "topic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JmsBinding {
    pub destination: Option<String>,
    pub destination_type: DestinationType,
    pub connection_factory: Option<String>,
    pub activation_spec: Option<String>,
    pub response_connection: Option<String>,
    pub response_destination: Option<String>,
    pub correlation_scheme: Option<String>,
    pub delivery_mode: Option<String>,
}

impl JmsBinding {
    /// Fill destination and connection factory from `jms:<destination>[?connectionFactoryName=<name>]`
    pub fn parse_uri(&mut self, uri: &str) -> Result<(), BindingError> {
        let Some(rest) = uri.strip_prefix(URI_SCHEME) else {
            return Err(BindingError::MustStartWithSchema(uri.to_string()));
        };
        let (destination, query) = match rest.split_once('?') {
            Some((destination, query)) => (destination, Some(query)),
            None => (rest, None),
        };
        if let Some(query) = query {
            for token in query.split('&').filter(|t| !t.is_empty()) {
                match token.strip_prefix(CONNECTION_FACTORY_TOKEN) {
                    Some(name) => self.connection_factory = Some(name.to_string()),
                    None => {
                        return Err(BindingError::UnknownTokenInUri {
                            token: token.to_string(),
                            uri: uri.to_string(),
                        });
                    }
                }
            }
        }
        self.destination = Some(destination.to_string());
        Ok(())
    }

    /// Reject contradictory combinations of attributes
    pub fn validate(&self) -> Result<(), BindingError> {
        if let Some(factory) = self.connection_factory.as_deref().filter(|f| !f.is_empty()) {
            match self.destination_type {
                DestinationType::Queue if factory.contains("topic") => {
                    return Err(BindingError::DestinationQueueContradiction(factory.to_string()));
                }
                DestinationType::Topic if factory.contains("queue") => {
                    return Err(BindingError::DestinationTopicContradiction(factory.to_string()));
                }
                _ => {}
            }

            if factory != DEFAULT_CONNECTION_FACTORY {
                if let Some(spec) = self.activation_spec.as_deref().filter(|s| !s.is_empty()) {
                    return Err(BindingError::ConnectionFactoryActivationSpecContradiction {
                        connection_factory: factory.to_string(),
                        activation_spec: spec.to_string(),
                    });
                }
            }
        }

        if let Some(connection) = self.response_connection.as_deref().filter(|c| !c.is_empty()) {
            if let Some(destination) = self.response_destination.as_deref().filter(|d| !d.is_empty()) {
                return Err(BindingError::ResponseAttrElement {
                    response_connection: connection.to_string(),
                    response_destination: destination.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn checked(
    attributes: &BTreeMap<String, String>,
    attribute: &str,
    allowed: &[&str],
) -> Result<Option<String>, BindingError> {
    match attributes.get(attribute) {
        Some(value) if !allowed.contains(&value.as_str()) => Err(BindingError::InvalidAttribute {
            attribute: attribute.to_string(),
            value: value.clone(),
        }),
        other => Ok(other.cloned()),
    }
}

#[derive(Debug, Default)]
pub struct JmsBindingProcessor;

impl BindingProcessor for JmsBindingProcessor {
    fn binding_type(&self) -> &'static str {
        JMS_BINDING
    }

    fn read(&self, binding: &Binding) -> Result<BindingPayload, BindingError> {
        let attributes = &binding.attributes;
        let mut jms = JmsBinding {
            destination: attributes.get("destination").cloned(),
            destination_type: match attributes.get("destination-type") {
                Some(value) => DestinationType::parse(value)?,
                None => DestinationType::default(),
            },
            connection_factory: attributes.get("connection-factory").cloned(),
            activation_spec: attributes.get("activation-spec").cloned(),
            response_connection: attributes.get("response-connection").cloned(),
            response_destination: attributes.get("response-destination").cloned(),
            correlation_scheme: checked(attributes, "correlation-scheme", CORRELATION_SCHEMES)?,
            delivery_mode: checked(attributes, "delivery-mode", DELIVERY_MODES)?,
        };
        if let Some(uri) = &binding.uri {
            jms.parse_uri(uri)?;
        }
        jms.validate()?;
        Ok(BindingPayload::Jms(jms))
    }

    fn write(&self, payload: &BindingPayload, binding: &mut Binding) {
        let BindingPayload::Jms(jms) = payload else {
            return;
        };
        let mut attributes = BTreeMap::new();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                attributes.insert(key.to_string(), value.clone());
            }
        };
        put("destination", &jms.destination);
        put("connection-factory", &jms.connection_factory);
        put("activation-spec", &jms.activation_spec);
        put("response-connection", &jms.response_connection);
        put("response-destination", &jms.response_destination);
        put("correlation-scheme", &jms.correlation_scheme);
        put("delivery-mode", &jms.delivery_mode);
        attributes.insert(
            "destination-type".to_string(),
            jms.destination_type.as_str().to_string(),
        );
        binding.attributes = attributes;

        if binding.uri.is_none() {
            if let Some(destination) = &jms.destination {
                binding.uri = Some(format!("{}{}", URI_SCHEME, destination));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jms(attrs: &[(&str, &str)]) -> Binding {
        let mut binding = Binding::new(JMS_BINDING);
        for (k, v) in attrs {
            binding.attributes.insert(k.to_string(), v.to_string());
        }
        binding
    }

    #[test]
    fn test_queue_with_topic_factory_is_rejected() {
        let binding = jms(&[("connection-factory", "jms/topicFactory")]);
        let err = JmsBindingProcessor.read(&binding).unwrap_err();
        assert_eq!(
            err,
            BindingError::DestinationQueueContradiction("jms/topicFactory".to_string())
        );
    }

    #[test]
    fn test_topic_with_queue_factory_is_rejected() {
        let binding = jms(&[
            ("destination-type", "topic"),
            ("connection-factory", "jms/queueFactory"),
        ]);
        assert!(matches!(
            JmsBindingProcessor.read(&binding),
            Err(BindingError::DestinationTopicContradiction(_))
        ));
    }

    #[test]
    fn test_factory_and_activation_spec_are_exclusive() {
        let binding = jms(&[
            ("connection-factory", "jms/OrdersCF"),
            ("activation-spec", "jms/OrdersSpec"),
        ]);
        assert!(matches!(
            JmsBindingProcessor.read(&binding),
            Err(BindingError::ConnectionFactoryActivationSpecContradiction { .. })
        ));

        // the default factory may be combined with an activation spec
        let binding = jms(&[
            ("connection-factory", DEFAULT_CONNECTION_FACTORY),
            ("activation-spec", "jms/OrdersSpec"),
        ]);
        assert!(JmsBindingProcessor.read(&binding).is_ok());
    }

    #[test]
    fn test_response_connection_excludes_response_destination() {
        let binding = jms(&[
            ("response-connection", "{ns}sharedResponse"),
            ("response-destination", "ReplyQueue"),
        ]);
        assert!(matches!(
            JmsBindingProcessor.read(&binding),
            Err(BindingError::ResponseAttrElement { .. })
        ));
    }

    #[test]
    fn test_uri_sets_destination_and_factory() {
        let binding = jms(&[]).with_uri("jms:OrderQueue?connectionFactoryName=jms/OrdersCF");
        let BindingPayload::Jms(parsed) = JmsBindingProcessor.read(&binding).unwrap() else {
            panic!("expected a JMS payload");
        };
        assert_eq!(parsed.destination.as_deref(), Some("OrderQueue"));
        assert_eq!(parsed.connection_factory.as_deref(), Some("jms/OrdersCF"));
    }

    #[test]
    fn test_uri_errors() {
        let binding = jms(&[]).with_uri("queue:OrderQueue");
        assert_eq!(
            JmsBindingProcessor.read(&binding).unwrap_err(),
            BindingError::MustStartWithSchema("queue:OrderQueue".to_string())
        );

        let binding = jms(&[]).with_uri("jms:OrderQueue?priority=4");
        assert!(matches!(
            JmsBindingProcessor.read(&binding),
            Err(BindingError::UnknownTokenInUri { .. })
        ));
    }

    #[test]
    fn test_invalid_delivery_mode() {
        let binding = jms(&[("delivery-mode", "sometimes")]);
        assert!(matches!(
            JmsBindingProcessor.read(&binding),
            Err(BindingError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_write_sets_uri_from_destination() {
        let mut binding = jms(&[("destination", "OrderQueue")]);
        let payload = JmsBindingProcessor.read(&binding).unwrap();
        JmsBindingProcessor.write(&payload, &mut binding);
        assert_eq!(binding.uri.as_deref(), Some("jms:OrderQueue"));
        assert_eq!(
            binding.attributes.get("destination-type").map(String::as_str),
            Some("queue")
        );
    }
}
