use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Conditions that abort a build
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Deployable composite '{0}' not found in contribution")]
    DeployableNotFound(String),

    #[error("Composite implementation cycle: {}", .0.join(" -> "))]
    ImplementationCycle(Vec<String>),

    #[error("Promotion cycle: {}", .0.join(" -> "))]
    PromotionCycle(Vec<String>),

    #[error("Policy validation failed: {0}")]
    PolicyValidation(String),

    #[error("Invalid binding URI '{uri}': {source}")]
    InvalidBindingUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Illegal character {character:?} in URI '{uri}'")]
    IllegalUriCharacter { uri: String, character: char },

    #[error("Binding configuration error on {model}: {source}")]
    Binding {
        model: String,
        #[source]
        source: BindingError,
    },
}

/// Errors raised by binding processors when reading binding configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("queue destination contradicts topic connection factory '{0}'")]
    DestinationQueueContradiction(String),

    #[error("topic destination contradicts queue connection factory '{0}'")]
    DestinationTopicContradiction(String),

    #[error("connection factory '{connection_factory}' and activation spec '{activation_spec}' are mutually exclusive")]
    ConnectionFactoryActivationSpecContradiction {
        connection_factory: String,
        activation_spec: String,
    },

    #[error("response connection '{response_connection}' cannot be combined with response destination '{response_destination}'")]
    ResponseAttrElement {
        response_connection: String,
        response_destination: String,
    },

    #[error("JMS URI '{0}' must start with 'jms:'")]
    MustStartWithSchema(String),

    #[error("unknown token '{token}' in JMS URI '{uri}'")]
    UnknownTokenInUri { token: String, uri: String },

    #[error("invalid value '{value}' for {attribute}")]
    InvalidAttribute { attribute: String, value: String },
}
