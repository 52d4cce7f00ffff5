//! Error taxonomy shared by every subsystem.
//!
//! # Propagation
//! - `ValidationError` / `MalformedUrl`: registration time, abort one declaration
//! - `MissingCapability` / `NoLoadBalancer`: first use, abort one Target build
//! - `Transport`: invocation time, recovered only through a declared fallback
//! - `Status` / `Decode`: invocation time, produced by the codec collaborators

use std::time::Duration;

use thiserror::Error;

/// Malformed client declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Client declarations may only sit on interface contracts.
    #[error("client contracts must be interfaces: {type_name}")]
    NotAnInterface { type_name: String },

    /// None of `service_id`, `value`, `name` or `context_id` yielded a name.
    #[error("either 'name' or 'value' must be provided for client {type_name}")]
    MissingName { type_name: String },

    /// A resolved attribute ended up empty.
    #[error("{attribute} must be set for client {type_name}")]
    EmptyAttribute {
        type_name: String,
        attribute: &'static str,
    },

    /// The service name cannot be used as the host of a URL.
    #[error("service id not legal hostname ({0})")]
    IllegalHostname(String),

    /// Fallbacks must be concrete implementations of the contract.
    #[error("fallback type {0} must implement the client contract, not be an interface")]
    InterfaceFallback(String),

    /// Fallback factories must produce concrete implementations of the contract.
    #[error("fallback factory {0} must produce concrete implementations of the client contract")]
    InterfaceFallbackFactory(String),

    /// At most one substitution path per declaration.
    #[error("client {0} declares both a fallback and a fallback factory")]
    ConflictingFallbacks(String),
}

impl ValidationError {
    /// True for failures of service-name or contextId resolution.
    pub fn is_name_resolution(&self) -> bool {
        matches!(
            self,
            ValidationError::MissingName { .. }
                | ValidationError::EmptyAttribute { .. }
                | ValidationError::IllegalHostname(_)
        )
    }
}

/// Network or I/O failure while executing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not open a connection.
    #[error("connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    /// The read timeout elapsed.
    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    /// Any other I/O failure.
    #[error("I/O error executing request to {url}: {message}")]
    Io { url: String, message: String },

    /// The load balancer has no usable instance for the service.
    #[error("no available instance for service {service}")]
    NoInstance { service: String },

    /// The request could not be turned into a wire request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Connection and timeout failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Connect { .. } | TransportError::Timeout { .. }
        )
    }
}

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{url} is malformed: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Nothing in the client scope or the parent scope provides the capability.
    #[error("no {capability} found for client context {context_id}")]
    MissingCapability {
        context_id: String,
        capability: String,
    },

    #[error("no load-balancing transport defined for client context {context_id}")]
    NoLoadBalancer { context_id: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Non-success response turned into an error by the error decoder.
    #[error("status {status} reading {method_key}: {body}")]
    Status {
        status: u16,
        method_key: String,
        body: String,
    },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// Method template could not be parsed or expanded.
    #[error("template error in {method}: {message}")]
    Template { method: String, message: String },

    #[error("no client registered for {0}")]
    UnknownClient(String),
}

impl ClientError {
    pub fn missing(context_id: &str, capability: impl Into<String>) -> Self {
        ClientError::MissingCapability {
            context_id: context_id.to_string(),
            capability: capability.into(),
        }
    }

    /// The transport failure behind this error, if any.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ClientError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
