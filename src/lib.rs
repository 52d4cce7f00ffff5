//! Declarative remote-service clients.
//!
//! A client contract is declared once with its service name, optional URL and
//! path, fallback and configuration. The registry turns declarations into
//! specifications; the factory lazily builds one shared `Target` per client
//! context, resolving configuration from code and properties and routing
//! through a load balancer when no URL is declared.

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod fallback;
pub mod interceptor;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod proxy;
pub mod registry;
pub mod resilience;
pub mod transport;

pub use config::schema::RuntimeConfig;
pub use error::{ClientError, ClientResult, TransportError, ValidationError};
pub use lifecycle::{Bootstrap, ClientRuntime};
pub use proxy::{ClientProxyFactory, RemoteClient, Target};
