//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! runtime manifest (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RuntimeConfig (validated, immutable)
//!
//! On first use of a contextId:
//!     resolver.rs
//!     → base values from the parent component scope
//!     → code-level layer (client scope) and property layers, in precedence order
//!     → ResolvedClientConfig (cached per contextId)
//!
//! Declared names, URLs and paths:
//!     placeholder.rs (${key} / ${key:default})
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The precedence flag is read once, when the resolver is built

pub mod loader;
pub mod placeholder;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use placeholder::{Environment, PropertyResolver};
pub use resolver::{ConfigurationResolver, ResolvedClientConfig};
pub use schema::{
    ClientConfigProperties, ClientProperties, DeclaredClientConfig, EnableConfig, LoadBalancingConfig,
    LoadBalancingStrategy, LoggerLevel, ObservabilityConfig, RuntimeConfig, ServiceInstanceConfig,
};
pub use validation::{validate_config, PropertyError};
