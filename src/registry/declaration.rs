//! Declaration metadata types.

use std::fmt;

use crate::config::{DeclaredClientConfig, EnableConfig};
use crate::context::{ClientConfiguration, ConfigurationRef};
use crate::fallback::{FallbackFactorySpec, FallbackSpec};

/// Whether a type is an interface-shaped contract or a concrete implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Interface,
    Concrete,
}

/// Structural metadata of a type known to discovery.
///
/// Names are `::` paths; `$` marks a nested type (`app::Application$Config`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Interface,
        }
    }

    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Concrete,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Name with nesting markers normalized.
    pub fn canonical_name(&self) -> String {
        canonical(&self.name)
    }

    /// Module path of the outermost enclosing type.
    pub fn package(&self) -> String {
        let outer = self.name.split('$').next().unwrap_or(&self.name);
        match outer.rfind("::") {
            Some(i) => outer[..i].to_string(),
            None => String::new(),
        }
    }

    /// Last path segment of the canonical name.
    pub fn simple_name(&self) -> String {
        let canonical = self.canonical_name();
        canonical.rsplit("::").next().unwrap_or_default().to_string()
    }

    /// Canonical name of the directly enclosing type, for nested types.
    pub fn enclosing_name(&self) -> Option<String> {
        self.name.rfind('$').map(|i| canonical(&self.name[..i]))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Normalize `$` nesting markers to `::`.
pub fn canonical(name: &str) -> String {
    name.replace('$', "::")
}

/// Raw attributes of a client declaration, before placeholder resolution.
#[derive(Debug, Clone)]
pub struct ClientAttributes {
    pub value: Option<String>,
    pub name: Option<String>,
    pub service_id: Option<String>,
    pub context_id: Option<String>,
    pub qualifier: Option<String>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub decode404: bool,
    pub primary: bool,
    pub configuration: Option<ConfigurationRef>,
    pub fallback: Option<FallbackSpec>,
    pub fallback_factory: Option<FallbackFactorySpec>,
}

impl Default for ClientAttributes {
    fn default() -> Self {
        Self {
            value: None,
            name: None,
            service_id: None,
            context_id: None,
            qualifier: None,
            url: None,
            path: None,
            decode404: false,
            primary: true,
            configuration: None,
            fallback: None,
            fallback_factory: None,
        }
    }
}

impl ClientAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a declaration naming its service.
    pub fn named(service: impl Into<String>) -> Self {
        Self::new().value(service)
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    pub fn context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn decode404(mut self, decode404: bool) -> Self {
        self.decode404 = decode404;
        self
    }

    pub fn primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn configuration(mut self, configuration: ConfigurationRef) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn fallback(mut self, fallback: FallbackSpec) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn fallback_factory(mut self, factory: FallbackFactorySpec) -> Self {
        self.fallback_factory = Some(factory);
        self
    }
}

/// A type offered by discovery, with its client attributes if it carries any.
#[derive(Debug, Clone)]
pub struct CandidateType {
    pub descriptor: TypeDescriptor,
    pub attributes: Option<ClientAttributes>,
}

impl CandidateType {
    pub fn client(descriptor: TypeDescriptor, attributes: ClientAttributes) -> Self {
        Self {
            descriptor,
            attributes: Some(attributes),
        }
    }

    /// A type without client attributes.
    pub fn plain(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            attributes: None,
        }
    }

    /// Interface candidate built from a manifest entry.
    pub fn from_manifest(entry: &DeclaredClientConfig) -> Self {
        let attributes = ClientAttributes {
            value: entry.value.clone(),
            name: entry.name.clone(),
            service_id: entry.service_id.clone(),
            context_id: entry.context_id.clone(),
            qualifier: entry.qualifier.clone(),
            url: entry.url.clone(),
            path: entry.path.clone(),
            decode404: entry.decode404,
            primary: entry.primary,
            ..ClientAttributes::default()
        };
        Self::client(TypeDescriptor::interface(entry.contract.clone()), attributes)
    }
}

/// The global enabling declaration.
#[derive(Debug, Clone)]
pub struct EnablingDeclaration {
    pub descriptor: TypeDescriptor,
    pub default_configuration: Option<ConfigurationRef>,
    pub base_packages: Vec<String>,
    /// Types whose packages are scanned.
    pub base_package_types: Vec<String>,
    /// Explicit allow-list of client contracts. Disables package scanning.
    pub clients: Vec<String>,
}

impl EnablingDeclaration {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            default_configuration: None,
            base_packages: Vec::new(),
            base_package_types: Vec::new(),
            clients: Vec::new(),
        }
    }

    pub fn with_default_configuration(mut self, configuration: ConfigurationRef) -> Self {
        self.default_configuration = Some(configuration);
        self
    }

    pub fn with_base_package(mut self, package: impl Into<String>) -> Self {
        self.base_packages.push(package.into());
        self
    }

    pub fn with_base_package_type(mut self, type_name: impl Into<String>) -> Self {
        self.base_package_types.push(type_name.into());
        self
    }

    pub fn with_client(mut self, contract: impl Into<String>) -> Self {
        self.clients.push(contract.into());
        self
    }

    /// Name of the specification holding the default configuration.
    pub fn default_specification_name(&self) -> String {
        let owner = self
            .descriptor
            .enclosing_name()
            .unwrap_or_else(|| self.descriptor.canonical_name());
        format!("default.{}", owner)
    }
}

impl From<&EnableConfig> for EnablingDeclaration {
    fn from(config: &EnableConfig) -> Self {
        Self {
            descriptor: TypeDescriptor::concrete(config.type_name.clone()),
            default_configuration: None,
            base_packages: config.base_packages.clone(),
            base_package_types: Vec::new(),
            clients: config.clients.clone(),
        }
    }
}

/// A validated client declaration.
#[derive(Debug, Clone)]
pub struct ClientDeclaration {
    pub contract: TypeDescriptor,
    pub service_name: String,
    pub context_id: String,
    /// Absolute base URL, scheme included.
    pub url: Option<String>,
    /// Normalized path prefix, empty or `/segment`.
    pub path: String,
    pub decode404: bool,
    pub fallback: Option<FallbackSpec>,
    pub fallback_factory: Option<FallbackFactorySpec>,
    pub qualifier: Option<String>,
    /// `<contextId>Client`, or the qualifier.
    pub alias: String,
    pub primary: bool,
    pub configuration: Option<ConfigurationRef>,
}

/// A named configuration contributed to the component context.
#[derive(Debug, Clone)]
pub struct ClientSpecification {
    pub name: String,
    pub configuration: ConfigurationRef,
}

impl ClientSpecification {
    pub fn new(name: impl Into<String>, configuration: ConfigurationRef) -> Self {
        Self {
            name: name.into(),
            configuration,
        }
    }

    /// Specification with no components.
    pub fn empty(name: impl Into<String>) -> Self {
        let name = name.into();
        let configuration = ClientConfiguration::new(name.clone()).build();
        Self { name, configuration }
    }
}
