//! Two-phase client registration.
//!
//! # Responsibilities
//! - Register the default specification of the enabling declaration
//! - Scan discovery candidates and validate each declaration
//! - Register one specification and one client entry per contextId
//! - Resolve contract names, aliases and contextIds to declarations

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::PropertyResolver;
use crate::error::{ClientError, ClientResult, ValidationError};
use crate::registry::declaration::{
    canonical, CandidateType, ClientAttributes, ClientDeclaration, ClientSpecification, EnablingDeclaration,
    TypeDescriptor,
};
use crate::registry::discovery::DiscoverySource;
use crate::registry::filter::{AllFilter, CanonicalNameFilter, ClientAttributeFilter, TypeFilter};
use crate::registry::naming;

/// One declaration rejected during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub type_name: String,
    pub error: ClientError,
}

impl ScanFailure {
    /// Name or contextId resolution failures fail the whole scan.
    pub fn is_fatal(&self) -> bool {
        matches!(&self.error, ClientError::Validation(e) if e.is_name_resolution())
    }
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.error)
    }
}

/// Outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// contextIds registered, in discovery order.
    pub registered: Vec<String>,
    pub failures: Vec<ScanFailure>,
}

/// A scan in which at least one declaration failed name resolution.
#[derive(Debug, Clone, Error)]
#[error("client registration failed: {}", fatal_failures(.report))]
pub struct ScanError {
    pub report: ScanReport,
}

fn fatal_failures(report: &ScanReport) -> String {
    report
        .failures
        .iter()
        .filter(|f| f.is_fatal())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
struct AliasEntry {
    context_id: String,
    primary: bool,
}

/// Owns client specifications and declarations.
#[derive(Debug)]
pub struct ClientSpecificationRegistry {
    environment: Arc<dyn PropertyResolver>,
    specifications: HashMap<String, ClientSpecification>,
    clients: HashMap<String, Arc<ClientDeclaration>>,
    contracts: HashMap<String, String>,
    aliases: HashMap<String, AliasEntry>,
}

impl ClientSpecificationRegistry {
    pub fn new(environment: Arc<dyn PropertyResolver>) -> Self {
        Self {
            environment,
            specifications: HashMap::new(),
            clients: HashMap::new(),
            contracts: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register the enabling declaration's default configuration, if it has one.
    pub fn register_default(&mut self, enabling: &EnablingDeclaration) {
        let Some(configuration) = &enabling.default_configuration else {
            tracing::debug!(enabling = %enabling.descriptor, "No default client configuration");
            return;
        };
        let name = enabling.default_specification_name();
        self.register_specification(ClientSpecification::new(name, configuration.clone()));
    }

    /// Register a specification. The last registration for a name wins.
    pub fn register_specification(&mut self, specification: ClientSpecification) {
        let name = specification.name.clone();
        if self.specifications.insert(name.clone(), specification).is_some() {
            tracing::debug!(specification = %name, "Client specification replaced");
        } else {
            tracing::debug!(specification = %name, "Client specification registered");
        }
    }

    /// Discover, validate and register every client declaration.
    pub fn scan_and_register(
        &mut self,
        enabling: &EnablingDeclaration,
        discovery: &dyn DiscoverySource,
    ) -> Result<ScanReport, ScanError> {
        let packages = scan_packages(enabling);
        let filter = scan_filter(enabling);
        tracing::debug!(packages = ?packages, explicit = !enabling.clients.is_empty(), "Scanning for client declarations");

        let mut report = ScanReport::default();
        let mut seen = HashSet::new();
        for candidate in discovery.candidates(&packages) {
            if !filter.matches(&candidate) || !seen.insert(candidate.descriptor.canonical_name()) {
                continue;
            }
            let Some(attributes) = &candidate.attributes else {
                continue;
            };

            match self.declare(&candidate.descriptor, attributes) {
                Ok(declaration) => report.registered.push(self.register_client(declaration)),
                Err(error) => {
                    tracing::error!(contract = %candidate.descriptor, error = %error, "Client declaration rejected");
                    report.failures.push(ScanFailure {
                        type_name: candidate.descriptor.canonical_name(),
                        error,
                    });
                }
            }
        }

        if report.failures.iter().any(ScanFailure::is_fatal) {
            return Err(ScanError { report });
        }
        tracing::info!(
            registered = report.registered.len(),
            rejected = report.failures.len(),
            "Client scan complete"
        );
        Ok(report)
    }

    /// Validate raw attributes into a declaration.
    pub fn declare(&self, descriptor: &TypeDescriptor, attributes: &ClientAttributes) -> ClientResult<ClientDeclaration> {
        let type_name = descriptor.canonical_name();
        if !descriptor.is_interface() {
            return Err(ValidationError::NotAnInterface { type_name }.into());
        }

        let env = self.environment.as_ref();
        let service_name = naming::resolve_service_name(attributes, env, &type_name)?;
        let context_id = naming::resolve_context_id(attributes, env, &type_name, &service_name)?;
        validate_fallbacks(&type_name, attributes)?;

        let url = match &attributes.url {
            Some(raw) => naming::normalize_url(&env.resolve_placeholders(raw))?,
            None => None,
        };
        let path = attributes
            .path
            .as_deref()
            .map(|p| naming::normalize_path(&env.resolve_placeholders(p)))
            .unwrap_or_default();
        let qualifier = attributes
            .qualifier
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        let alias = naming::alias_for(&context_id, qualifier.as_deref());

        Ok(ClientDeclaration {
            contract: descriptor.clone(),
            service_name,
            context_id,
            url,
            path,
            decode404: attributes.decode404,
            fallback: attributes.fallback.clone(),
            fallback_factory: attributes.fallback_factory.clone(),
            qualifier,
            alias,
            primary: attributes.primary,
            configuration: attributes.configuration.clone(),
        })
    }

    /// Register a validated declaration and its specification. Returns its contextId.
    pub fn register_client(&mut self, declaration: ClientDeclaration) -> String {
        let context_id = declaration.context_id.clone();
        let contract = declaration.contract.canonical_name();

        let specification = match &declaration.configuration {
            Some(configuration) => ClientSpecification::new(context_id.clone(), configuration.clone()),
            None => ClientSpecification::empty(context_id.clone()),
        };
        self.register_specification(specification);

        self.register_alias(&declaration);
        let declaration = Arc::new(declaration);
        if let Some(previous) = self.clients.insert(context_id.clone(), declaration.clone()) {
            tracing::warn!(
                context_id = %context_id,
                previous = %previous.contract,
                contract = %declaration.contract,
                "Client context registered twice, last registration wins"
            );
            let previous_contract = previous.contract.canonical_name();
            if previous_contract != contract {
                self.contracts.remove(&previous_contract);
            }
        }
        self.contracts.insert(contract, context_id.clone());

        tracing::info!(
            context_id = %context_id,
            contract = %declaration.contract,
            service = %declaration.service_name,
            url = ?declaration.url,
            alias = %declaration.alias,
            "Client registered"
        );
        context_id
    }

    fn register_alias(&mut self, declaration: &ClientDeclaration) {
        let entry = AliasEntry {
            context_id: declaration.context_id.clone(),
            primary: declaration.primary,
        };
        match self.aliases.get(&declaration.alias) {
            Some(existing) if existing.primary && !entry.primary && existing.context_id != entry.context_id => {
                tracing::debug!(
                    alias = %declaration.alias,
                    kept = %existing.context_id,
                    "Alias held by a primary client"
                );
            }
            Some(existing) if existing.context_id != entry.context_id => {
                tracing::warn!(
                    alias = %declaration.alias,
                    previous = %existing.context_id,
                    context_id = %entry.context_id,
                    "Client alias reassigned"
                );
                self.aliases.insert(declaration.alias.clone(), entry);
            }
            _ => {
                self.aliases.insert(declaration.alias.clone(), entry);
            }
        }
    }

    /// Find a declaration by contract name, alias or contextId.
    pub fn lookup(&self, key: &str) -> Option<Arc<ClientDeclaration>> {
        let key = key.trim();
        let context_id = self
            .contracts
            .get(&canonical(key))
            .or_else(|| self.aliases.get(key).map(|a| &a.context_id))
            .map(String::as_str)
            .unwrap_or(key);
        self.clients.get(context_id).cloned()
    }

    pub fn specification(&self, name: &str) -> Option<&ClientSpecification> {
        self.specifications.get(name)
    }

    /// Specifications sorted by name.
    pub fn specifications(&self) -> Vec<ClientSpecification> {
        let mut specifications: Vec<ClientSpecification> = self.specifications.values().cloned().collect();
        specifications.sort_by(|a, b| a.name.cmp(&b.name));
        specifications
    }

    /// Declarations sorted by contextId.
    pub fn declarations(&self) -> Vec<Arc<ClientDeclaration>> {
        let mut declarations: Vec<Arc<ClientDeclaration>> = self.clients.values().cloned().collect();
        declarations.sort_by(|a, b| a.context_id.cmp(&b.context_id));
        declarations
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

fn validate_fallbacks(type_name: &str, attributes: &ClientAttributes) -> Result<(), ValidationError> {
    match (&attributes.fallback, &attributes.fallback_factory) {
        (Some(_), Some(_)) => Err(ValidationError::ConflictingFallbacks(type_name.to_string())),
        (Some(fallback), None) if fallback.descriptor.is_interface() => {
            Err(ValidationError::InterfaceFallback(fallback.descriptor.canonical_name()))
        }
        (None, Some(factory)) if factory.descriptor.is_interface() || factory.produces.is_interface() => Err(
            ValidationError::InterfaceFallbackFactory(factory.descriptor.canonical_name()),
        ),
        _ => Ok(()),
    }
}

/// Packages to scan: the allow-list's packages, else the declared base packages,
/// else the enabling type's own package.
fn scan_packages(enabling: &EnablingDeclaration) -> Vec<String> {
    let mut packages: Vec<String> = if enabling.clients.is_empty() {
        enabling
            .base_packages
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .chain(
                enabling
                    .base_package_types
                    .iter()
                    .map(|t| TypeDescriptor::concrete(t.trim()).package()),
            )
            .collect()
    } else {
        enabling
            .clients
            .iter()
            .map(|c| TypeDescriptor::interface(c.trim()).package())
            .collect()
    };

    if packages.is_empty() {
        packages.push(enabling.descriptor.package());
    }
    let mut seen = HashSet::new();
    packages.retain(|p| seen.insert(p.clone()));
    packages
}

fn scan_filter(enabling: &EnablingDeclaration) -> Box<dyn TypeFilter> {
    if enabling.clients.is_empty() {
        Box::new(ClientAttributeFilter)
    } else {
        Box::new(AllFilter::new(vec![
            Box::new(ClientAttributeFilter),
            Box::new(CanonicalNameFilter::new(&enabling.clients)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::context::ClientConfiguration;
    use crate::fallback::{FallbackFactorySpec, FallbackSpec};
    use crate::registry::StaticDiscovery;

    fn registry() -> ClientSpecificationRegistry {
        let env = Environment::new()
            .with_property("billing.url", "billing.internal:8080")
            .with_property("empty", "");
        ClientSpecificationRegistry::new(Arc::new(env))
    }

    fn enabling() -> EnablingDeclaration {
        EnablingDeclaration::new(TypeDescriptor::concrete("app::Application"))
    }

    fn client(name: &str, attributes: ClientAttributes) -> CandidateType {
        CandidateType::client(TypeDescriptor::interface(name), attributes)
    }

    #[test]
    fn test_register_default() {
        let mut registry = registry();
        registry.register_default(&enabling());
        assert!(registry.specifications().is_empty());

        let enabling = enabling().with_default_configuration(ClientConfiguration::new("Shared").build());
        registry.register_default(&enabling);
        assert_eq!(registry.specification("default.app::Application").unwrap().configuration.name(), "Shared");
    }

    #[test]
    fn test_scan_registers_clients() {
        let discovery = StaticDiscovery::new()
            .with(client(
                "app::clients::BillingApi",
                ClientAttributes::named("billing").url("${billing.url}").path("api/"),
            ))
            .with(client("app::clients::UsersApi", ClientAttributes::named("users").qualifier("people")))
            .with(CandidateType::plain(TypeDescriptor::interface("app::clients::Helper")))
            .with(client("vendor::ThirdPartyApi", ClientAttributes::named("vendor")));

        let mut registry = registry();
        let report = registry.scan_and_register(&enabling(), &discovery).unwrap();
        assert_eq!(report.registered, vec!["billing", "users"]);
        assert!(report.failures.is_empty());

        let billing = registry.lookup("app::clients::BillingApi").unwrap();
        assert_eq!(billing.url.as_deref(), Some("http://billing.internal:8080"));
        assert_eq!(billing.path, "/api");
        assert_eq!(billing.alias, "billingClient");
        assert!(registry.lookup("billingClient").is_some());
        assert!(registry.lookup("billing").is_some());
        assert_eq!(registry.lookup("people").unwrap().context_id, "users");
        assert!(registry.lookup("usersClient").is_none());
        assert!(registry.specification("billing").is_some());
    }

    #[test]
    fn test_explicit_client_list() {
        let discovery = StaticDiscovery::new()
            .with(client("app::Outer$BillingApi", ClientAttributes::named("billing")))
            .with(client("app::UsersApi", ClientAttributes::named("users")));

        let enabling = enabling().with_client("app::Outer$BillingApi").with_base_package("ignored");
        let mut registry = registry();
        let report = registry.scan_and_register(&enabling, &discovery).unwrap();
        assert_eq!(report.registered, vec!["billing"]);
        assert!(registry.lookup("app::Outer::BillingApi").is_some());
    }

    #[test]
    fn test_base_packages() {
        let enabling = EnablingDeclaration::new(TypeDescriptor::concrete("app::Application"))
            .with_base_package("app::clients")
            .with_base_package_type("vendor::api::Marker")
            .with_base_package("app::clients");
        assert_eq!(scan_packages(&enabling), vec!["app::clients", "vendor::api"]);
        assert_eq!(scan_packages(&self::enabling()), vec!["app"]);
    }

    #[test]
    fn test_fallback_factory_must_produce_concrete_fallbacks() {
        let registry = registry();
        let interface_product = ClientAttributes::named("billing").fallback_factory(FallbackFactorySpec::new(
            TypeDescriptor::concrete("app::BillingFallbackFactory"),
            TypeDescriptor::interface("app::BillingApi"),
        ));
        assert_eq!(
            registry
                .declare(&TypeDescriptor::interface("app::BillingApi"), &interface_product)
                .unwrap_err(),
            ClientError::Validation(ValidationError::InterfaceFallbackFactory(
                "app::BillingFallbackFactory".into()
            ))
        );

        let interface_factory = ClientAttributes::named("billing").fallback_factory(FallbackFactorySpec::new(
            TypeDescriptor::interface("app::BillingFallbackFactory"),
            TypeDescriptor::concrete("app::BillingFallback"),
        ));
        assert!(registry
            .declare(&TypeDescriptor::interface("app::BillingApi"), &interface_factory)
            .is_err());

        let concrete = ClientAttributes::named("billing").fallback_factory(FallbackFactorySpec::new(
            TypeDescriptor::concrete("app::BillingFallbackFactory"),
            TypeDescriptor::concrete("app::BillingFallback"),
        ));
        assert!(registry
            .declare(&TypeDescriptor::interface("app::BillingApi"), &concrete)
            .is_ok());
    }

    #[test]
    fn test_non_fatal_failures_continue_scan() {
        let discovery = StaticDiscovery::new()
            .with(CandidateType::client(TypeDescriptor::concrete("app::BillingImpl"), ClientAttributes::named("billing")))
            .with(client(
                "app::BothApi",
                ClientAttributes::named("both")
                    .fallback(FallbackSpec::new(TypeDescriptor::concrete("app::BothFallback")))
                    .fallback_factory(FallbackFactorySpec::new(
                        TypeDescriptor::concrete("app::BothFactory"),
                        TypeDescriptor::concrete("app::BothFallback"),
                    )),
            ))
            .with(client(
                "app::IfaceApi",
                ClientAttributes::named("iface").fallback(FallbackSpec::new(TypeDescriptor::interface("app::IfaceApi"))),
            ))
            .with(client("app::BadUrlApi", ClientAttributes::named("badurl").url("http://bad host")))
            .with(client("app::UsersApi", ClientAttributes::named("users")));

        let mut registry = registry();
        let report = registry.scan_and_register(&enabling(), &discovery).unwrap();
        assert_eq!(report.registered, vec!["users"]);
        let errors: Vec<&ClientError> = report.failures.iter().map(|f| &f.error).collect();
        assert!(matches!(errors[0], ClientError::Validation(ValidationError::NotAnInterface { .. })));
        assert!(matches!(errors[1], ClientError::Validation(ValidationError::ConflictingFallbacks(_))));
        assert!(matches!(errors[2], ClientError::Validation(ValidationError::InterfaceFallback(_))));
        assert!(matches!(errors[3], ClientError::MalformedUrl { .. }));
    }

    #[test]
    fn test_name_resolution_failure_is_fatal() {
        let discovery = StaticDiscovery::new()
            .with(client("app::NamelessApi", ClientAttributes::new()))
            .with(client("app::UsersApi", ClientAttributes::named("users")));

        let mut registry = registry();
        let err = registry.scan_and_register(&enabling(), &discovery).unwrap_err();
        assert_eq!(err.report.registered, vec!["users"]);
        assert_eq!(err.report.failures.len(), 1);
        assert!(err.to_string().contains("app::NamelessApi"));
    }

    #[test]
    fn test_blank_context_id_after_resolution_is_fatal() {
        let discovery = StaticDiscovery::new().with(client("app::Api", ClientAttributes::named("svc").context_id("${empty}")));
        let mut registry = registry();
        assert!(registry.scan_and_register(&enabling(), &discovery).is_err());
    }

    #[test]
    fn test_same_context_id_last_wins() {
        let mut registry = registry();
        let first = registry
            .declare(&TypeDescriptor::interface("app::BillingV1"), &ClientAttributes::named("billing"))
            .unwrap();
        let second = registry
            .declare(&TypeDescriptor::interface("app::BillingV2"), &ClientAttributes::named("billing"))
            .unwrap();
        registry.register_client(first);
        registry.register_client(second);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("billing").unwrap().contract.name, "app::BillingV2");
        assert!(registry.lookup("app::BillingV1").is_none());
    }

    #[test]
    fn test_primary_takes_over_alias() {
        let mut registry = registry();
        let secondary = registry
            .declare(
                &TypeDescriptor::interface("app::LegacyApi"),
                &ClientAttributes::named("legacy").qualifier("api").primary(false),
            )
            .unwrap();
        let primary = registry
            .declare(&TypeDescriptor::interface("app::ModernApi"), &ClientAttributes::named("modern").qualifier("api"))
            .unwrap();
        let late_secondary = registry
            .declare(
                &TypeDescriptor::interface("app::OtherApi"),
                &ClientAttributes::named("other").qualifier("api").primary(false),
            )
            .unwrap();

        registry.register_client(secondary);
        registry.register_client(primary);
        registry.register_client(late_secondary);
        assert_eq!(registry.lookup("api").unwrap().context_id, "modern");
    }
}
