//! Layered configuration resolution.
//!
//! # Responsibilities
//! - Start from the parent scope's base components
//! - Apply the code-level layer and the two property layers in precedence order
//! - Cache one immutable `ResolvedClientConfig` per contextId
//!
//! # Design Decisions
//! - Each layer only sets what it carries; absent fields never reset
//! - A timeout pair is applied only when both halves are present in one layer
//! - Interceptors accumulate in layer-application order

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::codec::{Contract, Decoder, Encoder, ErrorDecoder};
use crate::config::schema::{ClientConfigProperties, ClientProperties, LoggerLevel};
use crate::context::ComponentContext;
use crate::error::ClientResult;
use crate::interceptor::RequestInterceptor;
use crate::resilience::Retryer;
use crate::transport::RequestOptions;

/// The effective configuration of one client context.
#[derive(Clone)]
pub struct ResolvedClientConfig {
    pub context_id: String,
    pub logger_level: LoggerLevel,
    pub retryer: Arc<dyn Retryer>,
    pub error_decoder: Arc<dyn ErrorDecoder>,
    /// Timeout pair; its retryer is `retryer`.
    pub options: RequestOptions,
    pub interceptors: Vec<(String, Arc<dyn RequestInterceptor>)>,
    pub encoder: Arc<dyn Encoder>,
    pub decoder: Arc<dyn Decoder>,
    pub contract: Arc<dyn Contract>,
    pub decode404: bool,
}

impl ResolvedClientConfig {
    pub fn interceptor_names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl fmt::Debug for ResolvedClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedClientConfig")
            .field("context_id", &self.context_id)
            .field("logger_level", &self.logger_level)
            .field("retryer", &self.retryer)
            .field("error_decoder", &self.error_decoder)
            .field("connect_timeout", &self.options.connect_timeout)
            .field("read_timeout", &self.options.read_timeout)
            .field("interceptors", &self.interceptor_names())
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .field("contract", &self.contract)
            .field("decode404", &self.decode404)
            .finish()
    }
}

/// Merges code-level and property-level configuration per contextId.
#[derive(Debug)]
pub struct ConfigurationResolver {
    properties: ClientProperties,
    cache: DashMap<String, Arc<ResolvedClientConfig>>,
}

impl ConfigurationResolver {
    pub fn new(properties: ClientProperties) -> Self {
        Self {
            properties,
            cache: DashMap::new(),
        }
    }

    pub fn properties(&self) -> &ClientProperties {
        &self.properties
    }

    /// Resolve (or return the cached) configuration for `context_id`.
    pub fn resolve(
        &self,
        context_id: &str,
        decode404: bool,
        context: &ComponentContext,
    ) -> ClientResult<Arc<ResolvedClientConfig>> {
        if let Some(cached) = self.cache.get(context_id) {
            return Ok(cached.clone());
        }

        let resolved = Arc::new(self.build(context_id, decode404, context)?);
        tracing::debug!(config = ?resolved, "Client configuration resolved");
        Ok(self
            .cache
            .entry(context_id.to_string())
            .or_insert(resolved)
            .clone())
    }

    pub fn cached(&self, context_id: &str) -> Option<Arc<ResolvedClientConfig>> {
        self.cache.get(context_id).map(|c| c.clone())
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    fn build(&self, context_id: &str, decode404: bool, context: &ComponentContext) -> ClientResult<ResolvedClientConfig> {
        let mut config = base(context_id, context)?;
        let default_section = self.properties.section(&self.properties.default_config);
        let own_section = self.properties.section(context_id);

        if self.properties.default_to_properties {
            apply_code(&mut config, decode404, context);
            apply_properties(&mut config, default_section, context)?;
            apply_properties(&mut config, own_section, context)?;
        } else {
            apply_properties(&mut config, default_section, context)?;
            apply_properties(&mut config, own_section, context)?;
            apply_code(&mut config, decode404, context);
        }

        config.options.retryer = config.retryer.clone();
        Ok(config)
    }
}

fn base(context_id: &str, context: &ComponentContext) -> ClientResult<ResolvedClientConfig> {
    let parent = context.parent();
    Ok(ResolvedClientConfig {
        context_id: context_id.to_string(),
        logger_level: parent.get::<LoggerLevel>().unwrap_or_default(),
        retryer: parent
            .get::<Arc<dyn Retryer>>()
            .unwrap_or_else(|| Arc::new(crate::resilience::NeverRetry)),
        error_decoder: parent
            .get::<Arc<dyn ErrorDecoder>>()
            .unwrap_or_else(|| Arc::new(crate::codec::DefaultErrorDecoder)),
        options: parent.get::<RequestOptions>().unwrap_or_default(),
        interceptors: Vec::new(),
        encoder: context.get_required::<Arc<dyn Encoder>>(context_id, "encoder")?,
        decoder: context.get_required::<Arc<dyn Decoder>>(context_id, "decoder")?,
        contract: context.get_required::<Arc<dyn Contract>>(context_id, "contract")?,
        decode404: false,
    })
}

fn apply_code(config: &mut ResolvedClientConfig, decode404: bool, context: &ComponentContext) {
    let scope = context.scope(&config.context_id);

    if let Some(level) = scope.get::<LoggerLevel>() {
        config.logger_level = level;
    }
    if let Some(retryer) = scope.get::<Arc<dyn Retryer>>() {
        config.retryer = retryer;
    }
    if let Some(error_decoder) = scope.get::<Arc<dyn ErrorDecoder>>() {
        config.error_decoder = error_decoder;
    }
    if let Some(options) = scope.get::<RequestOptions>() {
        config.options.connect_timeout = options.connect_timeout;
        config.options.read_timeout = options.read_timeout;
    }
    config.interceptors.extend(scope.interceptors());
    if decode404 {
        config.decode404 = true;
    }
}

fn apply_properties(
    config: &mut ResolvedClientConfig,
    section: Option<&ClientConfigProperties>,
    context: &ComponentContext,
) -> ClientResult<()> {
    let Some(section) = section else {
        return Ok(());
    };
    let context_id = config.context_id.clone();

    if let Some(level) = section.logger_level {
        config.logger_level = level;
    }

    match (section.connect_timeout_ms, section.read_timeout_ms) {
        (Some(connect), Some(read)) => {
            config.options.connect_timeout = Duration::from_millis(connect);
            config.options.read_timeout = Duration::from_millis(read);
        }
        (None, None) => {}
        _ => {
            tracing::debug!(context_id = %context_id, "Ignoring partial timeout configuration");
        }
    }

    if let Some(name) = &section.retryer {
        config.retryer = context.get_named_required::<Arc<dyn Retryer>>(&context_id, name, "retryer")?;
    }
    if let Some(name) = &section.error_decoder {
        config.error_decoder = context.get_named_required::<Arc<dyn ErrorDecoder>>(&context_id, name, "error decoder")?;
    }
    if let Some(names) = &section.request_interceptors {
        for name in names {
            let interceptor =
                context.get_named_required::<Arc<dyn RequestInterceptor>>(&context_id, name, "request interceptor")?;
            config.interceptors.push((name.clone(), interceptor));
        }
    }
    if section.decode404 == Some(true) {
        config.decode404 = true;
    }
    if let Some(name) = &section.encoder {
        config.encoder = context.get_named_required::<Arc<dyn Encoder>>(&context_id, name, "encoder")?;
    }
    if let Some(name) = &section.decoder {
        config.decoder = context.get_named_required::<Arc<dyn Decoder>>(&context_id, name, "decoder")?;
    }
    if let Some(name) = &section.contract {
        config.contract = context.get_named_required::<Arc<dyn Contract>>(&context_id, name, "contract")?;
    }
    Ok(())
}
