//! The invokable client Target.
//!
//! # Responsibilities
//! - Turn a method call into a request: contract, template, encoder, interceptors
//! - Execute it on the selected transport with the resolved options
//! - Decode the response or map it through the error decoder
//! - Hand transport failures to the fallback dispatcher

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{Arguments, MethodMetadata};
use crate::config::ResolvedClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::fallback::FallbackDispatcher;
use crate::observability::{logging, metrics};
use crate::proxy::TargetParts;
use crate::registry::TypeDescriptor;
use crate::transport::{Request, Transport};

/// A client bound to a base URL, a transport and a resolved configuration.
pub struct Target {
    contract: TypeDescriptor,
    name: String,
    url: String,
    transport: Arc<dyn Transport>,
    config: Arc<ResolvedClientConfig>,
    fallback: Option<FallbackDispatcher>,
}

impl Target {
    pub fn new(parts: TargetParts, fallback: Option<FallbackDispatcher>) -> Self {
        Self {
            contract: parts.hard_coded.contract,
            name: parts.hard_coded.name,
            url: parts.hard_coded.url,
            transport: parts.transport,
            config: parts.config,
            fallback,
        }
    }

    pub fn contract(&self) -> &TypeDescriptor {
        &self.contract
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL every method path is appended to.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &Arc<ResolvedClientConfig> {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Invoke `method`. Transport failures go to the fallback, if one is attached.
    pub async fn invoke(&self, method: &MethodMetadata, args: &Arguments) -> ClientResult<Value> {
        let start = Instant::now();
        let context_id = self.config.context_id.as_str();

        match self.execute(method, args).await {
            Ok(value) => {
                metrics::record_request(context_id, "success", start);
                Ok(value)
            }
            Err(ClientError::Transport(cause)) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(
                        context_id = %context_id,
                        method = %method.config_key(&self.contract.name),
                        error = %cause,
                        "Transport failure, using fallback"
                    );
                    metrics::record_request(context_id, "fallback", start);
                    metrics::record_fallback(context_id);
                    fallback.dispatch(method, args, &cause).await
                }
                None => {
                    metrics::record_request(context_id, "transport_error", start);
                    Err(ClientError::Transport(cause))
                }
            },
            Err(e) => {
                metrics::record_request(context_id, "error", start);
                Err(e)
            }
        }
    }

    /// Invoke and deserialize the result.
    pub async fn invoke_as<T: DeserializeOwned>(&self, method: &MethodMetadata, args: &Arguments) -> ClientResult<T> {
        let value = self.invoke(method, args).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn execute(&self, method: &MethodMetadata, args: &Arguments) -> ClientResult<Value> {
        let method_key = method.config_key(&self.contract.name);
        let request = self.build_request(&method_key, method, args)?;
        let context_id = self.config.context_id.as_str();
        let level = self.config.logger_level;

        logging::log_request(level, context_id, &method_key, &request);
        let start = Instant::now();
        let response = self.transport.execute(request, &self.config.options).await?;
        logging::log_response(level, context_id, &method_key, &response, start.elapsed());

        let status = response.status;
        if status.is_success() || (status == StatusCode::NOT_FOUND && self.config.decode404) {
            self.config.decoder.decode(&response)
        } else {
            Err(self.config.error_decoder.decode(&method_key, &response))
        }
    }

    fn build_request(&self, method_key: &str, method: &MethodMetadata, args: &Arguments) -> ClientResult<Request> {
        let template = self.config.contract.parse(method)?;
        let url = template.expand(method_key, &self.url, args)?;
        let mut request = Request::new(template.method.clone(), url);

        for (name, value) in template.headers.iter().chain(args.headers.iter()) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Encode(format!("invalid header name {}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Encode(format!("invalid value for header {}: {}", name, e)))?;
            request.headers.append(header_name, header_value);
        }

        if let Some(body) = &args.body {
            self.config.encoder.encode(body, &mut request)?;
        }
        for (_, interceptor) in &self.config.interceptors {
            interceptor.apply(&mut request);
        }
        Ok(request)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("contract", &self.contract.name)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("transport", &self.transport)
            .field("context_id", &self.config.context_id)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
