//! Request interceptors.
//!
//! Interceptors run on the fully built request, after encoding and before the
//! transport, in the order the resolved configuration lists them.

use std::fmt;

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::{ClientError, ClientResult};
use crate::transport::Request;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Mutates an outgoing request.
pub trait RequestInterceptor: Send + Sync + fmt::Debug {
    fn apply(&self, request: &mut Request);
}

/// Adds an `x-request-id` header unless one is already present.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdInterceptor;

impl RequestInterceptor for RequestIdInterceptor {
    fn apply(&self, request: &mut Request) {
        if request.headers.contains_key(X_REQUEST_ID) {
            return;
        }
        let id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&id) {
            request.headers.insert(HeaderName::from_static(X_REQUEST_ID), value);
        }
    }
}

/// Appends one static header.
#[derive(Debug, Clone)]
pub struct HeaderInterceptor {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderInterceptor {
    pub fn new(name: &str, value: &str) -> ClientResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::Encode(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::Encode(format!("invalid header value for {}: {}", name, e)))?;
        Ok(Self { name, value })
    }
}

impl RequestInterceptor for HeaderInterceptor {
    fn apply(&self, request: &mut Request) {
        request.headers.append(self.name.clone(), self.value.clone());
    }
}
