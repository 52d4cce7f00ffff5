//! Codec collaborators.
//!
//! # Data Flow
//! ```text
//! MethodMetadata ──contract.rs──▶ RequestTemplate
//! RequestTemplate + Arguments ──expand──▶ URL
//! Arguments.body ──Encoder──▶ Request body
//! Response ──Decoder──▶ serde_json::Value          (2xx, or 404 with decode404)
//! Response ──ErrorDecoder──▶ ClientError            (everything else)
//! ```
//!
//! # Design Decisions
//! - Values cross the codec boundary as `serde_json::Value`; typed adapters
//!   convert at the edge
//! - Every collaborator is a trait object so a client scope can swap it

pub mod contract;
pub mod json;

use std::collections::HashMap;
use std::fmt;

use reqwest::Method;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::transport::{Request, Response};

pub use contract::{DefaultContract, RequestTemplate};
pub use json::{DefaultErrorDecoder, JsonDecoder, JsonEncoder};

/// Writes a call body into the outgoing request.
pub trait Encoder: Send + Sync + fmt::Debug {
    fn encode(&self, body: &Value, request: &mut Request) -> ClientResult<()>;
}

/// Reads a successful response.
pub trait Decoder: Send + Sync + fmt::Debug {
    fn decode(&self, response: &Response) -> ClientResult<Value>;
}

/// Turns a non-success response into an error.
pub trait ErrorDecoder: Send + Sync + fmt::Debug {
    fn decode(&self, method_key: &str, response: &Response) -> ClientError;
}

/// Parses contract method metadata into a request template.
pub trait Contract: Send + Sync + fmt::Debug {
    fn parse(&self, method: &MethodMetadata) -> ClientResult<RequestTemplate>;
}

/// Static description of one contract method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMetadata {
    pub name: String,
    pub http_method: Method,
    /// Path template relative to the client's base URL, e.g. `/users/{id}`.
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl MethodMetadata {
    pub fn new(name: impl Into<String>, http_method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            http_method,
            path: path.into(),
            headers: Vec::new(),
        }
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::GET, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::POST, path)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// `Contract#method`, used in logs and error messages.
    pub fn config_key(&self, contract: &str) -> String {
        let simple = contract.rsplit("::").next().unwrap_or(contract);
        format!("{}#{}", simple, self.name)
    }
}

/// Runtime arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub path: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path.insert(name.into(), value.to_string());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
