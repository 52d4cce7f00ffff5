//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Target::invoke builds a Request
//!     → selector.rs picked the transport when the Target was built:
//!         - declared URL      → direct transport (load balancer unwrapped)
//!         - no declared URL   → load_balanced.rs
//!     → load_balanced.rs strips the service host, asks the instance resolver
//!       for a backend, rebuilds the URL and delegates
//!     → http.rs executes with the connect/read timeout pair and retryer
//! ```
//!
//! # Design Decisions
//! - Transports are shared by every Target of a process; they must be `Send + Sync`
//! - The timeout pair and retryer travel with the request as `RequestOptions`
//! - Load-balancing capability is discoverable through `load_balanced_delegate`

pub mod http;
pub mod load_balanced;
pub mod selector;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::error::TransportError;
use crate::resilience::{NeverRetry, Retryer};

pub use http::HttpTransport;
pub use load_balanced::{clean_url, LoadBalancingTransport};
pub use selector::TransportSelector;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// A fully built outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Absolute URL, including query string.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// A response as returned by a transport.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Body as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Per-request execution options.
///
/// The timeout pair is always set together.
#[derive(Clone)]
pub struct RequestOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Pass-through retry policy.
    pub retryer: Arc<dyn Retryer>,
}

impl RequestOptions {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            retryer: Arc::new(NeverRetry),
        }
    }

    pub fn with_retryer(mut self, retryer: Arc<dyn Retryer>) -> Self {
        self.retryer = retryer;
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("retryer", &self.retryer)
            .finish()
    }
}

impl PartialEq for RequestOptions {
    fn eq(&self, other: &Self) -> bool {
        self.connect_timeout == other.connect_timeout && self.read_timeout == other.read_timeout
    }
}

/// Executes requests against the network.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Execute a request.
    async fn execute(&self, request: Request, options: &RequestOptions) -> Result<Response, TransportError>;

    /// For load-balancing transports, the non-load-balancing transport they decorate.
    fn load_balanced_delegate(&self) -> Option<Arc<dyn Transport>> {
        None
    }

    /// True if this transport resolves service names through a load balancer.
    fn is_load_balancing(&self) -> bool {
        self.load_balanced_delegate().is_some()
    }
}
