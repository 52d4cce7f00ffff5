//! Client proxy construction.
//!
//! # Data Flow
//! ```text
//! get_target(contract | alias | contextId)
//!     → registry lookup → ClientDeclaration
//!     → OnceCell per contextId (single-flight)
//!         → ConfigurationResolver::resolve
//!         → base URL: declared URL or http://<service>, plus path
//!         → TransportSelector::select
//!         → Targeter (required capability) → Target
//!     → Arc<Target>, shared by every caller
//!
//! Target::invoke
//!     → contract → template → encoder → interceptors → transport
//!     → decoder | error decoder
//!     → transport error + fallback → FallbackDispatcher
//! ```
//!
//! # Design Decisions
//! - Typed adapters implement `RemoteClient` and wrap an `Arc<Target>`
//! - Targets are immutable once built

pub mod factory;
pub mod target;
pub mod targeter;

use std::sync::Arc;

pub use factory::ClientProxyFactory;
pub use target::Target;
pub use targeter::{DefaultTargeter, FallbackTargeter, HardCodedTarget, TargetParts, Targeter};

/// A typed adapter over a client Target.
pub trait RemoteClient: Sized {
    /// Contract name the adapter is registered under.
    const CONTRACT: &'static str;

    fn from_target(target: Arc<Target>) -> Self;
}
