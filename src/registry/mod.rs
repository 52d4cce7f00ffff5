//! Client specification registry.
//!
//! # Data Flow
//! ```text
//! EnablingDeclaration
//!     → register_default: "default.<enclosing type>" specification
//!     → scan_and_register:
//!         discovery.rs (candidates under the scanned packages)
//!         → filter.rs (client attributes AND optional allow-list)
//!         → naming.rs (service name, contextId, URL, path, alias)
//!         → registrar.rs (one specification + one client entry per contextId)
//! ```
//!
//! # Design Decisions
//! - Registration runs once, single-threaded, before any Target is built
//! - The same contextId registered twice: last registration wins
//! - A failing declaration never stops the scan; name failures fail it at the end

pub mod declaration;
pub mod discovery;
pub mod filter;
pub mod naming;
pub mod registrar;

pub use declaration::{
    CandidateType, ClientAttributes, ClientDeclaration, ClientSpecification, EnablingDeclaration, TypeDescriptor,
    TypeKind,
};
pub use discovery::{DiscoverySource, StaticDiscovery};
pub use filter::{AllFilter, CanonicalNameFilter, ClientAttributeFilter, TypeFilter};
pub use registrar::{ClientSpecificationRegistry, ScanError, ScanFailure, ScanReport};
