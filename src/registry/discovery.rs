//! Discovery sources.

use std::fmt;

use crate::config::DeclaredClientConfig;
use crate::registry::declaration::CandidateType;

/// Enumerates candidate types under a set of packages.
pub trait DiscoverySource: Send + Sync + fmt::Debug {
    /// Candidates whose package is one of `packages` or nested under one.
    fn candidates(&self, packages: &[String]) -> Vec<CandidateType>;
}

/// True if `package` is `base` or a sub-package of it. The root package contains everything.
pub fn in_package(package: &str, base: &str) -> bool {
    base.is_empty()
        || package == base
        || package
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// A fixed list of candidates, registered explicitly or read from a manifest.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    candidates: Vec<CandidateType>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(entries: &[DeclaredClientConfig]) -> Self {
        Self {
            candidates: entries.iter().map(CandidateType::from_manifest).collect(),
        }
    }

    pub fn with(mut self, candidate: CandidateType) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn push(&mut self, candidate: CandidateType) {
        self.candidates.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl DiscoverySource for StaticDiscovery {
    fn candidates(&self, packages: &[String]) -> Vec<CandidateType> {
        self.candidates
            .iter()
            .filter(|c| {
                let package = c.descriptor.package();
                packages.iter().any(|base| in_package(&package, base))
            })
            .cloned()
            .collect()
    }
}
