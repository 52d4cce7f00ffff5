//! Candidate type filtering.
//!
//! # Responsibilities
//! - Match candidates carrying client attributes
//! - Match candidates by canonical name (explicit allow-lists)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Names are compared after `$` → `::` normalization
//! - Empty conjunction = always matches

use std::collections::HashSet;
use std::fmt;

use crate::registry::declaration::{canonical, CandidateType};

/// Predicate over discovered candidates.
pub trait TypeFilter: Send + Sync + fmt::Debug {
    fn matches(&self, candidate: &CandidateType) -> bool;
}

/// Matches candidates that carry client attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientAttributeFilter;

impl TypeFilter for ClientAttributeFilter {
    fn matches(&self, candidate: &CandidateType) -> bool {
        candidate.attributes.is_some()
    }
}

/// Matches candidates whose canonical name is in the set.
#[derive(Debug, Clone)]
pub struct CanonicalNameFilter {
    names: HashSet<String>,
}

impl CanonicalNameFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| canonical(n.as_ref().trim())).collect(),
        }
    }
}

impl TypeFilter for CanonicalNameFilter {
    fn matches(&self, candidate: &CandidateType) -> bool {
        self.names.contains(&candidate.descriptor.canonical_name())
    }
}

/// Combines multiple filters with AND semantics.
#[derive(Debug)]
pub struct AllFilter {
    filters: Vec<Box<dyn TypeFilter>>,
}

impl AllFilter {
    pub fn new(filters: Vec<Box<dyn TypeFilter>>) -> Self {
        Self { filters }
    }
}

impl TypeFilter for AllFilter {
    fn matches(&self, candidate: &CandidateType) -> bool {
        self.filters.iter().all(|f| f.matches(candidate))
    }
}
