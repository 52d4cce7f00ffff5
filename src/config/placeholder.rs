//! `${...}` placeholder resolution.
//!
//! Supports `${key}` and `${key:default}`. Unresolvable placeholders are left in
//! place so later validation can report the offending value.

use std::collections::HashMap;
use std::fmt;

/// Resolves placeholders in declared names, URLs and paths.
pub trait PropertyResolver: Send + Sync + fmt::Debug {
    fn resolve_placeholders(&self, text: &str) -> String;
}

/// Nested placeholders deeper than this are left unresolved.
const MAX_DEPTH: usize = 8;

/// Map-backed property environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    properties: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment seeded from process environment variables.
    pub fn from_process_env() -> Self {
        Self {
            properties: std::env::vars().collect(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add every entry of `properties`, overriding existing keys.
    pub fn extend(&mut self, properties: impl IntoIterator<Item = (String, String)>) {
        self.properties.extend(properties);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    fn resolve_depth(&self, text: &str, depth: usize) -> String {
        if depth > MAX_DEPTH {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = find_closing(after) else {
                out.push_str(&rest[start..]);
                return out;
            };

            let inner = self.resolve_depth(&after[..end], depth + 1);
            let (key, default) = match inner.split_once(':') {
                Some((k, d)) => (k, Some(d)),
                None => (inner.as_str(), None),
            };
            match self.get(key).or(default) {
                Some(value) => out.push_str(&self.resolve_depth(value, depth + 1)),
                None => {
                    out.push_str("${");
                    out.push_str(&inner);
                    out.push('}');
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Index of the `}` closing the placeholder opened just before `text`.
fn find_closing(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
        i += 1;
    }
    None
}

impl PropertyResolver for Environment {
    fn resolve_placeholders(&self, text: &str) -> String {
        self.resolve_depth(text, 0)
    }
}
