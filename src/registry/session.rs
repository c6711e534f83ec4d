// src/registry/session.rs

//! Per-run import cache
//!
//! Remembers which namespaces have already been checked or created and
//! which family names already have a known id, so the importer issues
//! each setup query at most once per run. The session lives for exactly
//! one importer invocation and is never persisted.

use std::collections::{HashMap, HashSet};

/// Cache of namespace and family lookups for one import run
#[derive(Debug, Default)]
pub struct ImportSession {
    namespace_checked: HashSet<String>,
    family_ids: HashMap<String, String>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the namespace was already checked (and created if absent)
    pub fn has_checked_namespace(&self, namespace: &str) -> bool {
        self.namespace_checked.contains(namespace)
    }

    /// Record a namespace as checked for the rest of the run
    pub fn mark_namespace_checked(&mut self, namespace: &str) {
        self.namespace_checked.insert(namespace.to_string());
    }

    /// Cached family id for a full `ns/shortname` name, if known
    pub fn cached_family_id(&self, name: &str) -> Option<&str> {
        self.family_ids.get(name).map(String::as_str)
    }

    /// Record a family id for the rest of the run
    pub fn cache_family_id(&mut self, name: &str, id: &str) {
        self.family_ids.insert(name.to_string(), id.to_string());
    }
}
