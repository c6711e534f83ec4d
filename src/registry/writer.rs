// src/registry/writer.rs

//! Target-registry write operations
//!
//! The importer drives a target registry exclusively through this
//! trait, so tests can substitute an in-memory registry for the HTTP
//! client.

use crate::error::Result;

/// Result of an exact-version existence check
///
/// `NotFound` is a definite answer from the registry, distinguished
/// from transport or API failures which surface as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLookup {
    Exists,
    NotFound,
}

/// Write operations against a target bundle registry
pub trait RegistryWriter {
    /// Whether the namespace exists on the target
    fn namespace_exists(&self, namespace: &str) -> Result<bool>;

    /// Create a namespace, returning its id
    fn create_namespace(&self, namespace: &str) -> Result<String>;

    /// Look up the id of a bundle family by its full `ns/shortname`
    /// name; `None` when the family is not registered
    fn find_family_id(&self, name: &str) -> Result<Option<String>>;

    /// Register a bundle family under a namespace, returning its id
    fn create_family(&self, namespace: &str, shortname: &str) -> Result<String>;

    /// Whether the exact versioned ref already exists on the target
    fn version_exists(&self, reference: &str) -> Result<VersionLookup>;

    /// Publish a bundle source as a new version of a family
    fn publish_version(&self, source: &str, family_id: &str, version: &str) -> Result<String>;
}
