// src/registry/reader.rs

//! Source-registry read operations
//!
//! Listing goes through this trait so the sync flow can be driven by
//! an in-memory registry in tests; the HTTP client is the production
//! implementation.

use crate::bundle::VersionedBundle;
use crate::error::Result;

/// Read operations against a bundle registry
pub trait RegistryReader {
    /// List every bundle on the registry, deduplicated by ref
    ///
    /// `include_uncertified` also lists bundles not marked certified;
    /// refs in `must_include` are fetched even when the listing hides
    /// them.
    fn list_bundles(
        &self,
        include_uncertified: bool,
        must_include: &[String],
    ) -> Result<Vec<VersionedBundle>>;
}
