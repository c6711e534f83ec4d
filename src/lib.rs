// src/lib.rs

//! Caravan
//!
//! Moves versioned configuration bundles between two registry
//! instances: lists bundles from a source, orders them so every bundle
//! is imported only after everything it depends on, and replays the
//! imports against a target with bounded retries and graceful partial
//! failure.
//!
//! # Architecture
//!
//! - Manifests declare dependencies in nested `bundles:` blocks
//! - Resolution is a fixpoint over the ready frontier, with alias-aware
//!   edge removal for version-truncated and `@volatile` declarations
//! - Imports run sequentially with a per-run session cache; publish
//!   failures drop one bundle, setup failures abort the run

pub mod bundle;
mod error;
pub mod manifest;
pub mod registry;
pub mod resolver;

pub use bundle::VersionedBundle;
pub use error::{Error, Result};
pub use registry::{
    HttpRegistry, ImportOutcome, ImportSession, Importer, RegistryReader, RegistryWriter,
};
pub use resolver::{resolve, ResolutionResult};
