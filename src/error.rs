// src/error.rs

//! Error types for caravan operations

use thiserror::Error;

/// Result type alias using the caravan error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during resolution and import
#[derive(Debug, Error)]
pub enum Error {
    /// Bundle manifest could not be parsed into the expected structure.
    /// Non-fatal: the bundle is marked illegible and excluded from the
    /// graph, but may remain a dangling unmet identifier for dependents.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Client construction or configuration failure
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Transient registry failure: namespace check/create, family
    /// lookup/create, or a version-existence check failing for a reason
    /// other than "not found". Fatal for the whole run once the attempt
    /// budget is exhausted.
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// Version publish failure. Retried, then the single bundle is
    /// dropped and the run continues.
    #[error("Publish error: {0}")]
    PublishError(String),

    /// Local file I/O failure
    #[error("I/O error: {0}")]
    IoError(String),
}
