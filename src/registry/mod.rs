// src/registry/mod.rs

//! Registry clients, import session cache, and the retrying importer

mod client;
mod importer;
mod reader;
mod session;
mod writer;

pub use client::HttpRegistry;
pub use importer::{ImportOutcome, Importer, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use reader::RegistryReader;
pub use session::ImportSession;
pub use writer::{RegistryWriter, VersionLookup};
