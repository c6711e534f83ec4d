// src/bundle.rs

//! Versioned bundle value type and per-ref file persistence
//!
//! A bundle is a versioned configuration document identified by a ref
//! of the form `namespace/shortname@version`. Bundle sources are
//! persisted one file per ref, with the ref percent-encoded into the
//! file name so `/` and `@` survive the filesystem.

use crate::error::{Error, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension for persisted bundle sources
const BUNDLE_FILE_EXT: &str = "yml";

/// A single version of a bundle, as fetched from a registry
///
/// Immutable once constructed; the resolver and importer only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedBundle {
    /// Globally unique identifier: `name@version`
    pub reference: String,
    /// Fully qualified name: `namespace/shortname`
    pub name: String,
    /// Version string, e.g. `1.2.3` or `volatile`
    pub version: String,
    /// Raw manifest text
    pub source: String,
}

impl VersionedBundle {
    /// Construct a bundle from its ref and raw source text
    ///
    /// The name is everything before the first `@`; the version is the
    /// remainder (which may itself contain `@`, kept verbatim).
    pub fn new(reference: impl Into<String>, source: impl Into<String>) -> Self {
        let reference = reference.into();
        let (name, version) = match reference.split_once('@') {
            Some((name, version)) => (name.to_string(), version.to_string()),
            None => (reference.clone(), String::new()),
        };

        Self {
            reference,
            name,
            version,
            source: source.into(),
        }
    }

    /// Split the name into `(namespace, shortname)`
    ///
    /// A name without `/` is treated as a bare namespace with an empty
    /// shortname; registries reject those upstream.
    pub fn split_name(&self) -> (&str, &str) {
        match self.name.split_once('/') {
            Some((ns, short)) => (ns, short),
            None => (self.name.as_str(), ""),
        }
    }
}

/// File name for a bundle ref, safe for any filesystem
pub fn bundle_file_name(reference: &str) -> String {
    format!(
        "{}.{}",
        utf8_percent_encode(reference, NON_ALPHANUMERIC),
        BUNDLE_FILE_EXT
    )
}

/// Recover a bundle ref from a persisted file name
pub fn ref_from_file_name(file_name: &str) -> Result<String> {
    let stem = file_name
        .strip_suffix(&format!(".{BUNDLE_FILE_EXT}"))
        .unwrap_or(file_name);

    percent_decode_str(stem)
        .decode_utf8()
        .map(|s| s.to_string())
        .map_err(|e| Error::ParseError(format!("Invalid encoding in file name {file_name}: {e}")))
}

/// Load one bundle from a source file
pub fn load_bundle(reference: &str, src_path: &Path) -> Result<VersionedBundle> {
    debug!("Loading bundle {} from {}", reference, src_path.display());

    let source = fs::read_to_string(src_path).map_err(|e| {
        Error::IoError(format!("Failed to read {}: {e}", src_path.display()))
    })?;

    Ok(VersionedBundle::new(reference, source))
}

/// Load every bundle source file in a directory
///
/// Bundle refs are recovered from the file names; subdirectories and
/// files without the bundle extension are skipped.
pub fn load_bundles_in_dir(dir: &Path) -> Result<Vec<VersionedBundle>> {
    let mut bundles = Vec::new();

    let entries = fs::read_dir(dir)
        .map_err(|e| Error::IoError(format!("Failed to read directory {}: {e}", dir.display())))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| Error::IoError(format!("Failed to read directory entry: {e}")))?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if !file_name.ends_with(&format!(".{BUNDLE_FILE_EXT}")) {
            continue;
        }

        let reference = ref_from_file_name(&file_name)?;
        bundles.push(load_bundle(&reference, &path)?);
    }

    // Directory iteration order is platform-dependent
    bundles.sort_by(|a, b| a.reference.cmp(&b.reference));

    Ok(bundles)
}

/// Load bundles listed in an ordered ref list, preserving list order
pub fn load_listed_bundles(list_path: &Path, src_dir: &Path) -> Result<Vec<VersionedBundle>> {
    let listing = fs::read_to_string(list_path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", list_path.display())))?;

    let mut bundles = Vec::new();
    for reference in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let src_path = src_dir.join(bundle_file_name(reference));
        bundles.push(load_bundle(reference, &src_path)?);
    }

    Ok(bundles)
}

/// Save a bundle's source under its encoded file name
pub fn save_bundle(bundle: &VersionedBundle, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", dir.display())))?;

    let path = dir.join(bundle_file_name(&bundle.reference));
    fs::write(&path, &bundle.source)
        .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", path.display())))?;

    Ok(path)
}
