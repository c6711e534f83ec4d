// src/manifest.rs

//! Bundle manifest parsing
//!
//! A manifest declares the bundles it depends on under a top-level
//! `bundles:` mapping. Each entry is either a dependency identifier
//! string (`ns/name@version`, possibly version-truncated or using the
//! `@volatile` alias) or an inlined bundle carrying its own `bundles:`
//! mapping, nested without bound. Parsing flattens every identifier
//! found anywhere in the tree into one set; nesting depth carries no
//! meaning downstream.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Top-level manifest shape: only the dependency block is interpreted
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    bundles: Option<DependencyBlock>,
}

/// A dependency-declarations block, keyed by local alias
type DependencyBlock = BTreeMap<String, DependencyEntry>;

/// One entry in a dependency block
///
/// Parsed once into this tagged shape before traversal; any value that
/// is neither an identifier string nor a nested mapping fails the whole
/// manifest parse.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyEntry {
    /// Direct dependency identifier as written in the manifest
    Identifier(String),
    /// Inlined bundle which may declare its own dependencies
    Inline(InlineBundle),
}

#[derive(Debug, Deserialize)]
struct InlineBundle {
    #[serde(default)]
    bundles: Option<DependencyBlock>,
}

/// Parse a manifest and flatten every declared dependency identifier
///
/// Returns the set of identifiers referenced anywhere in the nested
/// tree. A manifest without a `bundles:` block has no dependencies.
/// A malformed manifest is a `ParseError`; the caller marks the bundle
/// illegible and keeps it out of the dependency graph entirely.
pub fn dependency_identifiers(source: &str) -> Result<BTreeSet<String>> {
    // An empty document is a manifest with no dependencies, not a
    // malformed one
    if source.trim().is_empty() {
        return Ok(BTreeSet::new());
    }

    let manifest: Manifest = serde_yaml::from_str(source)
        .map_err(|e| Error::ParseError(format!("Malformed manifest: {e}")))?;

    let mut identifiers = BTreeSet::new();

    let mut queue: VecDeque<DependencyBlock> = VecDeque::new();
    if let Some(block) = manifest.bundles {
        queue.push_back(block);
    }

    while let Some(block) = queue.pop_front() {
        for entry in block.into_values() {
            match entry {
                DependencyEntry::Identifier(identifier) => {
                    identifiers.insert(identifier);
                }
                DependencyEntry::Inline(inline) => {
                    if let Some(nested) = inline.bundles {
                        queue.push_back(nested);
                    }
                }
            }
        }
    }

    Ok(identifiers)
}
