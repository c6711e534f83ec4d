// src/resolver/graph.rs

//! Resolution graph data structures
//!
//! Holds the forward map (bundle ref -> identifiers still unmet) and
//! reverse map (identifier -> dependent refs) for one resolution call.
//! The graph is constructed fresh per call and owned by it; nothing is
//! shared across resolutions.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The literal version that floats to whatever satisfies it
const VOLATILE_VERSION: &str = "volatile";

/// Mutable dependency state for a single resolution run
///
/// Ordered maps keep frontier selection and diagnostics lexicographic,
/// so a run is deterministic regardless of input order.
#[derive(Debug, Default)]
pub struct ResolutionGraph {
    /// Bundle ref -> dependency identifiers not yet satisfied
    forward: BTreeMap<String, BTreeSet<String>>,
    /// Dependency identifier (as written) -> refs that declared it
    reverse: HashMap<String, BTreeSet<String>>,
}

impl ResolutionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bundle and the identifiers it declares
    ///
    /// A bundle with no dependencies is immediately ready.
    pub fn add_bundle(&mut self, reference: &str, dependencies: BTreeSet<String>) {
        for identifier in &dependencies {
            self.reverse
                .entry(identifier.clone())
                .or_default()
                .insert(reference.to_string());
        }

        self.forward.insert(reference.to_string(), dependencies);
    }

    /// Refs whose unmet-identifier set is empty, in lexicographic order
    pub fn ready_frontier(&self) -> Vec<String> {
        self.forward
            .iter()
            .filter(|(_, unmet)| unmet.is_empty())
            .map(|(reference, _)| reference.clone())
            .collect()
    }

    /// Number of refs still waiting on unmet identifiers
    pub fn remaining(&self) -> usize {
        self.forward.len()
    }

    /// Remove a resolved ref and satisfy every textual form a manifest
    /// might have used to name it
    ///
    /// Declarations may under-specify the version, so resolving
    /// `ns/pkg@1.2.3` also satisfies `ns/pkg@1.2`, `ns/pkg@1`, and
    /// `ns/pkg@volatile` -- but never the bare `ns/pkg`.
    pub fn remove_resolved(&mut self, reference: &str) {
        self.forward.remove(reference);

        for form in satisfied_forms(reference) {
            if let Some(dependents) = self.reverse.remove(&form) {
                for dependent in dependents {
                    if let Some(unmet) = self.forward.get_mut(&dependent) {
                        unmet.remove(&form);
                    }
                }
            }
        }
    }

    /// Consume the graph, yielding the unresolved residue
    ///
    /// Every remaining ref maps to the identifiers it could never
    /// clear: cyclic peers, missing, or illegible dependencies.
    pub fn into_unresolved(self) -> BTreeMap<String, Vec<String>> {
        self.forward
            .into_iter()
            .map(|(reference, unmet)| (reference, unmet.into_iter().collect()))
            .collect()
    }
}

/// Every identifier form satisfied by resolving `reference`
///
/// The exact ref, each version-truncated prefix that still ends in a
/// numeric component, and the `@volatile` alias.
fn satisfied_forms(reference: &str) -> Vec<String> {
    let mut forms = vec![reference.to_string()];

    let mut current = reference.to_string();
    while let Some(truncated) = trim_trailing_version_component(&current) {
        if !truncated.ends_with(|c: char| c.is_ascii_digit()) {
            break;
        }
        forms.push(truncated.clone());
        current = truncated;
    }

    if let Some((name, version)) = reference.rsplit_once('@') {
        if version != VOLATILE_VERSION {
            forms.push(format!("{name}@{VOLATILE_VERSION}"));
        }
    }

    forms
}

/// Strip the trailing numeric version component and its leading dot
///
/// `ns/pkg@1.2.3` -> `ns/pkg@1.2`; returns None when the ref has no
/// trailing digits left to strip.
fn trim_trailing_version_component(reference: &str) -> Option<String> {
    let without_digits = reference.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == reference.len() {
        return None;
    }

    Some(
        without_digits
            .strip_suffix('.')
            .unwrap_or(without_digits)
            .to_string(),
    )
}
