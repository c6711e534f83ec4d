// src/resolver/mod.rs

//! Dependency-first ordering of bundles
//!
//! Parses every bundle manifest, builds a resolution graph, and peels
//! off the ready frontier until a fixpoint. Cycles and missing
//! dependencies are reported as data, never as errors: bundles that can
//! never clear their unmet identifiers end up in the unresolved map,
//! and bundles whose manifests cannot be parsed are listed illegible.

mod graph;

pub use graph::ResolutionGraph;

use crate::bundle::VersionedBundle;
use crate::manifest;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Outcome of one resolution run, read-only once produced
#[derive(Debug)]
pub struct ResolutionResult {
    /// Bundles in dependency-first order: every bundle appears after
    /// everything that satisfies one of its declared identifiers
    pub ordered: Vec<VersionedBundle>,
    /// Refs whose manifests could not be parsed; disjoint from
    /// `ordered` and absent from `unresolved`
    pub illegible: Vec<String>,
    /// Refs that never became ready, each with the identifiers it
    /// could not clear (cyclic, missing, or illegible dependencies)
    pub unresolved: BTreeMap<String, Vec<String>>,
}

/// Resolve a dependency-first ordering for the given bundles
///
/// The input is expected to be deduplicated by ref. All graph state is
/// local to this call; two runs over the same input produce identical
/// output.
pub fn resolve(bundles: Vec<VersionedBundle>) -> ResolutionResult {
    let mut graph = ResolutionGraph::new();
    let mut illegible = Vec::new();
    let mut by_ref: HashMap<String, VersionedBundle> = HashMap::with_capacity(bundles.len());

    for bundle in bundles {
        debug!("Initializing {}", bundle.reference);

        match manifest::dependency_identifiers(&bundle.source) {
            Ok(dependencies) => graph.add_bundle(&bundle.reference, dependencies),
            Err(e) => {
                warn!("Ignoring bundle {}: {}", bundle.reference, e);
                illegible.push(bundle.reference.clone());
            }
        }

        by_ref.insert(bundle.reference.clone(), bundle);
    }

    let mut ordered = Vec::new();

    loop {
        let frontier = graph.ready_frontier();
        if frontier.is_empty() {
            break;
        }

        for reference in &frontier {
            if let Some(bundle) = by_ref.remove(reference) {
                ordered.push(bundle);
            }
            graph.remove_resolved(reference);
        }

        info!(
            "Resolver pass: {} newly resolved, {} resolved in total, {} remaining",
            frontier.len(),
            ordered.len(),
            graph.remaining()
        );
    }

    info!(
        "Resolver done: {} resolved, {} unresolvable, {} illegible",
        ordered.len(),
        graph.remaining(),
        illegible.len()
    );

    ResolutionResult {
        ordered,
        illegible,
        unresolved: graph.into_unresolved(),
    }
}
