// tests/pipeline.rs

//! End-to-end pipeline tests: collect from disk, resolve, import into
//! an in-memory registry.

use caravan::bundle::{self, VersionedBundle};
use caravan::registry::{Importer, RegistryWriter, VersionLookup};
use caravan::resolver;
use caravan::{Error, Result};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Minimal in-memory registry for driving the importer
#[derive(Default)]
struct MemoryRegistry {
    namespaces: RefCell<HashSet<String>>,
    families: RefCell<HashMap<String, String>>,
    versions: RefCell<Vec<String>>,
}

impl MemoryRegistry {
    fn published(&self) -> Vec<String> {
        self.versions.borrow().clone()
    }
}

impl RegistryWriter for MemoryRegistry {
    fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        Ok(self.namespaces.borrow().contains(namespace))
    }

    fn create_namespace(&self, namespace: &str) -> Result<String> {
        self.namespaces.borrow_mut().insert(namespace.to_string());
        Ok(format!("ns-{namespace}"))
    }

    fn find_family_id(&self, name: &str) -> Result<Option<String>> {
        Ok(self.families.borrow().get(name).cloned())
    }

    fn create_family(&self, namespace: &str, shortname: &str) -> Result<String> {
        let name = format!("{namespace}/{shortname}");
        let id = format!("fam-{name}");
        self.families.borrow_mut().insert(name, id.clone());
        Ok(id)
    }

    fn version_exists(&self, reference: &str) -> Result<VersionLookup> {
        if self.versions.borrow().iter().any(|r| r == reference) {
            Ok(VersionLookup::Exists)
        } else {
            Ok(VersionLookup::NotFound)
        }
    }

    fn publish_version(&self, source: &str, family_id: &str, version: &str) -> Result<String> {
        if source.contains("reject-me") {
            return Err(Error::PublishError("unsupported syntax".into()));
        }

        let name = family_id.strip_prefix("fam-").unwrap_or(family_id);
        let reference = format!("{name}@{version}");
        self.versions.borrow_mut().push(reference.clone());
        Ok(reference)
    }
}

fn importer(registry: &MemoryRegistry) -> Importer<'_, MemoryRegistry> {
    Importer::new(registry).with_retry_delay(Duration::ZERO)
}

#[test]
fn test_resolve_then_import_respects_dependency_order() {
    let bundles = vec![
        VersionedBundle::new(
            "acme/app@1.0.0",
            "bundles:\n  lib: acme/lib@2.1\n  base: acme/base@volatile\n",
        ),
        VersionedBundle::new("acme/lib@2.1.5", "bundles:\n  base: acme/base@1.0.0\n"),
        VersionedBundle::new("acme/base@1.0.0", "description: leaf\n"),
    ];

    let result = resolver::resolve(bundles);
    assert!(result.unresolved.is_empty());
    assert!(result.illegible.is_empty());

    let registry = MemoryRegistry::default();
    let outcome = importer(&registry).import(&result.ordered).unwrap();

    assert_eq!(outcome.available.len(), 3);
    assert!(outcome.dropped.is_empty());

    // Publish order on the target matches dependency order
    assert_eq!(
        registry.published(),
        ["acme/base@1.0.0", "acme/lib@2.1.5", "acme/app@1.0.0"]
    );
}

#[test]
fn test_illegible_and_cyclic_bundles_never_reach_the_target() {
    let bundles = vec![
        VersionedBundle::new("acme/ok@1.0.0", "description: fine\n"),
        VersionedBundle::new("acme/broken@1.0.0", "{ definitely not yaml"),
        VersionedBundle::new("acme/a@1.0.0", "bundles:\n  b: acme/b@1.0.0\n"),
        VersionedBundle::new("acme/b@1.0.0", "bundles:\n  a: acme/a@1.0.0\n"),
    ];

    let result = resolver::resolve(bundles);

    assert_eq!(result.illegible, ["acme/broken@1.0.0"]);
    assert_eq!(result.unresolved.len(), 2);
    assert_eq!(result.ordered.len(), 1);

    let registry = MemoryRegistry::default();
    let outcome = importer(&registry).import(&result.ordered).unwrap();

    assert_eq!(outcome.available, ["acme/ok@1.0.0"]);
    assert_eq!(registry.published(), ["acme/ok@1.0.0"]);
}

#[test]
fn test_rejected_bundle_is_dropped_but_run_finishes() {
    let bundles = vec![
        VersionedBundle::new("acme/good@1.0.0", "description: fine\n"),
        VersionedBundle::new("acme/bad@1.0.0", "description: reject-me\n"),
        VersionedBundle::new("acme/late@1.0.0", "description: fine too\n"),
    ];

    let result = resolver::resolve(bundles);
    let registry = MemoryRegistry::default();
    let outcome = importer(&registry).import(&result.ordered).unwrap();

    assert_eq!(outcome.dropped, ["acme/bad@1.0.0"]);
    assert_eq!(outcome.available, ["acme/good@1.0.0", "acme/late@1.0.0"]);
}

#[test]
fn test_round_trip_through_directory_persistence() {
    let dir = tempfile::tempdir().unwrap();

    let original = vec![
        VersionedBundle::new("acme/app@1.0.0", "bundles:\n  base: acme/base@1\n"),
        VersionedBundle::new("acme/base@1.2.3", "description: leaf\n"),
    ];
    for b in &original {
        bundle::save_bundle(b, dir.path()).unwrap();
    }

    let loaded = bundle::load_bundles_in_dir(dir.path()).unwrap();
    let result = resolver::resolve(loaded);

    assert!(result.unresolved.is_empty());
    let refs: Vec<_> = result.ordered.iter().map(|b| b.reference.as_str()).collect();
    assert_eq!(refs, ["acme/base@1.2.3", "acme/app@1.0.0"]);
}
