// src/registry/importer.rs

//! Retrying bulk importer
//!
//! Replays a dependency-ordered sequence of bundles against a target
//! registry. Each bundle gets a bounded number of attempts with a fixed
//! delay in between. Failure handling is deliberately asymmetric:
//! a failed publish is specific to one bundle, so when its budget runs
//! out the bundle is dropped and the run continues; a failed namespace
//! check, namespace/family creation, or family lookup would fail
//! identically for every sibling bundle, so exhausting the budget there
//! aborts the whole run and the caller discards all accumulated
//! outcomes.

use crate::bundle::VersionedBundle;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::session::ImportSession;
use super::writer::{RegistryWriter, VersionLookup};

/// Default attempt budget per bundle
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Partition of a completed import run
///
/// `available` and `dropped` are disjoint and together cover exactly
/// the input sequence.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Refs now present on the target (published or already there)
    pub available: Vec<String>,
    /// Refs whose publish kept failing and were given up on
    pub dropped: Vec<String>,
}

/// Per-bundle verdict from a successful attempt loop
enum BundleOutcome {
    Available,
    Dropped,
}

/// How one attempt failed, deciding the retry-exhaustion policy
enum AttemptFailure {
    /// Publish failure: drop the bundle once the budget is exhausted
    Droppable(Error),
    /// Namespace/family/lookup failure: abort the run once exhausted
    Fatal(Error),
}

/// Bulk importer over any [`RegistryWriter`]
pub struct Importer<'a, W: RegistryWriter> {
    registry: &'a W,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<'a, W: RegistryWriter> Importer<'a, W> {
    pub fn new(registry: &'a W) -> Self {
        Self {
            registry,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Import bundles in the given order
    ///
    /// On a fatal error the partial partition is discarded; callers get
    /// either the full `ImportOutcome` or an error, never both.
    pub fn import(&self, bundles: &[VersionedBundle]) -> Result<ImportOutcome> {
        info!("Importing {} bundles", bundles.len());

        let mut session = ImportSession::new();
        let mut outcome = ImportOutcome::default();

        for bundle in bundles {
            info!("Examining {}", bundle.reference);

            match self.import_one(bundle, &mut session)? {
                BundleOutcome::Available => outcome.available.push(bundle.reference.clone()),
                BundleOutcome::Dropped => outcome.dropped.push(bundle.reference.clone()),
            }
        }

        info!(
            "Import completed: {} available, {} dropped",
            outcome.available.len(),
            outcome.dropped.len()
        );
        Ok(outcome)
    }

    /// Run the attempt loop for one bundle
    fn import_one(
        &self,
        bundle: &VersionedBundle,
        session: &mut ImportSession,
    ) -> Result<BundleOutcome> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                "Attempt {} of {} for {}",
                attempt, self.max_attempts, bundle.reference
            );

            let failure = match self.attempt(bundle, session) {
                Ok(outcome) => return Ok(outcome),
                Err(failure) => failure,
            };

            if attempt >= self.max_attempts {
                match failure {
                    AttemptFailure::Droppable(e) => {
                        warn!(
                            "Giving up on {} after {} attempts: {}; dropping it to continue",
                            bundle.reference, attempt, e
                        );
                        return Ok(BundleOutcome::Dropped);
                    }
                    AttemptFailure::Fatal(e) => {
                        return Err(Error::RegistryError(format!(
                            "Attempted import of {} {} time(s), but couldn't complete: {e}",
                            bundle.reference, attempt
                        )));
                    }
                }
            }

            let e = match &failure {
                AttemptFailure::Droppable(e) | AttemptFailure::Fatal(e) => e,
            };
            warn!(
                "Attempt {} for {} failed: {}, retrying...",
                attempt, bundle.reference, e
            );
            std::thread::sleep(self.retry_delay);
        }
    }

    /// One pass over namespace setup, family setup, and publish
    ///
    /// Session state survives across attempts, so setup steps that
    /// succeeded once are not repeated on retry.
    fn attempt(
        &self,
        bundle: &VersionedBundle,
        session: &mut ImportSession,
    ) -> std::result::Result<BundleOutcome, AttemptFailure> {
        let (namespace, shortname) = bundle.split_name();

        // Ensure the namespace exists; create it if needed
        if !session.has_checked_namespace(namespace) {
            let exists = self.registry.namespace_exists(namespace).map_err(|e| {
                AttemptFailure::Fatal(Error::RegistryError(format!(
                    "Error while querying namespace {namespace}: {e}"
                )))
            })?;

            if !exists {
                self.registry.create_namespace(namespace).map_err(|e| {
                    AttemptFailure::Fatal(Error::RegistryError(format!(
                        "Error while creating namespace {namespace}: {e}"
                    )))
                })?;
                info!("Created namespace {}", namespace);
            }

            session.mark_namespace_checked(namespace);
            debug!("Cached namespace {}", namespace);
        }

        // Ensure the bundle family is registered; register it if needed
        let family_id = match session.cached_family_id(&bundle.name) {
            Some(id) => id.to_string(),
            None => {
                let id = self.registry.find_family_id(&bundle.name).map_err(|e| {
                    AttemptFailure::Fatal(Error::RegistryError(format!(
                        "Error while querying family {}: {e}",
                        bundle.name
                    )))
                })?;

                let id = match id {
                    Some(id) => id,
                    None => {
                        let id = self
                            .registry
                            .create_family(namespace, shortname)
                            .map_err(|e| {
                                AttemptFailure::Fatal(Error::RegistryError(format!(
                                    "Error while registering family {}: {e}",
                                    bundle.name
                                )))
                            })?;
                        info!("Registered family {} with id {}", bundle.name, id);
                        id
                    }
                };

                session.cache_family_id(&bundle.name, &id);
                debug!("Cached family {} with id {}", bundle.name, id);
                id
            }
        };

        // Publish only if the exact version is not there yet
        let lookup = self.registry.version_exists(&bundle.reference).map_err(|e| {
            AttemptFailure::Fatal(Error::RegistryError(format!(
                "Error while querying version {}: {e}",
                bundle.reference
            )))
        })?;

        match lookup {
            VersionLookup::Exists => {
                info!("{} already present on target", bundle.reference);
                Ok(BundleOutcome::Available)
            }
            VersionLookup::NotFound => {
                info!(
                    "Publishing version {} of {} under family {}",
                    bundle.version, bundle.name, family_id
                );

                match self
                    .registry
                    .publish_version(&bundle.source, &family_id, &bundle.version)
                {
                    Ok(_) => {
                        info!("Imported {} without errors", bundle.reference);
                        Ok(BundleOutcome::Available)
                    }
                    Err(e) => Err(AttemptFailure::Droppable(Error::PublishError(format!(
                        "Unable to publish {}: {e}",
                        bundle.reference
                    )))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    /// In-memory registry recording every call for assertions
    #[derive(Default)]
    struct MockRegistry {
        namespaces: RefCell<HashSet<String>>,
        families: RefCell<HashMap<String, String>>,
        versions: RefCell<HashSet<String>>,
        publish_calls: RefCell<u32>,
        namespace_calls: RefCell<u32>,
        fail_all_publishes: bool,
        fail_all_namespace_checks: bool,
        fail_publish_for: Option<String>,
    }

    impl MockRegistry {
        fn with_version(self, reference: &str) -> Self {
            self.versions.borrow_mut().insert(reference.to_string());
            self
        }
    }

    impl RegistryWriter for MockRegistry {
        fn namespace_exists(&self, namespace: &str) -> crate::error::Result<bool> {
            *self.namespace_calls.borrow_mut() += 1;
            if self.fail_all_namespace_checks {
                return Err(Error::RegistryError("registry unreachable".into()));
            }
            Ok(self.namespaces.borrow().contains(namespace))
        }

        fn create_namespace(&self, namespace: &str) -> crate::error::Result<String> {
            self.namespaces.borrow_mut().insert(namespace.to_string());
            Ok(format!("ns-{namespace}"))
        }

        fn find_family_id(&self, name: &str) -> crate::error::Result<Option<String>> {
            Ok(self.families.borrow().get(name).cloned())
        }

        fn create_family(&self, namespace: &str, shortname: &str) -> crate::error::Result<String> {
            let name = format!("{namespace}/{shortname}");
            let id = format!("fam-{name}");
            self.families.borrow_mut().insert(name, id.clone());
            Ok(id)
        }

        fn version_exists(&self, reference: &str) -> crate::error::Result<VersionLookup> {
            if self.versions.borrow().contains(reference) {
                Ok(VersionLookup::Exists)
            } else {
                Ok(VersionLookup::NotFound)
            }
        }

        fn publish_version(
            &self,
            _source: &str,
            family_id: &str,
            version: &str,
        ) -> crate::error::Result<String> {
            *self.publish_calls.borrow_mut() += 1;

            if self.fail_all_publishes {
                return Err(Error::PublishError("config rejected".into()));
            }

            let name = family_id.strip_prefix("fam-").unwrap_or(family_id);
            let reference = format!("{name}@{version}");

            if self.fail_publish_for.as_deref() == Some(reference.as_str()) {
                return Err(Error::PublishError("config rejected".into()));
            }

            self.versions.borrow_mut().insert(reference.clone());
            Ok(reference)
        }
    }

    fn importer(registry: &MockRegistry) -> Importer<'_, MockRegistry> {
        Importer::new(registry).with_retry_delay(Duration::ZERO)
    }

    fn bundle(reference: &str) -> VersionedBundle {
        VersionedBundle::new(reference, "description: test\n")
    }

    #[test]
    fn test_import_publishes_and_partitions() {
        let registry = MockRegistry::default();
        let bundles = [bundle("acme/a@1.0.0"), bundle("acme/b@1.0.0")];

        let outcome = importer(&registry).import(&bundles).unwrap();

        assert_eq!(outcome.available, ["acme/a@1.0.0", "acme/b@1.0.0"]);
        assert!(outcome.dropped.is_empty());
        assert_eq!(*registry.publish_calls.borrow(), 2);
    }

    #[test]
    fn test_existing_version_skips_publish() {
        let registry = MockRegistry::default().with_version("acme/a@1.0.0");
        let bundles = [bundle("acme/a@1.0.0")];

        let outcome = importer(&registry).import(&bundles).unwrap();
        assert_eq!(outcome.available, ["acme/a@1.0.0"]);
        assert_eq!(*registry.publish_calls.borrow(), 0);

        // Second run over an already-populated target: still available,
        // still zero publish calls
        let outcome = importer(&registry).import(&bundles).unwrap();
        assert_eq!(outcome.available, ["acme/a@1.0.0"]);
        assert_eq!(*registry.publish_calls.borrow(), 0);
    }

    #[test]
    fn test_failing_publish_drops_after_budget_and_continues() {
        let registry = MockRegistry {
            fail_publish_for: Some("acme/bad@1.0.0".to_string()),
            ..Default::default()
        };
        let bundles = [bundle("acme/bad@1.0.0"), bundle("acme/good@1.0.0")];

        let outcome = importer(&registry).import(&bundles).unwrap();

        assert_eq!(outcome.dropped, ["acme/bad@1.0.0"]);
        assert_eq!(outcome.available, ["acme/good@1.0.0"]);
        // The bad bundle used the full budget, the good one published once
        assert_eq!(
            *registry.publish_calls.borrow(),
            DEFAULT_MAX_ATTEMPTS + 1
        );
    }

    #[test]
    fn test_namespace_failure_aborts_run() {
        let registry = MockRegistry {
            fail_all_namespace_checks: true,
            ..Default::default()
        };
        let bundles = [bundle("acme/a@1.0.0"), bundle("acme/b@1.0.0")];

        let err = importer(&registry).import(&bundles).unwrap_err();
        assert!(matches!(err, Error::RegistryError(_)));
        // Whole run aborted: the check was retried for the first bundle
        // only, never reaching the second
        assert_eq!(*registry.namespace_calls.borrow(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(*registry.publish_calls.borrow(), 0);
    }

    #[test]
    fn test_namespace_and_family_queried_once_per_run() {
        let registry = MockRegistry::default();
        let bundles = [
            bundle("acme/a@1.0.0"),
            bundle("acme/a@1.1.0"),
            bundle("acme/b@1.0.0"),
        ];

        importer(&registry).import(&bundles).unwrap();

        // One namespace across three bundles: a single existence check
        assert_eq!(*registry.namespace_calls.borrow(), 1);
    }

    #[test]
    fn test_partition_covers_input_exactly() {
        let registry = MockRegistry {
            fail_publish_for: Some("acme/bad@1.0.0".to_string()),
            ..Default::default()
        };
        let bundles = [
            bundle("acme/a@1.0.0"),
            bundle("acme/bad@1.0.0"),
            bundle("acme/z@1.0.0"),
        ];

        let outcome = importer(&registry).import(&bundles).unwrap();

        let mut all: Vec<String> = outcome
            .available
            .iter()
            .chain(outcome.dropped.iter())
            .cloned()
            .collect();
        all.sort();
        assert_eq!(all, ["acme/a@1.0.0", "acme/bad@1.0.0", "acme/z@1.0.0"]);
        assert!(outcome.available.iter().all(|r| !outcome.dropped.contains(r)));
    }

    #[test]
    fn test_all_publishes_failing_drops_everything() {
        let registry = MockRegistry {
            fail_all_publishes: true,
            ..Default::default()
        };
        let bundles = [bundle("acme/a@1.0.0"), bundle("acme/b@1.0.0")];

        let outcome = importer(&registry)
            .with_max_attempts(2)
            .import(&bundles)
            .unwrap();

        assert!(outcome.available.is_empty());
        assert_eq!(outcome.dropped, ["acme/a@1.0.0", "acme/b@1.0.0"]);
        // Two attempts per bundle
        assert_eq!(*registry.publish_calls.borrow(), 4);
    }
}
