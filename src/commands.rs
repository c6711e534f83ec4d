// src/commands.rs
//! Command handlers for the caravan CLI

use anyhow::{Context, Result};
use caravan::bundle::{self, VersionedBundle};
use caravan::registry::{HttpRegistry, ImportOutcome, Importer, RegistryReader, RegistryWriter};
use caravan::resolver::{self, ResolutionResult};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// File name for the ordered ref list written by resolve
const ORDER_FILE: &str = "resolved-order.txt";
/// File name for the illegible-refs diagnostic
const ILLEGIBLE_FILE: &str = "illegible.txt";
/// File name for the unresolved-dependencies diagnostic
const UNRESOLVED_FILE: &str = "unresolved.json";

/// Render the unresolved map as one `ref: id, id` line per bundle
fn format_unresolved(unresolved: &BTreeMap<String, Vec<String>>) -> String {
    unresolved
        .iter()
        .map(|(reference, unmet)| format!("{reference}: {}", unmet.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Persist the ordered list and diagnostics from a resolution run
fn write_resolution(result: &ResolutionResult, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("could not create {}", out_dir.display()))?;

    let order: Vec<&str> = result
        .ordered
        .iter()
        .map(|b| b.reference.as_str())
        .collect();
    fs::write(out_dir.join(ORDER_FILE), format!("{}\n", order.join("\n")))
        .context("could not write ordered list")?;

    fs::write(
        out_dir.join(ILLEGIBLE_FILE),
        format!("{}\n", result.illegible.join("\n")),
    )
    .context("could not write illegible list")?;

    let unresolved_json = serde_json::to_string_pretty(&result.unresolved)
        .context("could not serialize unresolved map")?;
    fs::write(
        out_dir.join(UNRESOLVED_FILE),
        format!("{unresolved_json}\n"),
    )
    .context("could not write unresolved map")?;

    Ok(())
}

fn report_outcome(outcome: &ImportOutcome) {
    println!("Available on target: {}", outcome.available.len());
    for reference in &outcome.available {
        println!("  {reference}");
    }

    if !outcome.dropped.is_empty() {
        println!("Dropped during import: {}", outcome.dropped.len());
        for reference in &outcome.dropped {
            println!("  {reference}");
        }
    }
}

/// Download every bundle from the source registry into a directory
pub fn cmd_collect(
    src_host: &str,
    src_token: &str,
    out_dir: &str,
    include_uncertified: bool,
    must_include: &[String],
) -> Result<()> {
    let source = HttpRegistry::new(src_host, src_token)?;
    let bundles = source
        .list_bundles(include_uncertified, must_include)
        .context("could not list bundles from source")?;

    let out_dir = Path::new(out_dir);
    for bundle in &bundles {
        bundle::save_bundle(bundle, out_dir)?;
    }

    println!("Collected {} bundles into {}", bundles.len(), out_dir.display());
    Ok(())
}

/// Resolve a dependency-first order for a directory of bundle sources
pub fn cmd_resolve(src_dir: &str, out_dir: &str) -> Result<()> {
    let bundles = bundle::load_bundles_in_dir(Path::new(src_dir))?;
    let result = resolver::resolve(bundles);

    write_resolution(&result, Path::new(out_dir))?;

    println!(
        "Resolved {} bundles ({} illegible, {} unresolved); order written to {}",
        result.ordered.len(),
        result.illegible.len(),
        result.unresolved.len(),
        Path::new(out_dir).join(ORDER_FILE).display()
    );

    if !result.unresolved.is_empty() {
        println!("Unresolved dependencies:\n{}", format_unresolved(&result.unresolved));
    }

    Ok(())
}

/// Replay a previously resolved list against a target registry
pub fn cmd_import(
    list: &str,
    src_dir: &str,
    dst_host: &str,
    dst_token: &str,
    max_attempts: u32,
) -> Result<()> {
    let bundles = bundle::load_listed_bundles(Path::new(list), Path::new(src_dir))?;

    let target = HttpRegistry::new(dst_host, dst_token)?;
    let outcome = Importer::new(&target)
        .with_max_attempts(max_attempts)
        .import(&bundles)
        .context("import failed")?;

    report_outcome(&outcome);
    Ok(())
}

/// Drop bundles whose refs are already present on the destination
fn filter_present(
    ordered: Vec<VersionedBundle>,
    present: &[VersionedBundle],
) -> Vec<VersionedBundle> {
    let present_refs: HashSet<&str> = present.iter().map(|b| b.reference.as_str()).collect();

    ordered
        .into_iter()
        .filter(|b| !present_refs.contains(b.reference.as_str()))
        .collect()
}

/// Diagnostics retained from a sync run after the ordered list is spent
struct SyncReport {
    illegible: Vec<String>,
    unresolved: BTreeMap<String, Vec<String>>,
    outcome: ImportOutcome,
}

/// Collect, resolve, filter, and import between two registries
///
/// Both sides are listed with the same certification flag, so a
/// certified-only sync compares like against like when filtering refs
/// already present on the destination.
fn run_sync<S, T>(
    source: &S,
    target: &T,
    include_uncertified: bool,
    must_include: &[String],
) -> Result<SyncReport>
where
    S: RegistryReader,
    T: RegistryReader + RegistryWriter,
{
    let src_bundles = source
        .list_bundles(include_uncertified, must_include)
        .context("could not list bundles from source")?;

    let dst_bundles = target
        .list_bundles(include_uncertified, &[])
        .context("could not list bundles on destination")?;

    let result = resolver::resolve(src_bundles);

    // Skip refs the destination already has; the importer would only
    // re-verify them one by one
    let to_import = filter_present(result.ordered, &dst_bundles);
    info!("Importing {} bundles not yet on destination", to_import.len());

    let outcome = Importer::new(target)
        .import(&to_import)
        .context("import failed")?;

    Ok(SyncReport {
        illegible: result.illegible,
        unresolved: result.unresolved,
        outcome,
    })
}

/// Collect from source, resolve, and import into the target in one run
pub fn cmd_sync(
    src_host: &str,
    src_token: &str,
    dst_host: &str,
    dst_token: &str,
    include_uncertified: bool,
    must_include: &[String],
) -> Result<()> {
    let source = HttpRegistry::new(src_host, src_token)?;
    let target = HttpRegistry::new(dst_host, dst_token)?;

    let report = run_sync(&source, &target, include_uncertified, must_include)?;

    if !report.illegible.is_empty() {
        println!("Bundles with unparsable manifests:\n{}", report.illegible.join("\n"));
    }
    if !report.unresolved.is_empty() {
        println!("Bundles with unresolvable dependencies:\n{}", format_unresolved(&report.unresolved));
    }
    report_outcome(&report.outcome);

    println!("Sync completed");
    Ok(())
}
