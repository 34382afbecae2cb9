//! CLI output formatting for checks, builds, and batches.
//!
//! # Information-First Display
//!
//! Output leads with semantic identity — collection names, logical asset
//! names, package identifiers — and shows filesystem paths as secondary
//! context on indented `Source:` lines. The listing doubles as a preview of
//! the manifest: the names printed are exactly the `AddressableNames` a
//! build would produce.
//!
//! ```text
//! Props by Acme (3 assets)
//!     001 Chairs_Chair
//!         Source: Models/Chairs/Chair.fbx
//!     002 Tables_Chair
//!         Source: Models/Tables/Chair.fbx
//!     003 Sofa
//!         Source: Models/Sofa.fbx
//!     2 references filtered out
//! ```
//!
//! # Architecture
//!
//! Every surface comes in two layers: a pure `format_*` function returning
//! lines, asserted on directly in tests, and a thin `print_*` wrapper that
//! sends them to stdout.

use crate::batch::{BatchOutcome, BatchReport};
use crate::build::BuildReport;
use crate::types::{AssetCollection, AssetRef};

/// 1-based position, zero-padded to three digits.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Four spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Listing of a validated collection: logical names with their sources.
pub fn format_check_output(
    collection: &AssetCollection,
    assets: &[AssetRef],
    names: &[String],
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} by {} ({} asset{})",
        collection.name,
        collection.author,
        assets.len(),
        if assets.len() == 1 { "" } else { "s" }
    )];
    for (i, (asset, name)) in assets.iter().zip(names).enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), name));
        lines.push(format!("{}Source: {}", indent(2), asset.source));
    }
    let dropped = collection.assets.len().saturating_sub(assets.len());
    if dropped > 0 {
        lines.push(format!(
            "{}{} reference{} filtered out",
            indent(1),
            dropped,
            if dropped == 1 { "" } else { "s" }
        ));
    }
    lines
}

/// Summary of one finished build.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![
        format!("{} → {}", report.collection, report.target.display()),
        format!("{}Identifier: {}", indent(1), report.identifier),
    ];
    for (i, name) in report.addressable_names.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), name));
    }
    lines
}

/// Per-collection outcomes of a batch, then a one-line total.
pub fn format_batch_report(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in &report.outcomes {
        match outcome {
            BatchOutcome::Built(built) => {
                lines.push(format!("{} → {}", built.collection, built.target.display()));
            }
            BatchOutcome::Failed { collection, error } => {
                lines.push(format!("{collection} failed: {error}"));
            }
            BatchOutcome::Skipped { collection } => {
                lines.push(format!("{collection} skipped"));
            }
        }
    }
    lines.push(format!(
        "Built {} of {} collections",
        report.built().len(),
        report.outcomes.len()
    ));
    lines
}

pub fn print_check_output(collection: &AssetCollection, assets: &[AssetRef], names: &[String]) {
    for line in format_check_output(collection, assets, names) {
        println!("{line}");
    }
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{line}");
    }
}

pub fn print_batch_report(report: &BatchReport) {
    for line in format_batch_report(report) {
        println!("{line}");
    }
}
