//! High-level orchestration over the parser, scanner, reconciler and
//! planner crates. Intentionally thin: exposes the stable entrypoints used
//! by the CLI.

pub mod report;
mod util;

pub use report::Report;
pub use reseqr_core::Result;

use color_eyre::eyre::WrapErr;
use reseqr_config::ProjectConfig;
use reseqr_core::{DirectoryGroup, MetadataGroup};
use reseqr_parsers_mets::{read_batch_mets, FileIdPattern};
use reseqr_plan::{build_plan, RenamePlan};
use reseqr_validate::{reconcile, ReconcileOptions, Reconciliation};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Batch subdirectory reserved for metadata, never treated as a group.
pub const RESERVED_METS_DIR: &str = "mets";

pub fn batch_root(cfg: &ProjectConfig, batch: &str) -> PathBuf {
    cfg.project_path.join(batch)
}

pub fn mets_root(cfg: &ProjectConfig, batch: &str) -> PathBuf {
    cfg.mets_path.join(batch).join(RESERVED_METS_DIR)
}

pub fn report_path(cfg: &ProjectConfig, batch: &str) -> PathBuf {
    batch_root(cfg, batch).join(format!("{batch}-report.txt"))
}

pub fn rename_script_path(cfg: &ProjectConfig, batch: &str) -> PathBuf {
    batch_root(cfg, batch).join(format!("{batch}-rename.sh"))
}

pub fn undo_script_path(cfg: &ProjectConfig, batch: &str) -> PathBuf {
    batch_root(cfg, batch).join(format!("{batch}-undo.sh"))
}

/// Everything one validation pass produces: both sides of the comparison
/// and the reconciliation outcome.
#[derive(Debug)]
pub struct BatchData {
    pub directories: BTreeMap<String, DirectoryGroup>,
    pub metadata: BTreeMap<String, MetadataGroup>,
    pub reconciliation: Reconciliation,
}

/// Scan the batch, read its METS documents and reconcile the two, pushing
/// every summary line and finding into `report`. Fatality of the outcome is
/// left on the returned `Reconciliation`; parse and scan failures are hard
/// errors.
pub fn validate_batch(
    cfg: &ProjectConfig,
    batch: &str,
    report: &mut Report,
) -> Result<BatchData> {
    let root = batch_root(cfg, batch);
    report.push(format!("Processing batch \"{batch}\""));

    let directories = reseqr_scan::scan_batch(&root, RESERVED_METS_DIR, &cfg.local_renaming_prefix)?;
    report.push("Batch directory summary:");
    for (key, dir) in &directories {
        report.push(format!("    {} with {} files", key, dir.files.len()));
    }

    let pattern = FileIdPattern::new(&cfg.imaging_services_prefix);
    let (metadata, summaries) = read_batch_mets(&mets_root(cfg, batch), &pattern, &cfg.extension)?;
    report.push("METS files summary:");
    for s in &summaries {
        report.push(format!(
            "    {} with group key \"{}\" listing {} file items",
            s.document, s.group_key, s.items
        ));
    }

    report.push("Validation:");
    let reconciliation = reconcile(
        &directories,
        &metadata,
        &ReconcileOptions {
            unlisted_threshold: cfg.unlisted_files_threshold,
            strict: cfg.strict_mode,
        },
    );
    for finding in &reconciliation.findings {
        report.push(format!("    [{}] {}", finding.kind.as_str(), finding.message));
    }

    Ok(BatchData {
        directories,
        metadata,
        reconciliation,
    })
}

/// Forward plan for a validated batch. Unlisted files never appear here:
/// the metadata is the only ordering source.
pub fn plan_batch(data: &BatchData, cfg: &ProjectConfig) -> RenamePlan {
    build_plan(&data.metadata, &cfg.local_renaming_prefix, &cfg.extension)
}

fn render_script(plan: &RenamePlan) -> String {
    let mut out = String::from("#!/bin/sh\nset -e\n\n");
    for op in &plan.ops {
        out.push_str(&format!(
            "mv '{}' '{}'\n",
            op.source.display(),
            op.destination.display()
        ));
    }
    out
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Emit the forward renaming script and its undo next to the batch files.
/// Existing scripts are overwritten, re-emission is assumed intentional.
pub fn write_rename_scripts(
    plan: &RenamePlan,
    cfg: &ProjectConfig,
    batch: &str,
    report: &mut Report,
) -> Result<()> {
    let forward = rename_script_path(cfg, batch);
    let undo = undo_script_path(cfg, batch);

    util::write_atomic(&forward, render_script(plan).as_bytes())?;
    make_executable(&forward)?;
    util::write_atomic(&undo, render_script(&plan.inverse()).as_bytes())?;
    make_executable(&undo)?;

    report.push(format!(
        "Wrote renaming script {} with {} operations",
        forward.display(),
        plan.len()
    ));
    report.push(format!(
        "Wrote undo script {} with {} operations",
        undo.display(),
        plan.len()
    ));
    Ok(())
}

/// Execute the plan directly against the filesystem.
///
/// Operations run in plan order; every completed rename is recorded in the
/// report as it happens, so a mid-run failure leaves an accurate partial
/// log. The first I/O error aborts further renaming.
pub fn apply_plan(
    plan: &RenamePlan,
    batch_root: &Path,
    report: &mut Report,
    mut progress: impl FnMut(usize, usize, &Path),
) -> Result<usize> {
    let total = plan.len();
    for (idx, op) in plan.ops.iter().enumerate() {
        let from = batch_root.join(&op.source);
        let to = batch_root.join(&op.destination);
        std::fs::rename(&from, &to)
            .wrap_err_with(|| format!("renaming {} -> {}", from.display(), to.display()))?;
        report.push(format!(
            "renamed {} -> {}",
            op.source.display(),
            op.destination.display()
        ));
        progress(idx + 1, total, &to);
    }
    Ok(total)
}
