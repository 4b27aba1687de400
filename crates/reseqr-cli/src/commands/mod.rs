pub mod apply;
pub mod script;
pub mod validate;

use reseqr_config::ProjectConfig;
use reseqr_services::{BatchData, Report};
use std::path::Path;

pub(crate) fn load_config(
    config: Option<&Path>,
    project: Option<&str>,
) -> color_eyre::Result<ProjectConfig> {
    let cfg = reseqr_config::load_project(config, project)?;
    tracing::info!(event = "project_resolved", project = %cfg.project, path = %cfg.project_path.display());
    Ok(cfg)
}

/// Run validation; a hard error (scan or parse) is recorded in the report
/// and flushed best-effort so the failed run still leaves an artifact.
pub(crate) fn validate_with_report(
    cfg: &ProjectConfig,
    batch: &str,
    report: &mut Report,
) -> color_eyre::Result<BatchData> {
    match reseqr_services::validate_batch(cfg, batch, report) {
        Ok(data) => Ok(data),
        Err(err) => {
            report.push(format!("fatal: {err:#}"));
            let _ = report.flush();
            Err(err)
        }
    }
}

/// Flush the report and terminate with the fatal exit code.
pub(crate) fn abort_fatal(report: &mut Report) -> ! {
    report.push(" -- quitting reseqr");
    let _ = report.flush();
    std::process::exit(2);
}
