use reseqr_domain::{ApplySummary, SCHEMA_VERSION};
use reseqr_services::Report;
use std::path::Path;

pub fn run_apply(
    config: Option<&Path>,
    project: Option<&str>,
    batch: &str,
    format: &str,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "apply_args", batch = %batch, format = %format);
    let cfg = super::load_config(config, project)?;

    let report_path = reseqr_services::report_path(&cfg, batch);
    let mut report = if format == "json" {
        Report::silent(report_path)
    } else {
        Report::new(report_path)
    };
    report.push(format!(
        "Project: \"{}\" located at {}",
        cfg.project_name,
        cfg.project_path.display()
    ));

    let data = super::validate_with_report(&cfg, batch, &mut report)?;
    if data.reconciliation.is_fatal() {
        super::abort_fatal(&mut report);
    }

    let plan = reseqr_services::plan_batch(&data, &cfg);
    // the undo script must exist before the first file moves
    reseqr_services::write_rename_scripts(&plan, &cfg, batch, &mut report)?;

    let total = plan.len();
    let root = reseqr_services::batch_root(&cfg, batch);
    let applied = reseqr_services::apply_plan(&plan, &root, &mut report, |done, total, path| {
        tracing::info!(event = "renamed", done, total, path = %path.display());
    });

    match applied {
        Ok(renamed) => {
            report.push(format!("Renamed {renamed} files"));
            report.push("Processing completed");
            report.flush()?;
            if format == "json" {
                let msg = ApplySummary {
                    schema_version: SCHEMA_VERSION,
                    batch: batch.to_string(),
                    renamed,
                    total,
                };
                serde_json::to_writer(std::io::stdout().lock(), &msg)?;
                println!();
            } else if use_color {
                use owo_colors::OwoColorize;
                println!("{} renamed {renamed} files in batch {batch}", "✔".green());
            } else {
                println!("✔ renamed {renamed} files in batch {batch}");
            }
            Ok(())
        }
        Err(err) => {
            // completed renames stay recorded; the undo script covers recovery
            report.push(format!("fatal: {err:#}"));
            let _ = report.flush();
            Err(err)
        }
    }
}
