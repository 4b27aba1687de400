use reseqr_domain::{PlanMsg, RenameOpMsg, SCHEMA_VERSION};
use reseqr_services::Report;
use std::path::Path;

pub fn run_script(
    config: Option<&Path>,
    project: Option<&str>,
    batch: &str,
    format: &str,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "script_args", batch = %batch, format = %format);
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
    reseqr_services::write_rename_scripts(&plan, &cfg, batch, &mut report)?;

    report.push("Processing completed");
    report.flush()?;

    if format == "json" {
        let msg = PlanMsg {
            schema_version: SCHEMA_VERSION,
            batch: batch.to_string(),
            operations: plan
                .ops
                .iter()
                .map(|op| RenameOpMsg {
                    source: op.source.display().to_string(),
                    destination: op.destination.display().to_string(),
                })
                .collect(),
        };
        serde_json::to_writer(std::io::stdout().lock(), &msg)?;
        println!();
    } else if use_color {
        use owo_colors::OwoColorize;
        println!(
            "{} renaming and undo scripts written for batch {batch}",
            "✔".green()
        );
    } else {
        println!("✔ renaming and undo scripts written for batch {batch}");
    }
    Ok(())
}
