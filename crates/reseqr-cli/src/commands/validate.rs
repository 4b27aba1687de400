use reseqr_domain::{FindingMsg, SCHEMA_VERSION};
use reseqr_services::Report;
use std::path::Path;

pub fn run_validate(
    config: Option<&Path>,
    project: Option<&str>,
    batch: &str,
    format: &str,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "validate_args", batch = %batch, format = %format);
    let cfg = super::load_config(config, project)?;

    // json mode keeps stdout clean for the serialized findings
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

    if format == "json" {
        let items: Vec<FindingMsg> = data
            .reconciliation
            .findings
            .iter()
            .map(|f| FindingMsg {
                schema_version: SCHEMA_VERSION,
                kind: f.kind.as_str().to_string(),
                group: f.group.clone(),
                files: f.files.clone(),
                message: f.message.clone(),
            })
            .collect();
        serde_json::to_writer(std::io::stdout().lock(), &items)?;
        println!();
    }

    if data.reconciliation.is_fatal() {
        super::abort_fatal(&mut report);
    }

    report.push("Processing completed");
    report.flush()?;

    if format != "json" {
        if use_color {
            use owo_colors::OwoColorize;
            println!("{} batch {batch} validated", "✔".green());
        } else {
            println!("✔ batch {batch} validated");
        }
    }
    Ok(())
}
