mod commands;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(
    name = "reseqr",
    version,
    about = "Image file resequencer: reconciles digitization batches against METS metadata and renames files into declared order"
)]
struct Cli {
    /// Configuration file path (defaults to ./reseqr.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project name from the configuration file (defaults to `default_project`)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a batch against its METS documents without touching any file
    Validate {
        /// Batch directory name to process
        #[arg(short, long)]
        batch: String,
        /// Output format: text or json
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Validate a batch, then write the renaming script and its undo
    Script {
        #[arg(short, long)]
        batch: String,
        /// Output format: text or json
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Validate a batch, write the undo script and rename files directly
    Apply {
        #[arg(short, long)]
        batch: String,
        /// Output format: text or json
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = rolling::daily("logs", "reseqr.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing();

    let cli = Cli::parse();

    let use_color = {
        use std::io::IsTerminal;
        !cli.no_color
            && std::io::stdout().is_terminal()
            && std::env::var_os("NO_COLOR").is_none()
    };

    let result = match cli.cmd {
        Commands::Validate { ref batch, ref format } => commands::validate::run_validate(
            cli.config.as_deref(),
            cli.project.as_deref(),
            batch,
            format,
            use_color,
        ),
        Commands::Script { ref batch, ref format } => commands::script::run_script(
            cli.config.as_deref(),
            cli.project.as_deref(),
            batch,
            format,
            use_color,
        ),
        Commands::Apply { ref batch, ref format } => commands::apply::run_apply(
            cli.config.as_deref(),
            cli.project.as_deref(),
            batch,
            format,
            use_color,
        ),
    };

    if let Err(err) = result {
        tracing::error!(event = "fatal", error = ?err);
        eprintln!("Error: {err:#}");
        std::process::exit(2);
    }
    Ok(())
}
