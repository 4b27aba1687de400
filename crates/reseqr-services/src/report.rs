use crate::Result;
use std::path::{Path, PathBuf};

/// Accumulated processing report for one batch run.
///
/// Lines are collected as processing goes and flushed to the batch
/// directory once at the end, success or fatal abort, so a failed run
/// always leaves a diagnostic artifact. With `echo` on, each line is also
/// printed as it is pushed.
#[derive(Debug)]
pub struct Report {
    path: PathBuf,
    lines: Vec<String>,
    echo: bool,
}

impl Report {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lines: Vec::new(),
            echo: true,
        }
    }

    /// A report that only accumulates, for machine-readable output modes.
    pub fn silent(path: PathBuf) -> Self {
        Self {
            path,
            lines: Vec::new(),
            echo: false,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        }
        tracing::debug!(event = "report_line", line = %line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&self) -> Result<()> {
        let mut text = self.lines.join("\n");
        text.push('\n');
        crate::util::write_atomic(&self.path, text.as_bytes())?;
        Ok(())
    }
}
