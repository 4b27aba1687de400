use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = ".jp2";
pub const DEFAULT_UNLISTED_THRESHOLD: usize = 5;

/// Raw config file shape: a default project name plus one table per
/// project.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    default_project: Option<String>,
    #[serde(default)]
    projects: BTreeMap<String, ProjectTable>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectTable {
    project_name: Option<String>,
    project_path: PathBuf,
    mets_path: PathBuf,
    local_renaming_prefix: String,
    imaging_services_prefix: String,
    extension: Option<String>,
    unlisted_files_threshold: Option<usize>,
    strict_mode: Option<bool>,
}

/// Fully resolved, immutable configuration for one project. Constructed
/// once and passed to every component.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub project: String,
    pub project_name: String,
    pub project_path: PathBuf,
    pub mets_path: PathBuf,
    pub local_renaming_prefix: String,
    pub imaging_services_prefix: String,
    pub extension: String,
    pub unlisted_files_threshold: usize,
    pub strict_mode: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("no config file found (looked for reseqr.toml in the current and user config directories)")]
    NotFound,
    #[error("config file names no default project and --project was not given")]
    NoDefaultProject,
    #[error("project {0:?} not listed in the config file")]
    UnknownProject(String),
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        out.push(cwd.join("reseqr.toml"));
    }
    if let Some(base) = dirs::config_dir() {
        out.push(base.join("reseqr").join("reseqr.toml"));
    }
    out
}

/// Load and resolve one project configuration.
///
/// Search order: explicit `config_path`, then `./reseqr.toml`, then
/// `<config dir>/reseqr/reseqr.toml`. Without an explicit `project` the
/// file's `default_project` is used.
pub fn load_project(
    config_path: Option<&Path>,
    project: Option<&str>,
) -> Result<ProjectConfig, ConfigError> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => candidate_paths()
            .into_iter()
            .find(|p| p.is_file())
            .ok_or(ConfigError::NotFound)?,
    };

    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    let name = match project {
        Some(p) => p.to_string(),
        None => file.default_project.ok_or(ConfigError::NoDefaultProject)?,
    };
    let table = file
        .projects
        .get(&name)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownProject(name.clone()))?;

    let project_name = table.project_name.unwrap_or_else(|| name.clone());
    Ok(ProjectConfig {
        project: name,
        project_name,
        project_path: table.project_path,
        mets_path: table.mets_path,
        local_renaming_prefix: table.local_renaming_prefix,
        imaging_services_prefix: table.imaging_services_prefix,
        extension: table
            .extension
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        unlisted_files_threshold: table
            .unlisted_files_threshold
            .unwrap_or(DEFAULT_UNLISTED_THRESHOLD),
        strict_mode: table.strict_mode.unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"
default_project = "darwin"

[projects.darwin]
project_name = "Darwin Correspondence"
project_path = "/data/projects/darwin"
mets_path = "/data/mets"
local_renaming_prefix = "R_"
imaging_services_prefix = "FIMG-JP2-"

[projects.hooker]
project_path = "/data/projects/hooker"
mets_path = "/data/mets"
local_renaming_prefix = "REN-"
imaging_services_prefix = "IMG-"
extension = ".tif"
unlisted_files_threshold = 3
strict_mode = false
"#;

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("reseqr.toml");
        fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn defaults_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let cfg = load_project(Some(&path), None).unwrap();
        assert_eq!(cfg.project, "darwin");
        assert_eq!(cfg.project_name, "Darwin Correspondence");
        assert_eq!(cfg.extension, ".jp2");
        assert_eq!(cfg.unlisted_files_threshold, 5);
        assert!(cfg.strict_mode);
    }

    #[test]
    fn explicit_project_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let cfg = load_project(Some(&path), Some("hooker")).unwrap();
        assert_eq!(cfg.project_name, "hooker");
        assert_eq!(cfg.extension, ".tif");
        assert_eq!(cfg.unlisted_files_threshold, 3);
        assert!(!cfg.strict_mode);
    }

    #[test]
    fn unknown_project_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);

        let err = load_project(Some(&path), Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProject(_)));
    }

    #[test]
    fn missing_default_project_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reseqr.toml");
        fs::write(&path, SAMPLE.replace("default_project = \"darwin\"", "")).unwrap();

        let err = load_project(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NoDefaultProject));
    }

    #[test]
    fn missing_required_key_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reseqr.toml");
        fs::write(&path, SAMPLE.replace("mets_path = \"/data/mets\"\n", "")).unwrap();

        let err = load_project(Some(&path), Some("darwin")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
