use reseqr_core::{DirectoryGroup, MetadataGroup};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    GroupKeyMismatch,
    CountMismatch,
    UnlistedFiles,
    UnlistedThreshold,
    MissingFiles,
    StrictUnlisted,
    Confirmed,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::GroupKeyMismatch => "group-key-mismatch",
            FindingKind::CountMismatch => "count-mismatch",
            FindingKind::UnlistedFiles => "unlisted-files",
            FindingKind::UnlistedThreshold => "unlisted-threshold",
            FindingKind::MissingFiles => "missing-files",
            FindingKind::StrictUnlisted => "strict-unlisted",
            FindingKind::Confirmed => "confirmed",
        }
    }
}

/// One reported check result. Free text is for the report; `kind`, `group`
/// and `files` carry the machine-readable part.
#[derive(Debug, Clone)]
pub struct Finding {
    pub kind: FindingKind,
    pub group: Option<String>,
    pub files: Vec<String>,
    pub message: String,
}

/// Per-group reconciliation outcome.
#[derive(Debug, Clone, Default)]
pub struct GroupOutcome {
    pub group: String,
    pub missing: BTreeSet<String>,
    pub unlisted: BTreeSet<String>,
    pub count_mismatch: bool,
}

/// Aggregate outcome of one reconciliation run: every finding across every
/// group, plus the terminal verdict. Fatality is a verdict here, never a
/// process exit from inside validation.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub findings: Vec<Finding>,
    pub groups: Vec<GroupOutcome>,
    pub only_on_disk: BTreeSet<String>,
    pub only_in_mets: BTreeSet<String>,
    fatal: bool,
}

impl Reconciliation {
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Unlisted files per group before escalating to fatal.
    pub unlisted_threshold: usize,
    /// With strict mode any unlisted file at all is fatal.
    pub strict: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            unlisted_threshold: 5,
            strict: true,
        }
    }
}

fn join(files: &BTreeSet<String>) -> String {
    files.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Cross-validate scanned directories against parsed metadata groups.
///
/// All findings are collected before the verdict is settled, so one run
/// surfaces every discrepancy in the batch. The only early return is the
/// batch-level key-set mismatch: per-group checks are meaningless when the
/// group sets themselves disagree, but both one-sided differences are still
/// reported.
pub fn reconcile(
    dirs: &BTreeMap<String, DirectoryGroup>,
    mets: &BTreeMap<String, MetadataGroup>,
    opts: &ReconcileOptions,
) -> Reconciliation {
    let mut out = Reconciliation::default();

    let dir_keys: BTreeSet<&String> = dirs.keys().collect();
    let mets_keys: BTreeSet<&String> = mets.keys().collect();
    if dir_keys != mets_keys {
        out.only_on_disk = dir_keys
            .difference(&mets_keys)
            .map(|k| (*k).clone())
            .collect();
        out.only_in_mets = mets_keys
            .difference(&dir_keys)
            .map(|k| (*k).clone())
            .collect();
        if !out.only_on_disk.is_empty() {
            out.findings.push(Finding {
                kind: FindingKind::GroupKeyMismatch,
                group: None,
                files: out.only_on_disk.iter().cloned().collect(),
                message: format!(
                    "subdirectories without a corresponding METS document: {}",
                    join(&out.only_on_disk)
                ),
            });
        }
        if !out.only_in_mets.is_empty() {
            out.findings.push(Finding {
                kind: FindingKind::GroupKeyMismatch,
                group: None,
                files: out.only_in_mets.iter().cloned().collect(),
                message: format!(
                    "METS documents without a corresponding subdirectory: {}",
                    join(&out.only_in_mets)
                ),
            });
        }
        out.fatal = true;
        return out;
    }

    let mut any_unlisted = false;
    for (key, dir) in dirs {
        let meta = &mets[key];
        let mut outcome = GroupOutcome {
            group: key.clone(),
            ..Default::default()
        };
        let listed: BTreeSet<&str> = meta.items.iter().map(|d| d.filename.as_str()).collect();

        if dir.files.len() != meta.items.len() {
            outcome.count_mismatch = true;
            out.findings.push(Finding {
                kind: FindingKind::CountMismatch,
                group: Some(key.clone()),
                files: Vec::new(),
                message: format!(
                    "subdirectory {key} holds {} files but METS lists {} entries",
                    dir.files.len(),
                    meta.items.len()
                ),
            });
        }

        outcome.unlisted = dir
            .files
            .iter()
            .filter(|f| !listed.contains(f.as_str()))
            .cloned()
            .collect();
        if !outcome.unlisted.is_empty() {
            any_unlisted = true;
            out.findings.push(Finding {
                kind: FindingKind::UnlistedFiles,
                group: Some(key.clone()),
                files: outcome.unlisted.iter().cloned().collect(),
                message: format!(
                    "files in {key} not listed by METS: {}",
                    join(&outcome.unlisted)
                ),
            });
            if outcome.unlisted.len() >= opts.unlisted_threshold {
                out.fatal = true;
                out.findings.push(Finding {
                    kind: FindingKind::UnlistedThreshold,
                    group: Some(key.clone()),
                    files: Vec::new(),
                    message: format!(
                        "{} unlisted files in {key} reach the threshold of {}",
                        outcome.unlisted.len(),
                        opts.unlisted_threshold
                    ),
                });
            }
        }

        outcome.missing = meta
            .items
            .iter()
            .map(|d| &d.filename)
            .filter(|f| !dir.files.contains(*f))
            .cloned()
            .collect();
        if !outcome.missing.is_empty() {
            out.fatal = true;
            out.findings.push(Finding {
                kind: FindingKind::MissingFiles,
                group: Some(key.clone()),
                files: outcome.missing.iter().cloned().collect(),
                message: format!(
                    "files listed by METS missing from {key}: {}",
                    join(&outcome.missing)
                ),
            });
        }

        out.groups.push(outcome);
    }

    // Strict mode verdict is settled once, after every group was evaluated
    // and reported.
    if opts.strict && any_unlisted {
        out.fatal = true;
        out.findings.push(Finding {
            kind: FindingKind::StrictUnlisted,
            group: None,
            files: Vec::new(),
            message: "strict mode: batch has unlisted files".to_string(),
        });
    }

    if !out.fatal {
        out.findings.push(Finding {
            kind: FindingKind::Confirmed,
            group: None,
            files: Vec::new(),
            message:
                "confirmed one-to-one correspondence between METS entries and files on disk"
                    .to_string(),
        });
    }

    out
}
