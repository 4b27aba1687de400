use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// One page entry parsed from a METS structMap: the declared position,
/// the on-disk filename derived from the FILEID, and the literal sequence
/// number string (leading zeros preserved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Declared 1-based position within the group (the `ORDER` attribute).
    pub order: u32,
    /// Expected filename on disk, extension included.
    pub filename: String,
    /// Literal digit string from the FILEID; its width drives zero-padding.
    pub seq: String,
}

/// All entries of one METS document, in document order.
/// Every entry shares `key`; a document describing more than one group is
/// rejected at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataGroup {
    pub key: String,
    pub items: Vec<FileDescriptor>,
}

/// Files actually present in one batch subdirectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryGroup {
    pub key: String,
    pub files: BTreeSet<String>,
}

/// A single rename step. Paths are relative to the batch root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOp {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Error)]
pub enum ReseqrError {
    #[error("batch directory not found: {0}")]
    BatchNotFound(PathBuf),
    #[error("METS directory not found: {0}")]
    MetsDirNotFound(PathBuf),
    #[error("no METS documents found under {0}")]
    NoMetsDocuments(PathBuf),
    #[error("subdirectory {group} contains already renamed file {file}")]
    AlreadyRenamed { group: String, file: String },
    #[error("page div with ORDER={order} has {count} fptr children, expected exactly one")]
    FptrCardinality { order: String, count: usize },
    #[error("FILEID {0:?} does not match the imaging services pattern")]
    BadFileId(String),
    #[error("page div carries no ORDER attribute")]
    MissingOrder,
    #[error("page div without a valid ORDER attribute: {0:?}")]
    BadOrder(String),
    #[error("METS document lists no page entries")]
    EmptyDocument,
    #[error("multiple FILEID group keys in one METS document: {keys:?}")]
    MixedGroupKeys { keys: Vec<String> },
    #[error("group key {key:?} already provided by another METS document ({document})")]
    DuplicateGroupKey { key: String, document: String },
    #[error("XML error: {0}")]
    Xml(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
