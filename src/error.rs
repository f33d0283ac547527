//! Error types for the filesystem mirror.

use crate::types::FsId;
use thiserror::Error;

/// Errors raised by structural tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Node handle is stale or does not belong to this tree")]
    StaleHandle,

    #[error("Node is not a folder: {0}")]
    NotAFolder(String),

    #[error("Only file nodes carry a filesystem identifier: {0}")]
    NotAFile(String),

    #[error("A sibling named {0:?} already exists")]
    DuplicateName(String),

    #[error("Invalid node name: {0:?}")]
    InvalidName(String),

    #[error("The root node cannot be removed")]
    RootRemoval,
}

/// Root-level failures of a reconciliation pass.
///
/// Per-entry problems (missing entries, permission failures, fingerprint
/// mismatches) are not errors; they are reported in the pass report.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Sync root {path} could not be opened as a directory: {source}")]
    RootUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sync root {0} is not a directory")]
    RootNotAFolder(String),

    #[error("Sync root {0} was rejected by the application")]
    RootVetoed(String),

    #[error("Subtree root is not a folder node")]
    SubtreeNotAFolder,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Index invariant violations, as found by `FsidIndex::verify`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Index entry {0} points at a node that no longer exists")]
    DanglingEntry(FsId),

    #[error("Index entry {0} points at a node that carries a different identifier")]
    MismatchedEntry(FsId),

    #[error("Node carrying {0} is not present in the index")]
    MissingEntry(FsId),

    #[error("Folder node carries identifier {0}")]
    FolderIndexed(FsId),
}

/// Errors from the ambient layers (configuration, logging, I/O).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
