//! fsmirror: Filesystem Identity Reconciliation
//!
//! Keeps an in-memory mirror of a local sync root and re-establishes, after
//! a restart or a rescan, which mirrored file node corresponds to which real
//! file. Files are identified by the identifier the filesystem assigns them
//! (the inode on unix), confirmed against a content fingerprint so that a
//! reused identifier is never taken for the old file.

pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod fs;
pub mod index;
pub mod logging;
pub mod sync;
pub mod tree;
pub mod types;

pub use app::{AllowAll, SyncApp};
pub use error::{ApiError, IndexError, ReconcileError, TreeError};
pub use index::FsidIndex;
pub use sync::{LocalSync, ReconcileReport, SyncConfig};
pub use tree::{LocalNode, LocalTree, NodeHandle};
pub use types::{FsId, NodeKind};
