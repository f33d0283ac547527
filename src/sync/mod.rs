//! Local Sync Context
//!
//! Owns the mirrored tree and its identity index for one sync root, and
//! exposes the reconciliation operations against a [`FileSystemAccess`].

pub mod invalidate;
pub mod reconcile;

pub use invalidate::invalidate_filesystem_ids;
pub use reconcile::{
    assign_filesystem_ids, ReconcileOptions, ReconcileReport, Unmatched, UnmatchedReason,
};

use crate::app::SyncApp;
use crate::config::{ConfigLoader, MirrorConfig};
use crate::error::{ApiError, ReconcileError, TreeError};
use crate::filter;
use crate::fs::local::LocalFileSystem;
use crate::fs::FileSystemAccess;
use crate::index::FsidIndex;
use crate::tree::{FingerprintConfig, LocalTree, NodeHandle};
use crate::types::FsId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

fn default_debris_dir() -> String {
    ".debris".to_string()
}

fn default_true() -> bool {
    true
}

/// Sync behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Name of the debris folder directly under the sync root
    #[serde(default = "default_debris_dir")]
    pub debris_dir: String,

    /// Require a checksum match before re-assigning a known file's identity
    #[serde(default = "default_true")]
    pub require_fingerprint: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debris_dir: default_debris_dir(),
            require_fingerprint: default_true(),
        }
    }
}

/// Mirror of one local sync root.
#[derive(Debug)]
pub struct LocalSync<F: FileSystemAccess> {
    fs: F,
    root_path: String,
    debris_path: String,
    tree: LocalTree,
    index: FsidIndex,
    options: ReconcileOptions,
}

impl<F: FileSystemAccess> LocalSync<F> {
    /// Create an empty mirror of `root_path`.
    pub fn new(
        fs: F,
        root_path: &str,
        config: &SyncConfig,
        fingerprint: &FingerprintConfig,
    ) -> Self {
        let root_path = fs.local_to_path(root_path);
        let debris_path = fs.join(&root_path, &config.debris_dir);
        let root_name = root_path
            .trim_end_matches(fs.separator())
            .rsplit(fs.separator())
            .next()
            .unwrap_or_default()
            .to_string();
        let options = ReconcileOptions {
            excluded_root: debris_path.clone(),
            require_fingerprint: config.require_fingerprint,
            fingerprint: fingerprint.clone(),
        };
        Self {
            tree: LocalTree::new(&root_name),
            index: FsidIndex::new(),
            fs,
            root_path,
            debris_path,
            options,
        }
    }

    /// Create an empty mirror configured from a loaded [`MirrorConfig`].
    pub fn from_config(fs: F, root_path: &str, config: &MirrorConfig) -> Self {
        Self::new(fs, root_path, &config.sync, &config.fingerprint)
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn debris_path(&self) -> &str {
        &self.debris_path
    }

    pub fn tree(&self) -> &LocalTree {
        &self.tree
    }

    /// Mutable tree access for structural edits.
    ///
    /// Removing nodes must go through [`LocalSync::remove_node`] so the index
    /// stays consistent.
    pub fn tree_mut(&mut self) -> &mut LocalTree {
        &mut self.tree
    }

    pub fn index(&self) -> &FsidIndex {
        &self.index
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn local_path(&self, handle: NodeHandle) -> Option<String> {
        self.tree
            .local_path(handle, &self.root_path, self.fs.separator())
    }

    /// Whether `path` lies outside the debris folder.
    pub fn is_path_syncable(&self, path: &str) -> bool {
        filter::is_path_syncable(path, &self.debris_path, self.fs.separator())
    }

    pub fn node_by_fsid(&self, fsid: FsId) -> Option<NodeHandle> {
        self.index.lookup(fsid)
    }

    /// Drop the identities of `subtree_root` and everything below it.
    pub fn invalidate(&mut self, subtree_root: NodeHandle) -> usize {
        invalidate_filesystem_ids(&mut self.tree, &mut self.index, subtree_root)
    }

    /// Reconcile the whole tree against the sync root.
    pub fn assign_filesystem_ids<A: SyncApp + ?Sized>(
        &mut self,
        app: &A,
    ) -> Result<ReconcileReport, ReconcileError> {
        let root = self.tree.root();
        assign_filesystem_ids(
            &mut self.tree,
            root,
            &self.root_path,
            app,
            &self.fs,
            &mut self.index,
            &self.options,
        )
    }

    /// Reconcile only the subtree rooted at folder `handle`.
    pub fn reconcile_subtree<A: SyncApp + ?Sized>(
        &mut self,
        handle: NodeHandle,
        app: &A,
    ) -> Result<ReconcileReport, ReconcileError> {
        let path = self.local_path(handle).ok_or(TreeError::StaleHandle)?;
        assign_filesystem_ids(
            &mut self.tree,
            handle,
            &path,
            app,
            &self.fs,
            &mut self.index,
            &self.options,
        )
    }

    /// Invalidate every identity, then reconcile from the root.
    pub fn rescan<A: SyncApp + ?Sized>(
        &mut self,
        app: &A,
    ) -> Result<ReconcileReport, ReconcileError> {
        let root = self.tree.root();
        let cleared = self.invalidate(root);
        info!(root = %self.root_path, cleared, "Starting full rescan");
        self.assign_filesystem_ids(app)
    }

    /// Destroy `handle` and its subtree, dropping their index entries first.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<usize, TreeError> {
        self.tree.remove_subtree(handle, &mut self.index)
    }
}

impl LocalSync<LocalFileSystem> {
    /// Mirror the local directory `root` and run the initial scan.
    ///
    /// Configuration is loaded for `root` through [`ConfigLoader`]. Fails if
    /// `root` cannot be resolved, the configuration is invalid or the scan
    /// cannot open the root.
    pub fn open_local<A: SyncApp + ?Sized>(
        root: &Path,
        app: &A,
    ) -> Result<(Self, ReconcileReport), ApiError> {
        let root = dunce::canonicalize(root)?;
        let config = ConfigLoader::load(&root)?;
        let root_path = root.to_str().ok_or_else(|| {
            ApiError::ConfigError(format!("Sync root is not valid UTF-8: {}", root.display()))
        })?;

        let mut sync = Self::from_config(LocalFileSystem::new(), root_path, &config);
        let report = sync.assign_filesystem_ids(app)?;
        Ok((sync, report))
    }
}
