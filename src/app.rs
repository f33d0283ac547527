//! Application callback consulted before entries are admitted to the mirror.

use crate::tree::LocalNode;

/// Lets the embedding application veto parts of the local tree.
pub trait SyncApp {
    /// Whether `path` may be synced.
    ///
    /// For the sync root, `node` is the root itself. For entries found while
    /// walking a folder, `node` is that folder and `path` is the child's path.
    fn is_syncable(&self, node: &LocalNode, path: &str) -> bool;
}

impl<F> SyncApp for F
where
    F: Fn(&LocalNode, &str) -> bool,
{
    fn is_syncable(&self, node: &LocalNode, path: &str) -> bool {
        self(node, path)
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SyncApp for AllowAll {
    fn is_syncable(&self, _node: &LocalNode, _path: &str) -> bool {
        true
    }
}
