//! Identity invalidation ahead of a full rescan.

use crate::index::FsidIndex;
use crate::tree::{LocalTree, NodeHandle};
use tracing::debug;

/// Clear the filesystem identity of `subtree_root` and every descendant.
///
/// Afterwards no node of the subtree appears in `index` and every node's
/// identifier is undefined. Returns the number of index entries removed;
/// a second call on the same subtree removes nothing.
pub fn invalidate_filesystem_ids(
    tree: &mut LocalTree,
    index: &mut FsidIndex,
    subtree_root: NodeHandle,
) -> usize {
    let mut removed = 0;
    for handle in tree.descendants(subtree_root) {
        if index.clear(tree, handle) {
            removed += 1;
        }
    }
    debug!(removed, remaining = index.len(), "Invalidated filesystem ids");
    removed
}
