//! Identity Index
//!
//! O(1) map from filesystem identifier to the file node that owns it. The
//! index and the nodes are kept in lock-step: a node carries an identifier
//! exactly when it has an entry here, and each node stores the key of its
//! own entry so that removal never needs a search.

use crate::error::{IndexError, TreeError};
use crate::tree::{LocalTree, NodeHandle};
use crate::types::FsId;
use std::collections::HashMap;
use tracing::debug;

/// Identity index: FsId -> owning file node
#[derive(Debug, Default, Clone)]
pub struct FsidIndex {
    entries: HashMap<FsId, NodeHandle>,
}

impl FsidIndex {
    pub fn new() -> Self {
        FsidIndex {
            entries: HashMap::new(),
        }
    }

    /// Map `fsid` to `node`, replacing any existing mapping.
    ///
    /// Raw primitive: callers go through [`FsidIndex::assign`] so the node's
    /// own fields follow.
    pub(crate) fn insert(&mut self, fsid: FsId, node: NodeHandle) -> Option<NodeHandle> {
        self.entries.insert(fsid, node)
    }

    /// Erase the mapping for `fsid`; no-op if absent.
    pub(crate) fn remove(&mut self, fsid: FsId) -> Option<NodeHandle> {
        self.entries.remove(&fsid)
    }

    pub fn lookup(&self, fsid: FsId) -> Option<NodeHandle> {
        self.entries.get(&fsid).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FsId, NodeHandle)> + '_ {
        self.entries.iter().map(|(fsid, node)| (*fsid, *node))
    }

    /// Give file node `handle` the identifier `fsid`.
    ///
    /// The node's previous entry is dropped first, then any other node
    /// holding `fsid` is evicted (its identifier becomes undefined) before the
    /// new entry is inserted. Returns the evicted node, if any.
    pub fn assign(
        &mut self,
        tree: &mut LocalTree,
        handle: NodeHandle,
        fsid: FsId,
    ) -> Result<Option<NodeHandle>, TreeError> {
        let node = tree.get(handle).ok_or(TreeError::StaleHandle)?;
        if !node.is_file() {
            return Err(TreeError::NotAFile(node.name().to_string()));
        }
        if node.index_key() == Some(fsid) && self.lookup(fsid) == Some(handle) {
            return Ok(None);
        }

        self.clear(tree, handle);

        let evicted = match self.remove(fsid) {
            Some(other) if other != handle => {
                if let Some(other_node) = tree.get_mut(other) {
                    other_node.take_identity();
                }
                debug!(%fsid, ?other, ?handle, "Evicted stale identity mapping");
                Some(other)
            }
            _ => None,
        };

        self.insert(fsid, handle);
        if let Some(node) = tree.get_mut(handle) {
            node.set_identity(fsid);
        }
        Ok(evicted)
    }

    /// Drop the identity of `handle`, using the key stored in the node.
    ///
    /// Returns whether the node was indexed. Stale handles are ignored.
    pub fn clear(&mut self, tree: &mut LocalTree, handle: NodeHandle) -> bool {
        let Some(node) = tree.get_mut(handle) else {
            return false;
        };
        match node.take_identity() {
            Some(key) => {
                if self.lookup(key) == Some(handle) {
                    self.remove(key);
                }
                true
            }
            None => false,
        }
    }

    /// Check the index against `tree`.
    ///
    /// Every entry must point at a live file node carrying that identifier,
    /// and every node carrying an identifier must be indexed under it.
    pub fn verify(&self, tree: &LocalTree) -> Result<(), IndexError> {
        for (&fsid, &handle) in &self.entries {
            let node = tree.get(handle).ok_or(IndexError::DanglingEntry(fsid))?;
            if node.is_folder() {
                return Err(IndexError::FolderIndexed(fsid));
            }
            if node.fsid() != Some(fsid) || node.index_key() != Some(fsid) {
                return Err(IndexError::MismatchedEntry(fsid));
            }
        }
        for (handle, node) in tree.iter() {
            match (node.fsid(), node.index_key()) {
                (None, None) => {}
                (Some(fsid), Some(key)) if fsid == key => {
                    if node.is_folder() {
                        return Err(IndexError::FolderIndexed(fsid));
                    }
                    if self.lookup(fsid) != Some(handle) {
                        return Err(IndexError::MissingEntry(fsid));
                    }
                }
                (Some(fsid), _) | (None, Some(fsid)) => {
                    return Err(IndexError::MissingEntry(fsid));
                }
            }
        }
        Ok(())
    }
}
