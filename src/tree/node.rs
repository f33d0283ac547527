//! Mirrored tree nodes.

use super::fingerprint::FileFingerprint;
use super::NodeHandle;
use crate::types::{FsId, NodeKind};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Children of a folder node, in insertion order, with a lookup by name.
#[derive(Debug, Clone, Default)]
pub(crate) struct Children {
    order: Vec<NodeHandle>,
    by_name: HashMap<String, NodeHandle>,
}

impl Children {
    pub(crate) fn get(&self, name: &str) -> Option<NodeHandle> {
        self.by_name.get(&name_key(name)).copied()
    }

    /// Returns false when a sibling with an equivalent name exists.
    pub(crate) fn insert(&mut self, name: &str, handle: NodeHandle) -> bool {
        let key = name_key(name);
        if self.by_name.contains_key(&key) {
            return false;
        }
        self.by_name.insert(key, handle);
        self.order.push(handle);
        true
    }

    pub(crate) fn remove(&mut self, name: &str, handle: NodeHandle) {
        let key = name_key(name);
        if self.by_name.get(&key) == Some(&handle) {
            self.by_name.remove(&key);
        }
        self.order.retain(|h| *h != handle);
    }

    pub(crate) fn as_slice(&self) -> &[NodeHandle] {
        &self.order
    }
}

/// Sibling names compare equal when their NFC forms are equal.
pub(crate) fn name_key(name: &str) -> String {
    name.nfc().collect()
}

/// One file or folder of the mirrored tree.
///
/// Identity fields (`fsid`, index key) are only changed through
/// [`crate::index::FsidIndex`], which keeps them in step with the index.
#[derive(Debug, Clone)]
pub struct LocalNode {
    kind: NodeKind,
    name: String,
    parent: Option<NodeHandle>,
    children: Option<Children>,
    fsid: Option<FsId>,
    index_key: Option<FsId>,
    fingerprint: Option<FileFingerprint>,
}

impl LocalNode {
    pub(crate) fn new(
        kind: NodeKind,
        name: String,
        parent: Option<NodeHandle>,
        fingerprint: Option<FileFingerprint>,
    ) -> Self {
        let (children, fingerprint) = match kind {
            NodeKind::Folder => (Some(Children::default()), None),
            NodeKind::File => (None, fingerprint),
        };
        Self {
            kind,
            name,
            parent,
            children,
            fsid: None,
            index_key: None,
            fingerprint,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Back-link to the owning folder; `None` for the root.
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Child handles in insertion order (empty for files).
    pub fn children(&self) -> &[NodeHandle] {
        self.children.as_ref().map(Children::as_slice).unwrap_or(&[])
    }

    /// Filesystem identifier, `None` while undefined.
    pub fn fsid(&self) -> Option<FsId> {
        self.fsid
    }

    /// Key of this node's entry in the identity index, `None` when not indexed.
    pub fn index_key(&self) -> Option<FsId> {
        self.index_key
    }

    pub fn fingerprint(&self) -> Option<&FileFingerprint> {
        self.fingerprint.as_ref()
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        self.children.as_mut()
    }

    pub(crate) fn child_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.children.as_ref().and_then(|c| c.get(name))
    }

    pub(crate) fn set_fingerprint(&mut self, fingerprint: Option<FileFingerprint>) {
        if self.kind == NodeKind::File {
            self.fingerprint = fingerprint;
        }
    }

    pub(crate) fn set_identity(&mut self, fsid: FsId) {
        self.fsid = Some(fsid);
        self.index_key = Some(fsid);
    }

    /// Drop the identity, returning the index key the node held.
    pub(crate) fn take_identity(&mut self) -> Option<FsId> {
        self.fsid = None;
        self.index_key.take()
    }
}
