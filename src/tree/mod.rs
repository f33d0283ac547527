//! Mirrored Tree
//!
//! In-memory mirror of a local directory subtree. Nodes live in an arena and
//! are addressed by generational [`NodeHandle`]s: a folder exclusively owns
//! its children (by handle), and the parent handle stored in every node is a
//! back-link used for path resolution only. Freeing a slot bumps its
//! generation, so handles to removed nodes go stale instead of aliasing a
//! newer node.

pub mod fingerprint;
pub mod node;

pub use fingerprint::{FileFingerprint, FingerprintConfig};
pub use node::LocalNode;

use crate::error::TreeError;
use crate::index::FsidIndex;
use crate::types::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable address of a node inside a [`LocalTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle {
    index: u32,
    generation: u32,
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle({}v{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<LocalNode>,
}

/// Arena-backed tree of [`LocalNode`]s rooted at a single folder.
#[derive(Debug, Clone)]
pub struct LocalTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeHandle,
    len: usize,
}

impl LocalTree {
    /// Create a tree holding only its root folder.
    pub fn new(root_name: &str) -> Self {
        let root = NodeHandle {
            index: 0,
            generation: 0,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(LocalNode::new(
                    NodeKind::Folder,
                    root_name.to_string(),
                    None,
                    None,
                )),
            }],
            free: Vec::new(),
            root,
            len: 1,
        }
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// A tree always holds its root, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&LocalNode> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut LocalNode> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node(&self, handle: NodeHandle) -> Result<&LocalNode, TreeError> {
        self.get(handle).ok_or(TreeError::StaleHandle)
    }

    /// Add a folder under `parent`.
    pub fn add_folder(&mut self, parent: NodeHandle, name: &str) -> Result<NodeHandle, TreeError> {
        self.add_node(parent, NodeKind::Folder, name, None)
    }

    /// Add a file under `parent`, optionally with a previously known fingerprint.
    pub fn add_file(
        &mut self,
        parent: NodeHandle,
        name: &str,
        fingerprint: Option<FileFingerprint>,
    ) -> Result<NodeHandle, TreeError> {
        self.add_node(parent, NodeKind::File, name, fingerprint)
    }

    pub(crate) fn add_node(
        &mut self,
        parent: NodeHandle,
        kind: NodeKind,
        name: &str,
        fingerprint: Option<FileFingerprint>,
    ) -> Result<NodeHandle, TreeError> {
        validate_name(name)?;
        let parent_node = self.node(parent)?;
        if !parent_node.is_folder() {
            return Err(TreeError::NotAFolder(parent_node.name().to_string()));
        }
        if parent_node.child_by_name(name).is_some() {
            return Err(TreeError::DuplicateName(name.to_string()));
        }

        let node = LocalNode::new(kind, name.to_string(), Some(parent), fingerprint);
        let handle = self.allocate(node);
        if let Some(children) = self.get_mut(parent).and_then(LocalNode::children_mut) {
            children.insert(name, handle);
        }
        Ok(handle)
    }

    fn allocate(&mut self, node: LocalNode) -> NodeHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeHandle {
            index,
            generation: 0,
        }
    }

    /// Child of `parent` whose name is equivalent to `name`.
    pub fn child_by_name(&self, parent: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.get(parent)?.child_by_name(name)
    }

    /// Replace the known fingerprint of a file node. Ignored for folders.
    pub fn set_fingerprint(
        &mut self,
        handle: NodeHandle,
        fingerprint: Option<FileFingerprint>,
    ) -> Result<(), TreeError> {
        self.get_mut(handle)
            .ok_or(TreeError::StaleHandle)?
            .set_fingerprint(fingerprint);
        Ok(())
    }

    /// `handle` and all of its descendants, depth-first, parents before children.
    pub fn descendants(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    /// Iterate over every live node.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &LocalNode)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|node| {
                (
                    NodeHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    node,
                )
            })
        })
    }

    /// Local path of `handle`, with the root resolving to `root_path`.
    pub fn local_path(&self, handle: NodeHandle, root_path: &str, separator: &str) -> Option<String> {
        let mut names = Vec::new();
        let mut current = handle;
        loop {
            let node = self.get(current)?;
            match node.parent() {
                Some(parent) => {
                    names.push(node.name());
                    current = parent;
                }
                None if current == self.root => break,
                None => return None,
            }
        }

        let mut path = root_path.to_string();
        for name in names.into_iter().rev() {
            if !path.is_empty() && !path.ends_with(separator) {
                path.push_str(separator);
            }
            path.push_str(name);
        }
        Some(path)
    }

    /// Destroy `handle` and its descendants.
    ///
    /// Index entries are removed before any slot is freed. Returns the number
    /// of nodes removed.
    pub fn remove_subtree(
        &mut self,
        handle: NodeHandle,
        index: &mut FsidIndex,
    ) -> Result<usize, TreeError> {
        if handle == self.root {
            return Err(TreeError::RootRemoval);
        }
        let node = self.node(handle)?;
        let parent = node.parent();
        let name = node.name().to_string();

        let doomed = self.descendants(handle);
        for &h in &doomed {
            index.clear(self, h);
        }

        if let Some(children) = parent
            .and_then(|p| self.get_mut(p))
            .and_then(LocalNode::children_mut)
        {
            children.remove(&name, handle);
        }

        for h in &doomed {
            let slot = &mut self.slots[h.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(h.index);
        }
        self.len -= doomed.len();
        Ok(doomed.len())
    }
}

fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}
