//! Core types for the filesystem mirror.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash: Generic 256-bit hash value
pub type Hash = [u8; 32];

/// Filesystem identifier reported by the operating system (inode-like).
///
/// Only unique at a point in time: the OS may hand the same value to a new
/// file after the old one is deleted. An absent identifier is modelled as
/// `Option<FsId>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FsId(pub u64);

impl fmt::Display for FsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for FsId {
    fn from(value: u64) -> Self {
        FsId(value)
    }
}

/// Kind of a mirrored tree node. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Folder,
    File,
}

/// Kind of an entry as reported by the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Folder,
    File,
    Symlink,
    Other,
}

impl EntryKind {
    /// The node kind this entry can be mirrored as, if any.
    pub fn node_kind(self) -> Option<NodeKind> {
        match self {
            EntryKind::Folder => Some(NodeKind::Folder),
            EntryKind::File => Some(NodeKind::File),
            EntryKind::Symlink | EntryKind::Other => None,
        }
    }
}
