//! Filesystem Access
//!
//! Capability contract the reconciliation core is written against. The core
//! never touches `std::fs` directly: it opens entries, reads raw bytes and
//! enumerates directories through these traits, so the same algorithm runs
//! against the real filesystem ([`local`]) and the in-memory one ([`memory`]).
//!
//! Paths handed to the capability are plain strings joined with
//! [`FileSystemAccess::separator`].

pub mod local;
pub mod memory;

use crate::types::{EntryKind, FsId};
use std::io;

/// What a successful [`FileAccess::open`] learns about an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub kind: EntryKind,
    /// `None` when the platform cannot report a usable identifier.
    pub fsid: Option<FsId>,
    pub size: u64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
}

/// Access to a single filesystem entry.
pub trait FileAccess {
    /// Open `path` and report its identity, size, modification time and kind.
    ///
    /// Symbolic links are not followed.
    fn open(&mut self, path: &str) -> io::Result<EntryInfo>;

    /// Fill `buf` with the bytes starting at `offset` of the currently open file.
    fn read_raw(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()>;
}

/// Enumeration of a directory's children.
pub trait DirAccess {
    /// Start enumerating `path`. `entry` is the result of opening the same
    /// path through a [`FileAccess`] and must describe a folder.
    fn open(&mut self, path: &str, entry: &EntryInfo) -> io::Result<()>;

    /// Next child name, or `None` at the end of the sequence.
    ///
    /// The sequence is finite and restarts with every `open`.
    fn next_name(&mut self) -> Option<String>;
}

/// Factory for entry and directory accessors.
pub trait FileSystemAccess {
    type File: FileAccess;
    type Dir: DirAccess;

    fn new_file_access(&self) -> Self::File;

    fn new_dir_access(&self) -> Self::Dir;

    /// Normalize a local path before it is used for lookups.
    fn local_to_path(&self, local: &str) -> String;

    /// Separator used to join path segments.
    fn separator(&self) -> &str;

    /// Join a child name onto a parent path.
    fn join(&self, parent: &str, name: &str) -> String {
        let sep = self.separator();
        if parent.is_empty() {
            name.to_string()
        } else if parent.ends_with(sep) {
            format!("{}{}", parent, name)
        } else {
            format!("{}{}{}", parent, sep, name)
        }
    }
}

pub(crate) fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "no entry is open")
}

pub(crate) fn not_a_directory(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("not a directory: {}", path),
    )
}
