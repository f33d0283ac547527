//! In-memory filesystem
//!
//! A [`FileSystemAccess`] backed by a shared map of paths to entries. Used by
//! tests and benchmarks to drive reconciliation without touching disk, and to
//! stage situations that are hard to produce on a real filesystem: reused
//! identifiers, unreadable entries, entries vanishing between enumeration and
//! open.
//!
//! Clones share state, so a test can keep a handle and mutate the filesystem
//! after handing a clone to the code under test.

use super::{not_a_directory, not_open, DirAccess, EntryInfo, FileAccess, FileSystemAccess};
use crate::types::{EntryKind, FsId};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;

const SEPARATOR: &str = "/";

#[derive(Debug, Clone)]
struct MemoryEntry {
    kind: EntryKind,
    fsid: Option<FsId>,
    content: Arc<Vec<u8>>,
    mtime: i64,
    /// Child names in insertion order (folders only).
    children: Vec<String>,
    unreadable: bool,
}

impl MemoryEntry {
    fn info(&self) -> EntryInfo {
        EntryInfo {
            kind: self.kind,
            fsid: self.fsid,
            size: self.content.len() as u64,
            mtime: self.mtime,
        }
    }
}

#[derive(Debug)]
struct MemoryState {
    entries: HashMap<String, MemoryEntry>,
    next_fsid: u64,
}

impl MemoryState {
    fn allocate_fsid(&mut self) -> FsId {
        let fsid = FsId(self.next_fsid);
        self.next_fsid += 1;
        fsid
    }
}

/// Shared in-memory filesystem.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    root: String,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryFileSystem {
    /// Create a filesystem holding a single empty folder at `root`.
    pub fn new(root: &str) -> Self {
        let mut state = MemoryState {
            entries: HashMap::new(),
            next_fsid: 1,
        };
        let fsid = state.allocate_fsid();
        state.entries.insert(
            root.to_string(),
            MemoryEntry {
                kind: EntryKind::Folder,
                fsid: Some(fsid),
                content: Arc::new(Vec::new()),
                mtime: 0,
                children: Vec::new(),
                unreadable: false,
            },
        );
        Self {
            root: root.to_string(),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Path of the root folder.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Add an empty folder at `path`; the parent must already exist.
    pub fn add_folder(&self, path: &str) -> io::Result<FsId> {
        self.add_entry(path, EntryKind::Folder, Vec::new(), 0)
    }

    /// Add a file at `path` with the given content and modification time.
    pub fn add_file(&self, path: &str, content: &[u8], mtime: i64) -> io::Result<FsId> {
        self.add_entry(path, EntryKind::File, content.to_vec(), mtime)
    }

    /// Add a symbolic link at `path`.
    pub fn add_symlink(&self, path: &str) -> io::Result<FsId> {
        self.add_entry(path, EntryKind::Symlink, Vec::new(), 0)
    }

    fn add_entry(
        &self,
        path: &str,
        kind: EntryKind,
        content: Vec<u8>,
        mtime: i64,
    ) -> io::Result<FsId> {
        let (parent, name) = split_path(path)
            .ok_or_else(|| invalid_input(format!("path has no parent: {}", path)))?;
        let mut state = self.state.write();
        if state.entries.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("entry exists: {}", path),
            ));
        }
        match state.entries.get(parent) {
            Some(entry) if entry.kind == EntryKind::Folder => {}
            Some(_) => return Err(not_a_directory(parent)),
            None => return Err(not_found(parent)),
        }
        let fsid = state.allocate_fsid();
        state.entries.insert(
            path.to_string(),
            MemoryEntry {
                kind,
                fsid: Some(fsid),
                content: Arc::new(content),
                mtime,
                children: Vec::new(),
                unreadable: false,
            },
        );
        if let Some(parent_entry) = state.entries.get_mut(parent) {
            parent_entry.children.push(name.to_string());
        }
        Ok(fsid)
    }

    /// Remove `path` and everything below it.
    pub fn remove(&self, path: &str) -> io::Result<()> {
        let mut state = self.state.write();
        if !state.entries.contains_key(path) {
            return Err(not_found(path));
        }
        let prefix = format!("{}{}", path, SEPARATOR);
        state
            .entries
            .retain(|p, _| p != path && !p.starts_with(&prefix));
        if let Some((parent, name)) = split_path(path) {
            if let Some(parent_entry) = state.entries.get_mut(parent) {
                parent_entry.children.retain(|child| child != name);
            }
        }
        Ok(())
    }

    /// Replace a file's content and modification time, keeping its identifier.
    pub fn set_content(&self, path: &str, content: &[u8], mtime: i64) -> io::Result<()> {
        let mut state = self.state.write();
        let entry = state.entries.get_mut(path).ok_or_else(|| not_found(path))?;
        entry.content = Arc::new(content.to_vec());
        entry.mtime = mtime;
        Ok(())
    }

    /// Force the identifier reported for `path`; `None` hides it.
    pub fn set_fsid(&self, path: &str, fsid: Option<FsId>) -> io::Result<()> {
        let mut state = self.state.write();
        let entry = state.entries.get_mut(path).ok_or_else(|| not_found(path))?;
        entry.fsid = fsid;
        Ok(())
    }

    /// Make opening `path` fail with a permission error.
    pub fn set_unreadable(&self, path: &str, unreadable: bool) -> io::Result<()> {
        let mut state = self.state.write();
        let entry = state.entries.get_mut(path).ok_or_else(|| not_found(path))?;
        entry.unreadable = unreadable;
        Ok(())
    }

    /// Identifier currently reported for `path`.
    pub fn fsid(&self, path: &str) -> Option<FsId> {
        self.state.read().entries.get(path).and_then(|e| e.fsid)
    }

    /// Number of entries, the root included.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

impl FileSystemAccess for MemoryFileSystem {
    type File = MemoryFileAccess;
    type Dir = MemoryDirAccess;

    fn new_file_access(&self) -> MemoryFileAccess {
        MemoryFileAccess {
            state: Arc::clone(&self.state),
            current: None,
        }
    }

    fn new_dir_access(&self) -> MemoryDirAccess {
        MemoryDirAccess {
            state: Arc::clone(&self.state),
            pending: VecDeque::new(),
        }
    }

    fn local_to_path(&self, local: &str) -> String {
        local.to_string()
    }

    fn separator(&self) -> &str {
        SEPARATOR
    }
}

/// Entry accessor for [`MemoryFileSystem`].
pub struct MemoryFileAccess {
    state: Arc<RwLock<MemoryState>>,
    current: Option<Arc<Vec<u8>>>,
}

impl FileAccess for MemoryFileAccess {
    fn open(&mut self, path: &str) -> io::Result<EntryInfo> {
        self.current = None;
        let state = self.state.read();
        let entry = state.entries.get(path).ok_or_else(|| not_found(path))?;
        if entry.unreadable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path),
            ));
        }
        self.current = Some(Arc::clone(&entry.content));
        Ok(entry.info())
    }

    fn read_raw(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let content = self.current.as_ref().ok_or_else(not_open)?;
        let start = usize::try_from(offset).map_err(|_| short_read())?;
        let end = start.checked_add(buf.len()).ok_or_else(short_read)?;
        let bytes = content.get(start..end).ok_or_else(short_read)?;
        buf.copy_from_slice(bytes);
        Ok(())
    }
}

/// Directory accessor for [`MemoryFileSystem`].
pub struct MemoryDirAccess {
    state: Arc<RwLock<MemoryState>>,
    pending: VecDeque<String>,
}

impl DirAccess for MemoryDirAccess {
    fn open(&mut self, path: &str, entry: &EntryInfo) -> io::Result<()> {
        self.pending.clear();
        if entry.kind != EntryKind::Folder {
            return Err(not_a_directory(path));
        }
        let state = self.state.read();
        let folder = state.entries.get(path).ok_or_else(|| not_found(path))?;
        if folder.kind != EntryKind::Folder {
            return Err(not_a_directory(path));
        }
        self.pending.extend(folder.children.iter().cloned());
        Ok(())
    }

    fn next_name(&mut self) -> Option<String> {
        self.pending.pop_front()
    }
}

fn split_path(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once(SEPARATOR)
        .filter(|(parent, name)| !parent.is_empty() && !name.is_empty())
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such entry: {}", path))
}

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

fn short_read() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of file")
}
