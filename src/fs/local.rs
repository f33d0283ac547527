//! Local filesystem access over `std::fs`.
//!
//! On Unix the inode number is reported as the filesystem identifier. Other
//! platforms report no identifier, which leaves every file to be matched by
//! name and fingerprint alone.

use super::{not_a_directory, not_open, DirAccess, EntryInfo, FileAccess, FileSystemAccess};
use crate::types::{EntryKind, FsId};
use std::fs::{self, File, Metadata, ReadDir};
use std::io;
use std::path::{Path, MAIN_SEPARATOR_STR};
use std::time::UNIX_EPOCH;
use tracing::warn;

/// Real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        LocalFileSystem
    }
}

impl FileSystemAccess for LocalFileSystem {
    type File = LocalFileAccess;
    type Dir = LocalDirAccess;

    fn new_file_access(&self) -> LocalFileAccess {
        LocalFileAccess { file: None }
    }

    fn new_dir_access(&self) -> LocalDirAccess {
        LocalDirAccess { entries: None }
    }

    fn local_to_path(&self, local: &str) -> String {
        dunce::simplified(Path::new(local))
            .to_string_lossy()
            .into_owned()
    }

    fn separator(&self) -> &str {
        MAIN_SEPARATOR_STR
    }
}

/// Entry accessor for [`LocalFileSystem`].
pub struct LocalFileAccess {
    file: Option<File>,
}

impl FileAccess for LocalFileAccess {
    fn open(&mut self, path: &str) -> io::Result<EntryInfo> {
        self.file = None;
        let metadata = fs::symlink_metadata(path)?;
        let info = entry_info(&metadata);
        if info.kind == EntryKind::File {
            self.file = Some(File::open(path)?);
        }
        Ok(info)
    }

    fn read_raw(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(not_open)?;
        read_exact_at(file, buf, offset)
    }
}

#[cfg(unix)]
fn read_exact_at(file: &mut File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(not(unix))]
fn read_exact_at(file: &mut File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::io::{Read, Seek, SeekFrom};
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf)
}

fn entry_info(metadata: &Metadata) -> EntryInfo {
    let file_type = metadata.file_type();
    let kind = if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Folder
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };

    // Pre-epoch, unavailable or out-of-range times all read as 0.
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or(0);

    EntryInfo {
        kind,
        fsid: platform_fsid(metadata),
        size: if kind == EntryKind::File { metadata.len() } else { 0 },
        mtime,
    }
}

#[cfg(unix)]
fn platform_fsid(metadata: &Metadata) -> Option<FsId> {
    use std::os::unix::fs::MetadataExt;
    Some(FsId(metadata.ino()))
}

#[cfg(not(unix))]
fn platform_fsid(_metadata: &Metadata) -> Option<FsId> {
    None
}

/// Directory accessor for [`LocalFileSystem`].
pub struct LocalDirAccess {
    entries: Option<ReadDir>,
}

impl DirAccess for LocalDirAccess {
    fn open(&mut self, path: &str, entry: &EntryInfo) -> io::Result<()> {
        self.entries = None;
        if entry.kind != EntryKind::Folder {
            return Err(not_a_directory(path));
        }
        self.entries = Some(fs::read_dir(path)?);
        Ok(())
    }

    fn next_name(&mut self) -> Option<String> {
        let entries = self.entries.as_mut()?;
        loop {
            match entries.next() {
                Some(Ok(entry)) => match entry.file_name().into_string() {
                    Ok(name) => return Some(name),
                    Err(raw) => {
                        warn!(name = ?raw, "Skipping entry with non-UTF-8 name");
                    }
                },
                Some(Err(e)) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                }
                None => {
                    self.entries = None;
                    return None;
                }
            }
        }
    }
}
