//! File fingerprints
//!
//! A fingerprint is the proof that two observations are of the same file,
//! independent of the filesystem identifier: size, modification time and a
//! BLAKE3 checksum over the file's content. Small files are hashed in full;
//! larger files are hashed over evenly spaced sample blocks so that
//! fingerprinting cost stays bounded.

use crate::fs::{EntryInfo, FileAccess};
use crate::types::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Content-derived signature of a file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub size: u64,
    pub mtime: i64,
    pub checksum: Hash,
}

impl FileFingerprint {
    /// Compute the fingerprint of the file currently open in `file`.
    ///
    /// `info` must be the result of that `open` call.
    pub fn compute<F: FileAccess + ?Sized>(
        file: &mut F,
        info: &EntryInfo,
        config: &FingerprintConfig,
    ) -> io::Result<Self> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&info.size.to_le_bytes());

        if info.size <= config.full_read_limit.max(config.sample_size as u64) {
            let len = usize::try_from(info.size)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "file too large"))?;
            let mut buf = vec![0u8; len];
            if len > 0 {
                file.read_raw(&mut buf, 0)?;
            }
            hasher.update(&buf);
        } else {
            let mut buf = vec![0u8; config.sample_size];
            for offset in sample_offsets(info.size, config) {
                file.read_raw(&mut buf, offset)?;
                hasher.update(&buf);
            }
        }

        Ok(Self {
            size: info.size,
            mtime: info.mtime,
            checksum: *hasher.finalize().as_bytes(),
        })
    }

    /// Size and modification time agree with `info`.
    pub fn metadata_matches(&self, info: &EntryInfo) -> bool {
        self.size == info.size && self.mtime == info.mtime
    }

    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }
}

impl fmt::Debug for FileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileFingerprint")
            .field("size", &self.size)
            .field("mtime", &self.mtime)
            .field("checksum", &self.checksum_hex())
            .finish()
    }
}

/// Offsets of the sample blocks for a file of `size` bytes.
///
/// The first block starts at 0 and the last one ends at `size`; the rest are
/// spread evenly in between.
fn sample_offsets(size: u64, config: &FingerprintConfig) -> Vec<u64> {
    let block = config.sample_size as u64;
    let count = config.sample_count.max(2) as u64;
    let span = size.saturating_sub(block);
    (0..count).map(|i| span * i / (count - 1)).collect()
}

/// Fingerprint sampling parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Files up to this size are hashed completely.
    #[serde(default = "default_full_read_limit")]
    pub full_read_limit: u64,

    /// Number of sample blocks for larger files.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Size of each sample block in bytes.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_full_read_limit() -> u64 {
    16 * 1024
}

fn default_sample_count() -> usize {
    32
}

fn default_sample_size() -> usize {
    512
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            full_read_limit: default_full_read_limit(),
            sample_count: default_sample_count(),
            sample_size: default_sample_size(),
        }
    }
}
