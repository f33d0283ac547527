//! Identity Reconciliation
//!
//! Walks the real filesystem in lock-step with a mirrored subtree, matching
//! entries to nodes by name, and re-establishes file identities. A file
//! node only receives the identifier the filesystem reports for it when the
//! content fingerprint confirms it is the same file, so a reused identifier
//! or a replaced file is never mistaken for the node's old identity.
//! Folders are matched by name alone and never carry an identifier.
//!
//! Problems with single entries (vanished, unreadable, wrong kind, symbolic
//! links) are recorded in the [`ReconcileReport`] and do not stop the walk.
//! Only failures at the subtree root are errors.

use crate::app::SyncApp;
use crate::error::{ReconcileError, TreeError};
use crate::filter::is_path_syncable;
use crate::fs::{DirAccess, EntryInfo, FileAccess, FileSystemAccess};
use crate::index::FsidIndex;
use crate::tree::{FileFingerprint, FingerprintConfig, LocalTree, NodeHandle};
use crate::types::{EntryKind, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::io;
use tracing::{debug, info, warn};

/// Parameters of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Local path of the excluded (debris) subtree.
    pub excluded_root: String,

    /// Require a content checksum match for nodes with a known fingerprint.
    /// When false, matching size and modification time suffice.
    pub require_fingerprint: bool,

    pub fingerprint: FingerprintConfig,
}

/// Why a node could not be matched to a real entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnmatchedReason {
    NotFound,
    KindMismatch,
    Unreadable,
    /// Symbolic link or special file.
    Unsupported,
    /// The filesystem reported no identifier for the file.
    NoIdentifier,
    /// Path lies in the excluded subtree or was vetoed by the application.
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unmatched {
    pub node: NodeHandle,
    pub reason: UnmatchedReason,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// File nodes that received an identifier.
    pub files_assigned: usize,
    pub folders_visited: usize,
    /// Nodes created for entries the tree did not know about.
    pub created: Vec<NodeHandle>,
    /// Nodes left without an identity; candidates for removal by the caller.
    pub unmatched: Vec<Unmatched>,
    /// File nodes whose fingerprint disagrees with the real file.
    pub conflicts: Vec<NodeHandle>,
    /// Nodes that lost their identifier to another node.
    pub evicted: Vec<NodeHandle>,
    /// Real entries not admitted (excluded, vetoed, unsupported, unreadable).
    pub skipped: usize,
}

impl ReconcileReport {
    /// Some file changed underneath its node and needs full resolution.
    pub fn needs_full_resolution(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn summary(&self) -> serde_json::Value {
        json!({
            "files_assigned": self.files_assigned,
            "folders_visited": self.folders_visited,
            "created": self.created.len(),
            "unmatched": self.unmatched.len(),
            "conflicts": self.conflicts.len(),
            "evicted": self.evicted.len(),
            "skipped": self.skipped,
        })
    }
}

/// Assign filesystem identifiers to the file nodes under `subtree_root`.
///
/// `root_path` is the local path of `subtree_root`. Fails when that path
/// cannot be opened as a directory or when `app` rejects it; in both cases
/// the tree and the index are left untouched.
pub fn assign_filesystem_ids<A, F>(
    tree: &mut LocalTree,
    subtree_root: NodeHandle,
    root_path: &str,
    app: &A,
    fs: &F,
    index: &mut FsidIndex,
    options: &ReconcileOptions,
) -> Result<ReconcileReport, ReconcileError>
where
    A: SyncApp + ?Sized,
    F: FileSystemAccess,
{
    let root_path = fs.local_to_path(root_path);
    let root_node = tree
        .get(subtree_root)
        .ok_or(TreeError::StaleHandle)?;
    if !root_node.is_folder() {
        return Err(ReconcileError::SubtreeNotAFolder);
    }
    if !app.is_syncable(root_node, &root_path) {
        return Err(ReconcileError::RootVetoed(root_path));
    }

    let mut file = fs.new_file_access();
    let root_info = file
        .open(&root_path)
        .map_err(|source| ReconcileError::RootUnavailable {
            path: root_path.clone(),
            source,
        })?;
    if root_info.kind != EntryKind::Folder {
        return Err(ReconcileError::RootNotAFolder(root_path));
    }
    let mut dir = fs.new_dir_access();
    dir.open(&root_path, &root_info)
        .map_err(|source| ReconcileError::RootUnavailable {
            path: root_path.clone(),
            source,
        })?;

    let mut pass = Pass {
        tree,
        index,
        app,
        fs,
        options,
        file,
        report: ReconcileReport::default(),
    };

    let mut pending: Vec<(NodeHandle, String, EntryInfo)> = Vec::new();
    pass.visit_folder(subtree_root, &root_path, &mut dir, &mut pending)?;

    while let Some((folder, path, info)) = pending.pop() {
        if let Err(e) = dir.open(&path, &info) {
            warn!(path = %path, error = %e, "Could not enumerate folder");
            pass.unmatched(folder, reason_for(&e));
            continue;
        }
        pass.visit_folder(folder, &path, &mut dir, &mut pending)?;
    }

    let report = pass.report;
    info!(root = %root_path, summary = %report.summary(), "Reconciliation pass complete");
    Ok(report)
}

struct Pass<'a, A: ?Sized, F: FileSystemAccess> {
    tree: &'a mut LocalTree,
    index: &'a mut FsidIndex,
    app: &'a A,
    fs: &'a F,
    options: &'a ReconcileOptions,
    file: F::File,
    report: ReconcileReport,
}

impl<'a, A, F> Pass<'a, A, F>
where
    A: SyncApp + ?Sized,
    F: FileSystemAccess,
{
    /// Match the entries of an open directory against the children of `folder`.
    ///
    /// Files are resolved immediately; matched subfolders are queued on `pending`.
    fn visit_folder(
        &mut self,
        folder: NodeHandle,
        path: &str,
        dir: &mut F::Dir,
        pending: &mut Vec<(NodeHandle, String, EntryInfo)>,
    ) -> Result<(), ReconcileError> {
        self.report.folders_visited += 1;
        let fs = self.fs;
        let separator = fs.separator();
        let mut seen = HashSet::new();

        let names: Vec<String> = std::iter::from_fn(|| dir.next_name()).collect();
        let listed: HashSet<&str> = names.iter().map(String::as_str).collect();

        for name in &names {
            let child_path = fs.join(path, name);
            let existing = match self.match_child(folder, name, &listed) {
                ChildMatch::Node(child) if seen.contains(&child) => {
                    debug!(path = %child_path, ?child, "Node already matched by an equivalent name");
                    self.report.skipped += 1;
                    continue;
                }
                ChildMatch::Node(child) => Some(child),
                ChildMatch::Vacant => None,
                ChildMatch::Shadowed => {
                    debug!(path = %child_path, "Skipping entry shadowed by an exactly named sibling");
                    self.report.skipped += 1;
                    continue;
                }
            };

            if !self.admits(folder, &child_path, separator) {
                debug!(path = %child_path, "Skipping excluded entry");
                self.report.skipped += 1;
                if let Some(child) = existing {
                    seen.insert(child);
                    self.unmatched(child, UnmatchedReason::Excluded);
                }
                continue;
            }

            let info = match self.file.open(&child_path) {
                Ok(info) => info,
                Err(e) => {
                    debug!(path = %child_path, error = %e, "Entry could not be opened");
                    self.report.skipped += 1;
                    if let Some(child) = existing {
                        seen.insert(child);
                        self.unmatched(child, reason_for(&e));
                    }
                    continue;
                }
            };

            let Some(kind) = info.kind.node_kind() else {
                debug!(path = %child_path, kind = ?info.kind, "Skipping unsupported entry");
                self.report.skipped += 1;
                if let Some(child) = existing {
                    seen.insert(child);
                    self.unmatched(child, UnmatchedReason::Unsupported);
                }
                continue;
            };

            let child = match existing {
                Some(child) => {
                    seen.insert(child);
                    let child_kind = self.tree.get(child).map(|n| n.kind());
                    if child_kind != Some(kind) {
                        debug!(path = %child_path, "Entry kind differs from node kind");
                        self.unmatched(child, UnmatchedReason::KindMismatch);
                        continue;
                    }
                    child
                }
                None => match self.tree.add_node(folder, kind, name, None) {
                    Ok(child) => {
                        debug!(path = %child_path, ?kind, "Adopted new entry");
                        seen.insert(child);
                        self.report.created.push(child);
                        child
                    }
                    Err(e) => {
                        warn!(path = %child_path, error = %e, "Could not mirror entry");
                        self.report.skipped += 1;
                        continue;
                    }
                },
            };

            match kind {
                NodeKind::Folder => pending.push((child, child_path, info)),
                NodeKind::File => self.visit_file(child, &child_path, &info)?,
            }
        }

        let missing: Vec<NodeHandle> = self
            .tree
            .get(folder)
            .map(|node| {
                node.children()
                    .iter()
                    .filter(|child| !seen.contains(*child))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        for child in missing {
            debug!(?child, "No real entry for node");
            self.unmatched(child, UnmatchedReason::NotFound);
        }
        Ok(())
    }

    /// Resolve an enumerated `name` to a child of `folder`.
    ///
    /// An exact name match wins. A node found only through name
    /// normalization is not used when an entry with its exact name is also
    /// listed in the same directory.
    fn match_child(&self, folder: NodeHandle, name: &str, listed: &HashSet<&str>) -> ChildMatch {
        let Some(child) = self.tree.child_by_name(folder, name) else {
            return ChildMatch::Vacant;
        };
        match self.tree.get(child).map(|node| node.name()) {
            Some(node_name) if node_name != name && listed.contains(node_name) => {
                ChildMatch::Shadowed
            }
            _ => ChildMatch::Node(child),
        }
    }

    fn admits(&self, folder: NodeHandle, child_path: &str, separator: &str) -> bool {
        if !is_path_syncable(child_path, &self.options.excluded_root, separator) {
            return false;
        }
        match self.tree.get(folder) {
            Some(node) => self.app.is_syncable(node, child_path),
            None => false,
        }
    }

    /// Confirm a file node against its real entry and assign the identifier.
    fn visit_file(
        &mut self,
        handle: NodeHandle,
        path: &str,
        info: &EntryInfo,
    ) -> Result<(), ReconcileError> {
        let Some(fsid) = info.fsid else {
            self.unmatched(handle, UnmatchedReason::NoIdentifier);
            return Ok(());
        };
        let prior = self
            .tree
            .get(handle)
            .and_then(|node| node.fingerprint().copied());

        match prior {
            Some(prior) => {
                if !prior.metadata_matches(info) {
                    self.conflict(handle, path);
                    return Ok(());
                }
                if self.options.require_fingerprint {
                    let current = match self.fingerprint(path, info) {
                        Some(current) => current,
                        None => {
                            self.unmatched(handle, UnmatchedReason::Unreadable);
                            return Ok(());
                        }
                    };
                    if current != prior {
                        self.conflict(handle, path);
                        return Ok(());
                    }
                }
            }
            None => {
                let Some(current) = self.fingerprint(path, info) else {
                    self.unmatched(handle, UnmatchedReason::Unreadable);
                    return Ok(());
                };
                self.tree.set_fingerprint(handle, Some(current))?;
            }
        }

        if let Some(evicted) = self.index.assign(self.tree, handle, fsid)? {
            self.report.evicted.push(evicted);
        }
        self.report.files_assigned += 1;
        debug!(path = %path, %fsid, "Assigned filesystem id");
        Ok(())
    }

    fn fingerprint(&mut self, path: &str, info: &EntryInfo) -> Option<FileFingerprint> {
        match FileFingerprint::compute(&mut self.file, info, &self.options.fingerprint) {
            Ok(fp) => Some(fp),
            Err(e) => {
                warn!(path = %path, error = %e, "Could not fingerprint file");
                None
            }
        }
    }

    fn conflict(&mut self, handle: NodeHandle, path: &str) {
        debug!(path = %path, "Fingerprint mismatch, identity not reassigned");
        self.index.clear(self.tree, handle);
        self.report.conflicts.push(handle);
    }

    /// Record `handle` as unmatched and strip any identity left in its subtree.
    fn unmatched(&mut self, handle: NodeHandle, reason: UnmatchedReason) {
        for node in self.tree.descendants(handle) {
            self.index.clear(self.tree, node);
        }
        self.report.unmatched.push(Unmatched {
            node: handle,
            reason,
        });
    }
}

enum ChildMatch {
    Node(NodeHandle),
    Vacant,
    /// Equivalent to a node whose exact name is listed separately.
    Shadowed,
}

fn reason_for(error: &io::Error) -> UnmatchedReason {
    match error.kind() {
        io::ErrorKind::NotFound => UnmatchedReason::NotFound,
        _ => UnmatchedReason::Unreadable,
    }
}
