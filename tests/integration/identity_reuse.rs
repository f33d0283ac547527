use fsmirror::fs::memory::MemoryFileSystem;
use fsmirror::sync::UnmatchedReason;
use fsmirror::tree::FingerprintConfig;
use fsmirror::{AllowAll, LocalSync, SyncConfig};

fn new_sync(fs: &MemoryFileSystem, require_fingerprint: bool) -> LocalSync<MemoryFileSystem> {
    let config = SyncConfig {
        require_fingerprint,
        ..SyncConfig::default()
    };
    LocalSync::new(fs.clone(), fs.root(), &config, &FingerprintConfig::default())
}

#[test]
fn renamed_file_moves_identity_to_new_node() {
    let fs = MemoryFileSystem::new("d");
    let fsid = fs.add_file("d/old", b"payload", 3).unwrap();
    let mut sync = new_sync(&fs, true);
    sync.assign_filesystem_ids(&AllowAll).unwrap();
    let root = sync.tree().root();
    let old = sync.tree().child_by_name(root, "old").unwrap();

    fs.remove("d/old").unwrap();
    fs.add_file("d/new", b"payload", 3).unwrap();
    fs.set_fsid("d/new", Some(fsid)).unwrap();
    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    let new = sync.tree().child_by_name(root, "new").unwrap();
    assert_eq!(report.created, vec![new]);
    assert_eq!(report.evicted, vec![old]);
    assert_eq!(sync.node_by_fsid(fsid), Some(new));
    assert_eq!(sync.tree().get(old).unwrap().fsid(), None);
    assert!(report
        .unmatched
        .iter()
        .any(|u| u.node == old && u.reason == UnmatchedReason::NotFound));
    assert!(sync.index().verify(sync.tree()).is_ok());
}

#[test]
fn reused_identifier_with_new_content_is_a_conflict() {
    let fs = MemoryFileSystem::new("d");
    let fsid = fs.add_file("d/report", b"first draft", 10).unwrap();
    let mut sync = new_sync(&fs, true);
    sync.assign_filesystem_ids(&AllowAll).unwrap();
    let root = sync.tree().root();
    let node = sync.tree().child_by_name(root, "report").unwrap();

    // Deleted and recreated under the same name; the filesystem hands out the old id.
    fs.remove("d/report").unwrap();
    fs.add_file("d/report", b"unrelated file", 20).unwrap();
    fs.set_fsid("d/report", Some(fsid)).unwrap();
    let report = sync.rescan(&AllowAll).unwrap();

    assert_eq!(report.conflicts, vec![node]);
    assert!(report.needs_full_resolution());
    assert_eq!(sync.node_by_fsid(fsid), None);
    assert_eq!(sync.tree().get(node).unwrap().fsid(), None);
}

#[test]
fn change_inside_sampled_block_of_large_file_is_detected() {
    let mut content = vec![7u8; 256 * 1024];
    let fs = MemoryFileSystem::new("d");
    fs.add_file("d/big.bin", &content, 50).unwrap();
    let mut sync = new_sync(&fs, true);
    sync.assign_filesystem_ids(&AllowAll).unwrap();

    // First byte always falls inside the first sample block.
    content[0] = 8;
    fs.set_content("d/big.bin", &content, 50).unwrap();
    let report = sync.rescan(&AllowAll).unwrap();

    assert_eq!(report.conflicts.len(), 1);
    assert!(sync.index().is_empty());
}

#[test]
fn metadata_match_suffices_when_checksum_not_required() {
    let fs = MemoryFileSystem::new("d");
    let fsid = fs.add_file("d/f", b"aaaa", 5).unwrap();
    let mut sync = new_sync(&fs, false);
    sync.assign_filesystem_ids(&AllowAll).unwrap();

    fs.set_content("d/f", b"bbbb", 5).unwrap();
    let report = sync.rescan(&AllowAll).unwrap();

    assert!(report.conflicts.is_empty());
    assert_eq!(report.files_assigned, 1);
    assert!(sync.node_by_fsid(fsid).is_some());
}

#[test]
fn size_change_is_a_conflict_even_when_checksum_not_required() {
    let fs = MemoryFileSystem::new("d");
    fs.add_file("d/f", b"short", 5).unwrap();
    let mut sync = new_sync(&fs, false);
    sync.assign_filesystem_ids(&AllowAll).unwrap();

    fs.set_content("d/f", b"much longer now", 5).unwrap();
    let report = sync.rescan(&AllowAll).unwrap();

    assert_eq!(report.conflicts.len(), 1);
    assert!(sync.index().is_empty());
}

#[test]
fn hidden_identifier_leaves_file_unindexed() {
    let fs = MemoryFileSystem::new("d");
    fs.add_file("d/f", b"x", 1).unwrap();
    fs.set_fsid("d/f", None).unwrap();
    let mut sync = new_sync(&fs, true);

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    assert_eq!(report.files_assigned, 0);
    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].reason, UnmatchedReason::NoIdentifier);
    assert!(sync.index().is_empty());
}
