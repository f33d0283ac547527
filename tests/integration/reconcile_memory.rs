use fsmirror::fs::memory::MemoryFileSystem;
use fsmirror::fs::{FileAccess, FileSystemAccess};
use fsmirror::sync::UnmatchedReason;
use fsmirror::tree::{FileFingerprint, FingerprintConfig};
use fsmirror::{AllowAll, LocalNode, LocalSync, SyncConfig};

fn new_sync(fs: &MemoryFileSystem) -> LocalSync<MemoryFileSystem> {
    LocalSync::new(
        fs.clone(),
        fs.root(),
        &SyncConfig::default(),
        &FingerprintConfig::default(),
    )
}

fn fingerprint_of(fs: &MemoryFileSystem, path: &str) -> Option<FileFingerprint> {
    let mut file = fs.new_file_access();
    let info = file.open(path).unwrap();
    Some(FileFingerprint::compute(&mut file, &info, &FingerprintConfig::default()).unwrap())
}

#[test]
fn assigns_ids_to_every_file_of_a_prebuilt_tree() {
    // d/{d_0/{f_0_0, f_0_1}, d_1/{f_1_0, d_1_1/{f_1_1_0}}, f_2}
    let fs = MemoryFileSystem::new("d");
    fs.add_folder("d/d_0").unwrap();
    fs.add_file("d/d_0/f_0_0", b"a", 1).unwrap();
    fs.add_file("d/d_0/f_0_1", b"b", 1).unwrap();
    fs.add_folder("d/d_1").unwrap();
    fs.add_file("d/d_1/f_1_0", b"c", 1).unwrap();
    fs.add_folder("d/d_1/d_1_1").unwrap();
    fs.add_file("d/d_1/d_1_1/f_1_1_0", b"d", 1).unwrap();
    fs.add_file("d/f_2", b"e", 1).unwrap();

    let mut sync = new_sync(&fs);
    assert!(sync.options().require_fingerprint);
    let tree = sync.tree_mut();
    let d = tree.root();
    let d_0 = tree.add_folder(d, "d_0").unwrap();
    let f_0_0 = tree
        .add_file(d_0, "f_0_0", fingerprint_of(&fs, "d/d_0/f_0_0"))
        .unwrap();
    let f_0_1 = tree
        .add_file(d_0, "f_0_1", fingerprint_of(&fs, "d/d_0/f_0_1"))
        .unwrap();
    let d_1 = tree.add_folder(d, "d_1").unwrap();
    let f_1_0 = tree
        .add_file(d_1, "f_1_0", fingerprint_of(&fs, "d/d_1/f_1_0"))
        .unwrap();
    let d_1_1 = tree.add_folder(d_1, "d_1_1").unwrap();
    let f_1_1_0 = tree
        .add_file(d_1_1, "f_1_1_0", fingerprint_of(&fs, "d/d_1/d_1_1/f_1_1_0"))
        .unwrap();
    let f_2 = tree.add_file(d, "f_2", fingerprint_of(&fs, "d/f_2")).unwrap();

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    assert!(report.created.is_empty());
    assert!(report.unmatched.is_empty());
    assert!(report.conflicts.is_empty());
    assert_eq!(report.files_assigned, 5);
    assert_eq!(report.folders_visited, 4);
    assert_eq!(sync.index().len(), 5);
    for folder in [d, d_0, d_1, d_1_1] {
        assert_eq!(sync.tree().get(folder).unwrap().fsid(), None);
    }
    for (file, path) in [
        (f_0_0, "d/d_0/f_0_0"),
        (f_0_1, "d/d_0/f_0_1"),
        (f_1_0, "d/d_1/f_1_0"),
        (f_1_1_0, "d/d_1/d_1_1/f_1_1_0"),
        (f_2, "d/f_2"),
    ] {
        let fsid = fs.fsid(path).unwrap();
        assert_eq!(sync.tree().get(file).unwrap().fsid(), Some(fsid));
        assert_eq!(sync.node_by_fsid(fsid), Some(file));
        assert_eq!(sync.local_path(file).as_deref(), Some(path));
    }
    assert!(sync.index().verify(sync.tree()).is_ok());
}

#[test]
fn vanished_subtree_loses_its_identities() {
    let fs = MemoryFileSystem::new("d");
    fs.add_folder("d/docs").unwrap();
    fs.add_file("d/docs/a", b"a", 1).unwrap();
    fs.add_file("d/keep", b"k", 1).unwrap();
    let mut sync = new_sync(&fs);
    sync.assign_filesystem_ids(&AllowAll).unwrap();
    let root = sync.tree().root();
    let docs = sync.tree().child_by_name(root, "docs").unwrap();
    let a = sync.tree().child_by_name(docs, "a").unwrap();

    fs.remove("d/docs").unwrap();
    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].node, docs);
    assert_eq!(report.unmatched[0].reason, UnmatchedReason::NotFound);
    assert_eq!(sync.tree().get(a).unwrap().fsid(), None);
    assert_eq!(sync.index().len(), 1);
    assert!(sync.index().verify(sync.tree()).is_ok());
}

#[test]
fn unreadable_file_is_reported_and_left_unindexed() {
    let fs = MemoryFileSystem::new("d");
    fs.add_file("d/locked", b"secret", 1).unwrap();
    fs.add_file("d/open", b"public", 1).unwrap();
    let mut sync = new_sync(&fs);
    sync.assign_filesystem_ids(&AllowAll).unwrap();
    let root = sync.tree().root();
    let locked = sync.tree().child_by_name(root, "locked").unwrap();

    fs.set_unreadable("d/locked", true).unwrap();
    let report = sync.rescan(&AllowAll).unwrap();

    assert_eq!(report.files_assigned, 1);
    assert_eq!(report.skipped, 1);
    assert!(report
        .unmatched
        .iter()
        .any(|u| u.node == locked && u.reason == UnmatchedReason::Unreadable));
    assert_eq!(sync.tree().get(locked).unwrap().fsid(), None);
}

#[test]
fn symlinks_are_never_adopted() {
    let fs = MemoryFileSystem::new("d");
    fs.add_symlink("d/link").unwrap();
    fs.add_file("d/real", b"r", 1).unwrap();
    let mut sync = new_sync(&fs);

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    let root = sync.tree().root();
    assert!(sync.tree().child_by_name(root, "link").is_none());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.files_assigned, 1);
}

#[test]
fn kind_change_is_unmatched() {
    let fs = MemoryFileSystem::new("d");
    fs.add_folder("d/thing").unwrap();
    let mut sync = new_sync(&fs);
    let root = sync.tree().root();
    let thing = sync.tree_mut().add_file(root, "thing", None).unwrap();

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].node, thing);
    assert_eq!(report.unmatched[0].reason, UnmatchedReason::KindMismatch);
    assert!(sync.index().is_empty());
}

#[test]
fn application_veto_keeps_entries_out() {
    let fs = MemoryFileSystem::new("d");
    fs.add_file("d/notes.txt", b"n", 1).unwrap();
    fs.add_file("d/cache.tmp", b"c", 1).unwrap();
    let mut sync = new_sync(&fs);
    let no_tmp = |_: &LocalNode, path: &str| !path.ends_with(".tmp");

    let report = sync.assign_filesystem_ids(&no_tmp).unwrap();

    let root = sync.tree().root();
    assert!(sync.tree().child_by_name(root, "cache.tmp").is_none());
    assert!(sync.tree().child_by_name(root, "notes.txt").is_some());
    assert_eq!(report.skipped, 1);
    assert_eq!(sync.index().len(), 1);
}

#[test]
fn decomposed_name_matches_composed_node() {
    let fs = MemoryFileSystem::new("d");
    fs.add_file("d/cafe\u{301}", b"coffee", 1).unwrap();
    let mut sync = new_sync(&fs);
    let root = sync.tree().root();
    let node = sync.tree_mut().add_file(root, "caf\u{e9}", None).unwrap();

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    assert!(report.created.is_empty());
    assert!(sync.tree().get(node).unwrap().fsid().is_some());
}

#[test]
fn report_summary_counts_everything() {
    let fs = MemoryFileSystem::new("d");
    fs.add_folder("d/sub").unwrap();
    fs.add_file("d/sub/a", b"a", 1).unwrap();
    fs.add_symlink("d/link").unwrap();
    let mut sync = new_sync(&fs);

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();
    let summary = report.summary();

    assert_eq!(summary["files_assigned"], 1);
    assert_eq!(summary["folders_visited"], 2);
    assert_eq!(summary["created"], 2);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["conflicts"], 0);
}

#[test]
fn equivalent_sibling_names_on_fresh_scan_index_one_file() {
    for (first, second) in [("caf\u{e9}", "cafe\u{301}"), ("cafe\u{301}", "caf\u{e9}")] {
        let fs = MemoryFileSystem::new("d");
        fs.add_file(&format!("d/{}", first), b"composed", 1).unwrap();
        fs.add_file(&format!("d/{}", second), b"decomposed!", 2).unwrap();
        let mut sync = new_sync(&fs);

        let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

        assert!(!report.needs_full_resolution());
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.files_assigned, 1);
        assert_eq!(sync.tree().len(), 2);
        let first_fsid = fs.fsid(&format!("d/{}", first)).unwrap();
        assert_eq!(sync.node_by_fsid(first_fsid), Some(report.created[0]));
        assert_eq!(sync.tree().get(report.created[0]).unwrap().name(), first);
        assert!(sync.index().verify(sync.tree()).is_ok());
    }
}

#[test]
fn exact_name_wins_over_equivalent_sibling() {
    let fs = MemoryFileSystem::new("d");
    // The decomposed entry is enumerated first.
    fs.add_file("d/cafe\u{301}", b"other file", 9).unwrap();
    let fsid = fs.add_file("d/caf\u{e9}", b"known", 1).unwrap();
    let mut sync = new_sync(&fs);
    let root = sync.tree().root();
    let known = fingerprint_of(&fs, "d/caf\u{e9}");
    let node = sync.tree_mut().add_file(root, "caf\u{e9}", known).unwrap();

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    assert!(report.conflicts.is_empty());
    assert!(report.created.is_empty());
    assert_eq!(report.skipped, 1);
    assert_eq!(sync.node_by_fsid(fsid), Some(node));
}
