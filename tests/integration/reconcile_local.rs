use fsmirror::fs::local::LocalFileSystem;
use fsmirror::tree::FingerprintConfig;
use fsmirror::{AllowAll, ApiError, LocalSync, ReconcileError, SyncConfig};
use std::fs;
use tempfile::TempDir;

fn local_sync(temp: &TempDir) -> LocalSync<LocalFileSystem> {
    LocalSync::new(
        LocalFileSystem::new(),
        temp.path().to_str().unwrap(),
        &SyncConfig::default(),
        &FingerprintConfig::default(),
    )
}

#[test]
fn missing_sync_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("gone");
    let mut sync = LocalSync::new(
        LocalFileSystem::new(),
        missing.to_str().unwrap(),
        &SyncConfig::default(),
        &FingerprintConfig::default(),
    );

    let err = sync.assign_filesystem_ids(&AllowAll).unwrap_err();
    assert!(matches!(err, ReconcileError::RootUnavailable { .. }));
    assert!(sync.index().is_empty());
}

#[test]
fn file_as_sync_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain");
    fs::write(&file, b"x").unwrap();
    let mut sync = LocalSync::new(
        LocalFileSystem::new(),
        file.to_str().unwrap(),
        &SyncConfig::default(),
        &FingerprintConfig::default(),
    );

    let err = sync.assign_filesystem_ids(&AllowAll).unwrap_err();
    assert!(matches!(err, ReconcileError::RootNotAFolder(_)));
}

#[test]
fn debris_folder_is_skipped_on_disk() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join(".debris")).unwrap();
    fs::write(temp.path().join(".debris").join("trash"), b"t").unwrap();
    fs::write(temp.path().join("keep"), b"k").unwrap();
    let mut sync = local_sync(&temp);

    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    let root = sync.tree().root();
    assert!(sync.tree().child_by_name(root, ".debris").is_none());
    assert!(sync.tree().child_by_name(root, "keep").is_some());
    assert_eq!(report.skipped, 1);
}

#[cfg(unix)]
#[test]
fn rename_on_disk_keeps_inode_identity() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("sub").join("a.txt"), b"hello").unwrap();
    let mut sync = local_sync(&temp);
    sync.assign_filesystem_ids(&AllowAll).unwrap();
    let root = sync.tree().root();
    let sub = sync.tree().child_by_name(root, "sub").unwrap();
    let a = sync.tree().child_by_name(sub, "a.txt").unwrap();
    let fsid = sync.tree().get(a).unwrap().fsid().unwrap();

    fs::rename(
        temp.path().join("sub").join("a.txt"),
        temp.path().join("sub").join("b.txt"),
    )
    .unwrap();
    let report = sync.assign_filesystem_ids(&AllowAll).unwrap();

    let b = sync.tree().child_by_name(sub, "b.txt").unwrap();
    assert_eq!(sync.node_by_fsid(fsid), Some(b));
    assert_eq!(report.evicted, vec![a]);
    assert!(sync.index().verify(sync.tree()).is_ok());
}

#[cfg(unix)]
#[test]
fn rewritten_file_is_a_conflict() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("notes");
    fs::write(&path, b"version one").unwrap();
    let mut sync = local_sync(&temp);
    sync.assign_filesystem_ids(&AllowAll).unwrap();

    fs::write(&path, b"version two").unwrap();
    let report = sync.rescan(&AllowAll).unwrap();

    assert_eq!(report.conflicts.len(), 1);
    assert!(sync.index().is_empty());
}

#[test]
fn open_local_applies_root_config_and_scans() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".fsmirror.toml"),
        "[sync]\ndebris_dir = \".trash\"\n",
    )
    .unwrap();
    fs::create_dir(temp.path().join(".trash")).unwrap();
    fs::write(temp.path().join(".trash").join("old"), b"o").unwrap();
    fs::write(temp.path().join("kept"), b"k").unwrap();

    let (sync, report) = LocalSync::open_local(temp.path(), &AllowAll).unwrap();

    assert!(sync.debris_path().ends_with(".trash"));
    let root = sync.tree().root();
    assert!(sync.tree().child_by_name(root, ".trash").is_none());
    assert!(sync.tree().child_by_name(root, "kept").is_some());
    assert_eq!(report.skipped, 1);
}

#[test]
fn open_local_on_missing_root_is_an_io_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("gone");

    let err = LocalSync::open_local(&missing, &AllowAll).unwrap_err();
    assert!(matches!(err, ApiError::IoError(_)));
}

#[test]
fn open_local_on_file_root_is_a_reconcile_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain");
    fs::write(&file, b"x").unwrap();

    let err = LocalSync::open_local(&file, &AllowAll).unwrap_err();
    assert!(matches!(
        err,
        ApiError::Reconcile(ReconcileError::RootNotAFolder(_))
    ));
}
