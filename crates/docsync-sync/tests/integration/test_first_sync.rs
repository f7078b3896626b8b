//! First sync: no baseline on either side

use docsync_core::domain::conflict::Resolution;
use docsync_sync::SyncError;

use crate::common::{Fixture, ScriptedResolver};

#[tokio::test]
async fn test_first_sync_merges_both_sides() {
    let fx = Fixture::new();
    fx.write_remote("a.pdf", b"0123456789");
    fx.write_remote("books/deep/c.pdf", b"ccc");
    fx.write_local("b.pdf", b"bb");
    fx.write_local("notes/d.pdf", b"dddd");

    let report = fx.sync().await;

    assert!(report.first_sync);
    assert_eq!(report.downloads, 2);
    assert_eq!(report.uploads, 2);
    assert_eq!(report.folders_created_local, 2);
    assert_eq!(report.folders_created_remote, 1);
    assert_eq!(report.deleted_local + report.deleted_remote, 0);
    assert!(report.persisted_local && report.persisted_remote);

    assert_eq!(fx.read_local("a.pdf").unwrap(), b"0123456789");
    assert_eq!(fx.read_local("books/deep/c.pdf").unwrap(), b"ccc");
    assert_eq!(fx.read_remote("b.pdf").unwrap(), b"bb");
    assert_eq!(fx.read_remote("notes/d.pdf").unwrap(), b"dddd");
    assert!(fx.local_dir.join(".sync_state_local").exists());
    assert!(fx.local_dir.join(".sync_state_remote").exists());
}

#[tokio::test]
async fn test_second_pass_is_a_no_op() {
    let fx = Fixture::new();
    fx.write_remote("a.pdf", b"0123456789");
    fx.write_local("b.pdf", b"bb");
    fx.sync().await;

    let report = fx.sync().await;
    assert!(!report.first_sync);
    assert_eq!(report.changes(), 0);
    assert_eq!(report.conflicts_asked, 0);
    // state files stay out of the remote store
    assert!(fx.read_remote(".sync_state_local").is_none());
}

#[tokio::test]
async fn test_first_sync_remote_wins_without_asking() {
    let fx = Fixture::new();
    fx.write_remote("a.pdf", b"remote");
    fx.write_local("a.pdf", b"local copy");
    let resolver = ScriptedResolver::answering(&[Resolution::Local]);

    let report = fx.sync_with(resolver.clone()).await;

    assert_eq!(report.downloads, 1);
    assert_eq!(report.uploads, 0);
    assert!(resolver.asked().is_empty());
    assert_eq!(fx.read_local("a.pdf").unwrap(), b"remote");
}

#[tokio::test]
async fn test_lost_baseline_deletes_nothing() {
    let fx = Fixture::new();
    fx.write_remote("a.pdf", b"aaa");
    fx.write_local("b.pdf", b"bbb");
    fx.sync().await;

    std::fs::remove_file(fx.local_dir.join(".sync_state_remote")).unwrap();
    std::fs::remove_file(fx.local_dir.join("b.pdf")).unwrap();

    let report = fx.sync().await;
    assert!(report.first_sync);
    assert_eq!(report.deleted_remote, 0);
    // without history the local absence reads as "new remotely"
    assert_eq!(fx.read_local("b.pdf").unwrap(), b"bbb");
}

#[tokio::test]
async fn test_missing_remote_root_is_created() {
    let fx = Fixture::new();
    std::fs::remove_dir_all(fx.remote_base().join("Document")).unwrap();
    fx.write_local("a.pdf", b"aaa");

    let report = fx.sync().await;
    assert_eq!(report.uploads, 1);
    assert_eq!(fx.read_remote("a.pdf").unwrap(), b"aaa");
}

#[tokio::test]
async fn test_missing_local_root_is_fatal() {
    let fx = Fixture::new();
    fx.write_local("a.pdf", b"aaa");
    fx.sync().await;

    let moved = fx.local_dir.with_file_name("elsewhere");
    std::fs::rename(&fx.local_dir, &moved).unwrap();

    let result = fx.synchronizer(ScriptedResolver::answering(&[])).run().await;
    assert!(matches!(result, Err(SyncError::PathNotFound(_))));
    assert_eq!(fx.read_remote("a.pdf").unwrap(), b"aaa");
}

#[tokio::test]
async fn test_filters_limit_the_local_side() {
    let fx = Fixture::new();
    fx.write_local("a.pdf", b"aaa");
    fx.write_local("notes.txt", b"t");
    fx.write_local("drafts/x.pdf", b"x");

    let report = fx.sync_filtered(&["pdf"], &["drafts"]).await;
    assert_eq!(report.uploads, 1);
    assert!(fx.read_remote("a.pdf").is_some());
    assert!(fx.read_remote("notes.txt").is_none());
    assert!(fx.read_remote("drafts/x.pdf").is_none());
}

#[tokio::test]
async fn test_filters_limit_the_remote_side() {
    let fx = Fixture::new();
    fx.write_local("drafts/x.pdf", b"my private unsynced draft, long");
    fx.write_remote("drafts/x.pdf", b"r");
    fx.write_remote("notes.txt", b"rr");
    fx.write_remote(".hidden.pdf", b"h");
    fx.write_remote("a.pdf", b"aaa");

    let report = fx.sync_filtered(&["pdf"], &["drafts"]).await;
    assert_eq!(report.downloads, 1);
    assert_eq!(report.folders_created_local, 0);
    assert_eq!(fx.read_local("a.pdf").unwrap(), b"aaa");
    assert_eq!(fx.read_local("drafts/x.pdf").unwrap(), b"my private unsynced draft, long");
    assert!(fx.read_local("notes.txt").is_none());
    assert!(fx.read_local(".hidden.pdf").is_none());

    // Filtered remote entries are outside the baseline, so removing them
    // is not a deletion to propagate
    std::fs::remove_dir_all(fx.remote_root().join("drafts")).unwrap();
    std::fs::remove_file(fx.remote_root().join("notes.txt")).unwrap();
    let report = fx.sync_filtered(&["pdf"], &["drafts"]).await;
    assert!(!report.first_sync);
    assert_eq!(report.changes(), 0);
    assert_eq!(fx.read_local("drafts/x.pdf").unwrap(), b"my private unsynced draft, long");
}
