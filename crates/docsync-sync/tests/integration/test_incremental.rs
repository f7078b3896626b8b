//! Passes with a baseline: modifications and deletions

use crate::common::Fixture;

async fn synced() -> Fixture {
    let fx = Fixture::new();
    fx.write_remote("a.pdf", b"aaaa");
    fx.write_remote("books/b.pdf", b"bbbb");
    fx.write_local("c.pdf", b"cccc");
    fx.sync().await;
    fx
}

#[tokio::test]
async fn test_local_modification_is_uploaded() {
    let fx = synced().await;
    fx.write_local("a.pdf", b"aaaa plus an annotation");

    let report = fx.sync().await;
    assert_eq!(report.uploads, 1);
    assert_eq!(report.downloads, 0);
    assert_eq!(report.conflicts_asked, 0);
    assert_eq!(fx.read_remote("a.pdf").unwrap(), b"aaaa plus an annotation");
}

#[tokio::test]
async fn test_remote_modification_is_downloaded() {
    let fx = synced().await;
    fx.write_remote("books/b.pdf", b"bbbb with ink");

    let report = fx.sync().await;
    assert_eq!(report.downloads, 1);
    assert_eq!(report.uploads, 0);
    assert_eq!(fx.read_local("books/b.pdf").unwrap(), b"bbbb with ink");
}

#[tokio::test]
async fn test_local_deletion_is_propagated() {
    let fx = synced().await;
    std::fs::remove_file(fx.local_dir.join("c.pdf")).unwrap();
    std::fs::remove_dir_all(fx.local_dir.join("books")).unwrap();

    let report = fx.sync().await;
    assert_eq!(report.deleted_remote, 3);
    assert!(fx.read_remote("c.pdf").is_none());
    assert!(!fx.remote_root().join("books").exists());
    assert!(fx.remote_root().is_dir());

    let report = fx.sync().await;
    assert_eq!(report.changes(), 0);
}

#[tokio::test]
async fn test_remote_deletion_is_propagated() {
    let fx = synced().await;
    std::fs::remove_dir_all(fx.remote_root().join("books")).unwrap();
    std::fs::remove_file(fx.remote_root().join("a.pdf")).unwrap();

    let report = fx.sync().await;
    assert_eq!(report.deleted_local, 3);
    assert!(fx.read_local("a.pdf").is_none());
    assert!(!fx.local_dir.join("books").exists());
    assert_eq!(fx.read_local("c.pdf").unwrap(), b"cccc");
}

#[tokio::test]
async fn test_local_deletion_wins_over_remote_modification() {
    let fx = synced().await;
    std::fs::remove_file(fx.local_dir.join("a.pdf")).unwrap();
    fx.write_remote("a.pdf", b"aaaa, edited on the reader");

    let report = fx.sync().await;
    assert_eq!(report.deleted_remote, 1);
    assert_eq!(report.downloads, 0);
    assert!(fx.read_remote("a.pdf").is_none());
    assert!(fx.read_local("a.pdf").is_none());
}

#[tokio::test]
async fn test_remote_deletion_wins_over_local_modification() {
    let fx = synced().await;
    std::fs::remove_file(fx.remote_root().join("c.pdf")).unwrap();
    fx.write_local("c.pdf", b"cccc, edited locally");

    let report = fx.sync().await;
    assert_eq!(report.deleted_local, 1);
    assert_eq!(report.uploads, 0);
    assert!(fx.read_local("c.pdf").is_none());
    assert!(fx.read_remote("c.pdf").is_none());
}

#[tokio::test]
async fn test_new_entries_after_baseline() {
    let fx = synced().await;
    fx.write_local("later/e.pdf", b"e");
    fx.write_remote("books/f.pdf", b"ff");

    let report = fx.sync().await;
    assert_eq!(report.uploads, 1);
    assert_eq!(report.downloads, 1);
    assert_eq!(report.folders_created_remote, 1);
    assert_eq!(fx.read_remote("later/e.pdf").unwrap(), b"e");
    assert_eq!(fx.read_local("books/f.pdf").unwrap(), b"ff");
}
