//! Passes where some transfers fail

use crate::common::{FailingTransfer, Fixture, ScriptedResolver};

#[tokio::test]
async fn test_failed_transfers_do_not_stop_the_pass() {
    let fx = Fixture::new();
    fx.write_local("a.pdf", b"aaa");
    fx.write_local("b.pdf", b"bbb");
    fx.write_remote("r.pdf", b"rrrr");
    fx.write_remote("s.pdf", b"ss");

    let transfer = FailingTransfer::new(fx.remote_base(), &["b.pdf", "r.pdf"]);
    let report = fx
        .synchronizer_with(fx.config(), transfer, ScriptedResolver::answering(&[]))
        .run()
        .await
        .unwrap();

    assert_eq!(report.errors.len(), 2, "{:?}", report.errors);
    assert!(report.errors.iter().any(|e| e.contains("b.pdf")));
    assert!(report.errors.iter().any(|e| e.contains("r.pdf")));
    assert_eq!(report.uploads, 1);
    assert_eq!(report.downloads, 1);
    assert!(report.persisted_local && report.persisted_remote);

    assert_eq!(fx.read_remote("a.pdf").unwrap(), b"aaa");
    assert_eq!(fx.read_local("s.pdf").unwrap(), b"ss");
    assert!(fx.read_remote("b.pdf").is_none());
    assert!(fx.read_local("r.pdf").is_none());
}

#[tokio::test]
async fn test_next_pass_retries_failed_transfers() {
    let fx = Fixture::new();
    fx.write_local("a.pdf", b"aaa");
    fx.write_local("b.pdf", b"bbb");
    fx.write_remote("r.pdf", b"rrrr");

    let transfer = FailingTransfer::new(fx.remote_base(), &["b.pdf", "r.pdf"]);
    fx.synchronizer_with(fx.config(), transfer, ScriptedResolver::answering(&[]))
        .run()
        .await
        .unwrap();

    // The missing copies have no baseline record, so they read as new
    // rather than deleted
    let report = fx.sync().await;
    assert!(!report.first_sync);
    assert_eq!(report.uploads, 1);
    assert_eq!(report.downloads, 1);
    assert_eq!(report.deleted_local + report.deleted_remote, 0);
    assert_eq!(fx.read_remote("b.pdf").unwrap(), b"bbb");
    assert_eq!(fx.read_local("r.pdf").unwrap(), b"rrrr");

    let report = fx.sync().await;
    assert_eq!(report.changes(), 0);
}
