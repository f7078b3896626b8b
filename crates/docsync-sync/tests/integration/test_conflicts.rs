//! Documents changed on both sides

use docsync_core::domain::conflict::Resolution;
use docsync_core::domain::sync_state::SyncState;

use crate::common::{Fixture, ScriptedResolver};

async fn both_modified() -> Fixture {
    let fx = Fixture::new();
    fx.write_remote("a.pdf", b"original");
    fx.sync().await;
    fx.write_local("a.pdf", b"local annotations");
    fx.write_remote("a.pdf", b"remote annotations, longer");
    fx
}

#[tokio::test]
async fn test_both_modified_asks_and_local_wins() {
    let fx = both_modified().await;
    let resolver = ScriptedResolver::answering(&[Resolution::Local]);

    let report = fx.sync_with(resolver.clone()).await;

    let asked = resolver.asked();
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0].local.state, SyncState::Modified);
    assert_eq!(asked[0].remote.state, SyncState::Modified);
    assert_eq!(asked[0].local.size, 17);
    assert_eq!(asked[0].remote.size, 26);
    assert!(!asked[0].anomaly);
    assert_eq!(report.conflicts_asked, 1);
    assert_eq!(report.uploads, 1);
    assert_eq!(fx.read_remote("a.pdf").unwrap(), b"local annotations");
}

#[tokio::test]
async fn test_both_modified_remote_wins() {
    let fx = both_modified().await;
    let report = fx
        .sync_with(ScriptedResolver::answering(&[Resolution::Remote]))
        .await;
    assert_eq!(report.downloads, 1);
    assert_eq!(fx.read_local("a.pdf").unwrap(), b"remote annotations, longer");
}

#[tokio::test]
async fn test_skipped_conflict_is_asked_again() {
    let fx = both_modified().await;

    let report = fx.sync().await;
    assert_eq!(report.conflicts_skipped, 1);
    assert_eq!(report.changes(), 0);
    assert_eq!(fx.read_local("a.pdf").unwrap(), b"local annotations");
    assert_eq!(fx.read_remote("a.pdf").unwrap(), b"remote annotations, longer");

    // The baseline now records both copies, so the pair reads equal/equal
    // while the sizes still differ
    let resolver = ScriptedResolver::answering(&[Resolution::Local]);
    let report = fx.sync_with(resolver.clone()).await;
    assert_eq!(report.anomalies, 1);
    assert!(resolver.asked()[0].anomaly);
    assert_eq!(report.uploads, 1);
}
