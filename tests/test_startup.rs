mod common;

use common::*;
use drive_sync::notify::Notification;
use drive_sync::sync::{PullOutcome, StartupCheck, SyncConfig};
use drive_sync::SyncError;

fn startup_harness(remote_modified: &str) -> Harness {
    let h = Harness::new(
        SyncConfig {
            is_load_remote_data_on_startup: true,
            ..provisioned_config("f1", "2024-05-01T10:00:00Z")
        },
        snapshot_at("2024-05-01T09:00:00Z", "local"),
        cancel_all(),
    );
    h.gateway.insert_file(
        "f1",
        "sync.json",
        ts(remote_modified),
        snapshot_bytes(remote_modified, "remote"),
    );
    h
}

#[tokio::test]
async fn test_newer_remote_is_pulled_on_startup() {
    let h = startup_harness("2024-05-03T08:00:00Z");

    let check = h.engine.check_for_initial_update().await.unwrap();

    assert_eq!(
        check,
        StartupCheck::Pulled(PullOutcome::Imported {
            remote_last_active: ts("2024-05-03T08:00:00Z")
        })
    );
    assert_eq!(h.snapshots.marker(), "remote");
    assert_eq!(
        h.notifier.seen().first(),
        Some(&Notification::RemoteUpdateAvailable)
    );
    // forced pull, no confirmation
    assert!(h.prompt.asked().is_empty());
}

#[tokio::test]
async fn test_unchanged_remote_only_reads_metadata() {
    let h = startup_harness("2024-05-01T10:00:00Z");

    let check = h.engine.check_for_initial_update().await.unwrap();

    assert_eq!(check, StartupCheck::NoUpdate);
    assert_eq!(h.gateway.calls(), vec![Call::GetMetadata("f1".to_string())]);
    assert_eq!(h.snapshots.overwrite_count(), 0);
    assert!(h.notifier.seen().is_empty());
}

#[tokio::test]
async fn test_startup_check_respects_settings() {
    let h = Harness::new(
        provisioned_config("f1", "2024-05-01T10:00:00Z"),
        snapshot_at("2024-05-01T09:00:00Z", "local"),
        cancel_all(),
    );

    let check = h.engine.check_for_initial_update().await.unwrap();

    assert_eq!(check, StartupCheck::Disabled);
    assert!(h.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_startup_check_without_remote_file() {
    let h = Harness::new(
        SyncConfig {
            is_enabled: true,
            is_load_remote_data_on_startup: true,
            ..Default::default()
        },
        snapshot_at("2024-05-01T09:00:00Z", "local"),
        cancel_all(),
    );

    let check = h.engine.check_for_initial_update().await.unwrap();

    assert_eq!(check, StartupCheck::NotProvisioned);
    assert!(h.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_startup_check_reports_unreachable_drive() {
    let h = startup_harness("2024-05-03T08:00:00Z");
    h.gateway.set_unavailable(true);

    let err = h.engine.check_for_initial_update().await.unwrap_err();

    assert!(matches!(err, SyncError::RemoteUnavailable(_)));
    assert!(matches!(
        h.notifier.seen().as_slice(),
        [Notification::Failed(_)]
    ));
    assert_eq!(h.snapshots.overwrite_count(), 0);
}
