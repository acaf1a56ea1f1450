use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use counter::time::{ManualClock, now_ns};
use counter::{DumpOutcome, LoadOutcome, PersistError, Record, StoreConfig, Window, WindowStore};
use uuid::Uuid;

/// Unique snapshot path per test so tests can run in parallel.
fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("counter-{}.json", Uuid::new_v4()))
}

struct Cleanup(PathBuf);

impl Drop for Cleanup {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

async fn store_at(window_secs: u64, path: &Path) -> WindowStore {
    common::logger::init_logger("counter-tests", false);
    let cfg = StoreConfig::new(Window::from_secs(window_secs).unwrap()).with_persistence(path);
    WindowStore::open(cfg).await
}

async fn record_n(store: &WindowStore, n: usize) {
    for _ in 0..n {
        store.record("0.0.0.0:8888");
    }
    store.flush().await;
}

#[tokio::test]
async fn missing_file_is_a_cold_start() {
    let path = scratch_path();
    let rs = store_at(2, &path).await;

    assert_eq!(rs.count(), 0);
    assert_eq!(rs.load().await, LoadOutcome::Missing);
    assert!(!path.exists());
}

#[tokio::test]
async fn dump_and_reload_round_trip() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    let rs = store_at(2, &path).await;
    record_n(&rs, 5).await;
    assert_eq!(rs.count(), 5);

    assert_eq!(rs.dump().await?, DumpOutcome::Written { records: 5 });
    assert!(path.exists());

    // same instance
    assert_eq!(
        rs.load().await,
        LoadOutcome::Restored {
            kept: 5,
            expired: 0
        }
    );
    assert_eq!(rs.count(), 5);

    // fresh instance
    let reopened = store_at(2, &path).await;
    assert_eq!(reopened.count(), 5);
    assert_eq!(reopened.snapshot(), rs.snapshot());
    Ok(())
}

#[tokio::test]
async fn empty_array_resets_the_store() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    let rs = store_at(2, &path).await;
    record_n(&rs, 5).await;
    rs.dump().await?;

    std::fs::write(&path, b"[]")?;
    assert_eq!(
        rs.load().await,
        LoadOutcome::Restored {
            kept: 0,
            expired: 0
        }
    );
    assert_eq!(rs.count(), 0);

    record_n(&rs, 5).await;
    assert_eq!(rs.count(), 5);
    Ok(())
}

#[tokio::test]
async fn expired_snapshot_is_filtered_on_load() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    let rs = store_at(2, &path).await;
    record_n(&rs, 5).await;
    rs.dump().await?;

    tokio::time::sleep(Duration::from_millis(2001)).await;

    assert_eq!(
        rs.load().await,
        LoadOutcome::Restored {
            kept: 0,
            expired: 5
        }
    );
    assert_eq!(rs.count(), 0);
    Ok(())
}

#[tokio::test]
async fn partially_expired_snapshot_keeps_fresh_records() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    let now = now_ns();
    let records = vec![
        Record::new(now - 120_000_000_000, "old"),
        Record::new(now - 30_000_000_000, "fresh-1"),
        Record::new(now - 1_000_000_000, "fresh-2"),
    ];
    std::fs::write(&path, serde_json::to_vec(&records)?)?;

    let rs = store_at(60, &path).await;
    assert_eq!(rs.count(), 2);
    assert_eq!(rs.stats().restored, 2);
    assert_eq!(rs.stats().expired_on_restore, 1);

    let origins: Vec<String> = rs.snapshot().into_iter().map(|r| r.origin).collect();
    assert_eq!(origins, vec!["fresh-1", "fresh-2"]);
    Ok(())
}

#[tokio::test]
async fn entry_without_address_is_restored() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    std::fs::write(&path, format!(r#"[{{"requested_at":{}}}]"#, now_ns()))?;

    let rs = store_at(60, &path).await;
    assert_eq!(rs.count(), 1);
    assert_eq!(rs.snapshot()[0].origin, "");
    Ok(())
}

#[tokio::test]
async fn entry_without_timestamp_is_expired_on_load() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    std::fs::write(&path, br#"[{"remote_address":"10.0.0.1:80"}]"#)?;

    let rs = store_at(60, &path).await;
    assert_eq!(
        rs.load().await,
        LoadOutcome::Restored {
            kept: 0,
            expired: 1
        }
    );
    assert_eq!(rs.count(), 0);
    Ok(())
}

#[tokio::test]
async fn null_snapshot_clears_a_running_store() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    let rs = store_at(60, &path).await;
    record_n(&rs, 2).await;

    std::fs::write(&path, b"null")?;
    assert_eq!(
        rs.load().await,
        LoadOutcome::Restored {
            kept: 0,
            expired: 0
        }
    );
    assert_eq!(rs.count(), 0);
    Ok(())
}

#[tokio::test]
async fn malformed_snapshot_leaves_store_untouched() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    std::fs::write(&path, b"this is not json")?;
    let rs = store_at(60, &path).await;
    assert_eq!(rs.count(), 0);

    record_n(&rs, 3).await;
    assert_eq!(rs.load().await, LoadOutcome::Malformed);
    assert_eq!(rs.count(), 3);
    Ok(())
}

#[tokio::test]
async fn snapshot_file_format_is_stable() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    let clock = Arc::new(ManualClock::new(1_700_000_000_000_000_000));
    let cfg = StoreConfig::new(Window::from_secs(60).unwrap()).with_persistence(&path);
    let rs = WindowStore::open_with_clock(cfg, clock.clone()).await;

    rs.record("10.0.0.1:1111");
    rs.flush().await;
    clock.advance(Duration::from_nanos(5));
    rs.record("10.0.0.2:2222");
    rs.flush().await;

    rs.dump().await?;

    let raw = std::fs::read_to_string(&path)?;
    assert_eq!(
        raw,
        concat!(
            r#"[{"requested_at":1700000000000000000,"remote_address":"10.0.0.1:1111"},"#,
            r#"{"requested_at":1700000000000000005,"remote_address":"10.0.0.2:2222"}]"#
        )
    );
    Ok(())
}

#[tokio::test]
async fn dump_failure_is_reported_not_fatal() {
    let path = std::env::temp_dir()
        .join(format!("counter-missing-dir-{}", Uuid::new_v4()))
        .join("rs.json");

    let rs = store_at(60, &path).await;
    record_n(&rs, 2).await;

    let err = rs.dump().await.unwrap_err();
    assert!(matches!(err, PersistError::Write { .. }));

    // counting is unaffected
    record_n(&rs, 1).await;
    assert_eq!(rs.count(), 3);
}

#[cfg(unix)]
#[tokio::test]
async fn dump_replaces_file_with_owner_only_permissions() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    std::fs::write(&path, b"[]")?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))?;

    let rs = store_at(60, &path).await;
    record_n(&rs, 1).await;
    rs.dump().await?;

    let mode = std::fs::metadata(&path)?.permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    Ok(())
}

#[tokio::test]
async fn shutdown_dump_through_handler() -> anyhow::Result<()> {
    let path = scratch_path();
    let _cleanup = Cleanup(path.clone());

    let handler = counter::CountHandler::new(store_at(60, &path).await);
    for _ in 0..3 {
        handler.handle("/count", "10.1.1.1:443");
    }
    handler.store().flush().await;

    assert_eq!(
        handler.shutdown().await,
        Some(DumpOutcome::Written { records: 3 })
    );

    let reopened = store_at(60, &path).await;
    assert_eq!(reopened.count(), 3);
    Ok(())
}
