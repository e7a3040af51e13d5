//! Context: rate counter, reset loop and snapshot persistence.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tokio::time::{sleep, Duration};

use tally_core::{PersistedSnapshot, Store, TallyError};
use tally_gateway::config::StateSection;
use tally_gateway::context::Context;

fn state_cfg(dir: &TempDir) -> StateSection {
    StateSection {
        path: dir.path().join("state.json"),
        recover_on_start: true,
        reset_interval_secs: 60,
    }
}

fn fresh(cfg: &StateSection) -> Context {
    Context::new(Arc::new(Store::new()), cfg)
}

fn write_snapshot(cfg: &StateSection, active_ago: i64, started_ago: i64, rpm: u64) -> chrono::DateTime<Utc> {
    let now = Utc::now();
    let mut cache_state = Map::new();
    cache_state.insert("greeting".into(), json!("hello"));
    let snap = PersistedSnapshot {
        last_active_at: now - ChronoDuration::seconds(active_ago),
        last_started_at: now - ChronoDuration::seconds(started_ago),
        cache_state,
        rate_count: rpm,
    };
    fs::write(&cfg.path, snap.encode().unwrap()).unwrap();
    now
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_exact() {
    let dir = TempDir::new().unwrap();
    let ctx = Arc::new(fresh(&state_cfg(&dir)));

    let handles: Vec<_> = (0..5000)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { ctx.hit() })
        })
        .collect();
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(ctx.rpm(), 5000);
}

#[test]
fn reset_returns_previous_value() {
    let dir = TempDir::new().unwrap();
    let ctx = fresh(&state_cfg(&dir));
    ctx.hit();
    ctx.hit();
    assert_eq!(ctx.rate().reset(), 2);
    assert_eq!(ctx.rpm(), 0);
}

#[tokio::test(start_paused = true)]
async fn reset_loop_honors_initial_delay() {
    let dir = TempDir::new().unwrap();
    let ctx = fresh(&state_cfg(&dir));
    for _ in 0..3 {
        ctx.hit();
    }

    let handle = ctx.start_reset_loop(45);

    sleep(Duration::from_secs(14)).await;
    assert_eq!(ctx.rpm(), 3, "first reset is due at 15s");

    sleep(Duration::from_secs(2)).await;
    assert_eq!(ctx.rpm(), 0);

    ctx.hit();
    sleep(Duration::from_secs(58)).await;
    assert_eq!(ctx.rpm(), 1, "next reset is a full window later");

    sleep(Duration::from_secs(2)).await;
    assert_eq!(ctx.rpm(), 0);

    ctx.shutdown();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reset_loop_fires_immediately_when_window_elapsed() {
    let dir = TempDir::new().unwrap();
    let ctx = fresh(&state_cfg(&dir));
    ctx.hit();

    let handle = ctx.start_reset_loop(90);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(ctx.rpm(), 0);

    ctx.shutdown();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reset_loop_stops_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let ctx = fresh(&state_cfg(&dir));

    let handle = ctx.start_reset_loop(0);
    ctx.shutdown();
    handle.await.unwrap();

    ctx.hit();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(ctx.rpm(), 1);
}

#[tokio::test(start_paused = true)]
async fn reset_loop_after_shutdown_exits_immediately() {
    let dir = TempDir::new().unwrap();
    let ctx = fresh(&state_cfg(&dir));
    ctx.hit();
    ctx.shutdown();

    let handle = ctx.start_reset_loop(0);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop must exit without running")
        .unwrap();
    assert_eq!(ctx.rpm(), 1);
}

#[test]
fn flush_writes_wire_format() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);
    let ctx = fresh(&cfg);
    ctx.store().set("answer", json!(42));
    ctx.hit();

    ctx.flush().unwrap();

    let v: Value = serde_json::from_slice(&fs::read(&cfg.path).unwrap()).unwrap();
    assert_eq!(v["rpm"], 1);
    assert_eq!(v["cache_state"], json!({"answer": 42}));
    assert!(v["last_active_at"].is_string());
    assert!(v["last_started_at"].is_string());
    let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("state.json")]);
}

#[test]
fn parallel_flushes_never_fail_or_tear() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);

    let small = fresh(&cfg);
    small.store().set("k", json!(1));
    small.hit();

    let large = fresh(&cfg);
    for i in 0..200 {
        large.store().set(format!("key_{i}"), json!({"payload": "x".repeat(64)}));
    }
    for _ in 0..5 {
        large.hit();
    }

    for round in 0..100 {
        std::thread::scope(|s| {
            let a = s.spawn(|| small.flush());
            let b = s.spawn(|| large.flush());
            a.join().unwrap().unwrap_or_else(|e| panic!("round {round}: {e}"));
            b.join().unwrap().unwrap_or_else(|e| panic!("round {round}: {e}"));
        });

        let reader = fresh(&cfg);
        reader.load().unwrap_or_else(|e| panic!("round {round}: {e}"));
        assert!(reader.rpm() == 1 || reader.rpm() == 5, "round {round}");
        let entries = reader.store().len();
        assert!(entries == 1 || entries == 200, "round {round}: {entries} entries");
    }

    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn flush_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);

    let old = fresh(&cfg);
    old.store().set("answer", json!(42));
    old.store().set("/", json!({"exec_times_ns": [500000], "response_time_ms": 0.5}));
    for _ in 0..7 {
        old.hit();
    }
    old.flush().unwrap();

    let new = fresh(&cfg);
    let delay = new.load().unwrap();

    assert!(delay < 60);
    assert_eq!(new.rpm(), 7);
    assert_eq!(new.store().snapshot(), old.store().snapshot());
}

#[test]
fn load_missing_file_is_state_load_error() {
    let dir = TempDir::new().unwrap();
    let ctx = fresh(&state_cfg(&dir));
    assert!(matches!(ctx.load(), Err(TallyError::StateLoad(_))));
}

#[test]
fn stale_snapshot_discards_counter() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);
    let now = write_snapshot(&cfg, 60, 300, 17);

    let ctx = fresh(&cfg);
    let delay = ctx.persistence().load_at(&ctx, now).unwrap();

    assert_eq!(delay, 0);
    assert_eq!(ctx.rpm(), 0);
    assert_eq!(ctx.store().get("greeting").unwrap(), json!("hello"));
}

#[test]
fn recent_snapshot_resumes_counter() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);
    let now = write_snapshot(&cfg, 10, 45, 17);

    let ctx = fresh(&cfg);
    let delay = ctx.persistence().load_at(&ctx, now).unwrap();

    assert_eq!(delay, 45);
    assert_eq!(ctx.rpm(), 17);
}

#[test]
fn corrupt_snapshot_leaves_state_untouched() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);
    fs::write(&cfg.path, br#"{"last_active_at": "2024-05-01T12:00:00Z", "rpm": 9, "cache_st"#).unwrap();

    let ctx = fresh(&cfg);
    ctx.hit();
    ctx.store().set("kept", json!(true));

    let err = ctx.load().expect_err("must fail");
    assert!(err.is_state_load());
    assert_eq!(ctx.rpm(), 1);
    assert_eq!(ctx.store().snapshot().len(), 1);
    assert!(cfg.path.exists());
}

#[test]
fn recover_deletes_unusable_snapshot() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);
    fs::write(
        &cfg.path,
        br#"{"last_active_at": "later", "last_started_at": "sooner", "cache_state": {}, "rpm": 9}"#,
    )
    .unwrap();

    let ctx = fresh(&cfg);
    assert_eq!(ctx.persistence().recover(&ctx), 0);
    assert_eq!(ctx.rpm(), 0);
    assert!(!cfg.path.exists());
}

#[test]
fn recover_without_snapshot_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let ctx = fresh(&state_cfg(&dir));
    assert_eq!(ctx.persistence().recover(&ctx), 0);
    assert_eq!(ctx.rpm(), 0);
}

#[tokio::test]
async fn open_recovers_recent_snapshot() {
    let dir = TempDir::new().unwrap();
    let cfg = state_cfg(&dir);
    write_snapshot(&cfg, 5, 20, 11);

    let ctx = Context::open(Arc::new(Store::new()), &cfg);
    assert_eq!(ctx.rpm(), 11);
    assert_eq!(ctx.store().get("greeting").unwrap(), json!("hello"));
    ctx.shutdown();
}

#[tokio::test]
async fn open_without_recovery_ignores_snapshot() {
    let dir = TempDir::new().unwrap();
    let mut cfg = state_cfg(&dir);
    cfg.recover_on_start = false;
    write_snapshot(&cfg, 5, 20, 11);

    let ctx = Context::open(Arc::new(Store::new()), &cfg);
    assert_eq!(ctx.rpm(), 0);
    assert!(ctx.store().is_empty());
    assert!(cfg.path.exists());
    ctx.shutdown();
}
