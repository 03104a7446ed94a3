//! Tests for the admission core

use super::*;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

fn test_config(per_second: u64, per_minute: u64, per_hour: u64) -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        requests_per_second: per_second,
        requests_per_minute: per_minute,
        requests_per_hour: per_hour,
        block_cooldown_minutes: 1,
        idle_eviction_hours: 24,
        sweep_interval_secs: 60,
    }
}

// ==================== TokenBucket ====================

#[test]
fn bucket_starts_full_and_consumes_down_to_zero() {
    let now = Instant::now();
    let mut bucket = TokenBucket::new(3, Duration::from_secs(3600));

    assert_eq!(bucket.available(now), 3);
    assert!(bucket.try_consume(1, now));
    assert!(bucket.try_consume(2, now));
    assert!(!bucket.try_consume(1, now));
    assert_eq!(bucket.available(now), 0);
}

#[test]
fn bucket_never_exceeds_capacity_or_goes_negative() {
    let mut bucket = TokenBucket::new(5, Duration::from_millis(50));

    for _ in 0..20 {
        let now = Instant::now();
        let _ = bucket.try_consume(2, now);
        let peeked = bucket.peek(now);
        assert!(peeked >= 0.0, "available went negative: {peeked}");
        assert!(peeked <= 5.0, "available exceeded capacity: {peeked}");
        thread::sleep(Duration::from_millis(7));
    }

    // Long idle caps at capacity instead of overflowing.
    thread::sleep(Duration::from_millis(150));
    assert_eq!(bucket.available(Instant::now()), 5);
}

#[test]
fn bucket_refill_is_continuous_and_monotonic() {
    let mut bucket = TokenBucket::new(10, Duration::from_millis(100));
    assert!(bucket.try_consume(10, Instant::now()));

    let first = bucket.peek(Instant::now());
    thread::sleep(Duration::from_millis(30));
    let second = bucket.peek(Instant::now());
    assert!(second >= first, "refill moved backwards: {first} -> {second}");

    // ~30ms at 10 tokens/100ms regains ~3 tokens; a discrete tick of whole
    // windows would still read zero here.
    assert!(second > 1.0, "no fractional refill observed: {second}");
    assert!(second < 10.0);
}

#[test]
fn bucket_peek_does_not_mutate() {
    let mut bucket = TokenBucket::new(4, Duration::from_secs(3600));
    let now = Instant::now();
    assert!(bucket.try_consume(1, now));

    for _ in 0..5 {
        assert_eq!(bucket.available(now), 3);
    }
    assert!(bucket.try_consume(3, now));
    assert!(!bucket.try_consume(1, now));
}

// ==================== WindowSet ====================

#[test]
fn window_set_admits_only_when_every_window_affords() {
    let mut windows = WindowSet::new(&[
        (Window::Second, 10),
        (Window::Minute, 2),
        (Window::Hour, 100),
    ]);
    let now = Instant::now();

    assert!(windows.try_consume(1, now));
    assert!(windows.try_consume(1, now));
    // The minute window is dry even though second/hour still have room.
    assert!(!windows.try_consume(1, now));
}

#[test]
fn window_set_failure_mutates_no_bucket() {
    let mut windows = WindowSet::new(&[
        (Window::Second, 10),
        (Window::Minute, 2),
        (Window::Hour, 100),
    ]);
    let now = Instant::now();
    assert!(windows.try_consume(1, now));
    assert!(windows.try_consume(1, now));

    let before = windows.snapshots(now);
    assert!(!windows.try_consume(1, now));
    let after = windows.snapshots(now);

    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.window, a.window);
        assert_eq!(
            b.available, a.available,
            "failed consume changed the {} window",
            b.window.label()
        );
    }
    assert_eq!(after[0].available, 8);
    assert_eq!(after[2].available, 98);
}

#[test]
fn window_set_snapshots_report_configured_limits_in_order() {
    let windows = WindowSet::new(&[
        (Window::Second, 200),
        (Window::Minute, 1000),
        (Window::Hour, 6000),
    ]);
    let snapshots = windows.snapshots(Instant::now());

    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].window, Window::Second);
    assert_eq!(snapshots[0].limit, 200);
    assert_eq!(snapshots[1].window, Window::Minute);
    assert_eq!(snapshots[1].limit, 1000);
    assert_eq!(snapshots[2].window, Window::Hour);
    assert_eq!(snapshots[2].limit, 6000);
}

// ==================== ClientStore ====================

#[test]
fn store_creates_one_entry_per_identity_under_race() {
    let store = std::sync::Arc::new(ClientStore::new(
        vec![(Window::Second, 10)],
        Duration::from_secs(3600),
    ));
    let barrier = std::sync::Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = std::sync::Arc::clone(&store);
            let barrier = std::sync::Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.get_or_create("racer")
            })
        })
        .collect();

    let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(store.len(), 1);
    for entry in &entries[1..] {
        assert!(
            std::sync::Arc::ptr_eq(&entries[0], entry),
            "duplicate window set created under race"
        );
    }
}

#[test]
fn store_get_never_creates() {
    let store = ClientStore::new(vec![(Window::Second, 10)], Duration::from_secs(3600));
    assert!(store.get("ghost").is_none());
    assert!(store.is_empty());

    store.get_or_create("present");
    assert!(store.get("present").is_some());
    assert_eq!(store.len(), 1);
}

#[test]
fn store_sweep_evicts_idle_entries_and_recreates_fresh() {
    let store = ClientStore::new(vec![(Window::Second, 3)], Duration::from_millis(50));

    let entry = store.get_or_create("idle-client");
    {
        let mut windows = entry.windows().lock();
        let now = Instant::now();
        assert!(windows.try_consume(1, now));
        assert!(windows.try_consume(1, now));
    }
    drop(entry);

    thread::sleep(Duration::from_millis(80));
    assert_eq!(store.sweep(), 1);
    assert!(store.is_empty());

    // A returning client is indistinguishable from a first-ever one.
    let fresh = store.get_or_create("idle-client");
    let snapshots = fresh.windows().lock().snapshots(Instant::now());
    assert_eq!(snapshots[0].available, 3);
}

#[test]
fn store_sweep_spares_recently_seen_entries() {
    let store = ClientStore::new(vec![(Window::Second, 3)], Duration::from_millis(100));
    store.get_or_create("active");
    store.get_or_create("other");

    thread::sleep(Duration::from_millis(60));
    store.get_or_create("active"); // refreshes the idle stamp
    thread::sleep(Duration::from_millis(60));

    assert_eq!(store.sweep(), 1);
    assert!(store.get("active").is_some());
    assert!(store.get("other").is_none());
}

// ==================== Blocklist ====================

#[test]
fn blocklist_entry_expires_and_is_removed_on_lookup() {
    let blocklist = Blocklist::new();
    blocklist.block("offender", Duration::from_millis(50));

    assert!(blocklist.blocked_until("offender").is_some());
    thread::sleep(Duration::from_millis(80));
    assert!(blocklist.blocked_until("offender").is_none());
    assert!(blocklist.is_empty(), "expired entry not lazily deleted");
}

#[test]
fn blocklist_reblock_resets_the_cooldown() {
    let blocklist = Blocklist::new();
    let first = blocklist.block("offender", Duration::from_secs(60));
    thread::sleep(Duration::from_millis(20));
    let second = blocklist.block("offender", Duration::from_secs(60));

    assert!(second > first);
    assert_eq!(blocklist.blocked_until("offender"), Some(second));
}

#[test]
fn blocklist_unknown_identity_is_not_blocked() {
    let blocklist = Blocklist::new();
    assert!(blocklist.blocked_until("nobody").is_none());
}

// ==================== AdmissionControl ====================

#[test]
fn blocked_client_is_rejected_without_touching_windows() {
    let control = AdmissionControl::new(&test_config(10, 100, 1000));
    control.blocklist.block("shady", Duration::from_secs(60));

    match control.admit("shady") {
        AdmissionDecision::Blocked { unblock_at } => assert!(unblock_at > Utc::now()),
        other => panic!("expected Blocked, got {other:?}"),
    }
    assert_eq!(
        control.tracked_clients(),
        0,
        "blocked request must not create bucket state"
    );
}

#[test]
fn budget_exhaustion_scenario_rejects_then_readmits_after_cooldown() {
    let control = AdmissionControl::with_periods(
        &test_config(3, 100, 1000),
        Duration::from_millis(200),
        Duration::from_secs(3600),
    );

    for i in 0..3 {
        assert!(control.admit("client-a").is_admitted(), "request {i} rejected");
    }

    let unblock_at = match control.admit("client-a") {
        AdmissionDecision::LimitExceeded { unblock_at } => unblock_at,
        other => panic!("expected LimitExceeded, got {other:?}"),
    };
    assert!(unblock_at > Utc::now());
    assert_eq!(control.blocked_clients(), 1);

    // Still inside the cooldown: rejected without another consume attempt.
    assert!(matches!(
        control.admit("client-a"),
        AdmissionDecision::Blocked { .. }
    ));

    // Past the cooldown the second window has also regained a token.
    thread::sleep(Duration::from_millis(400));
    assert!(control.admit("client-a").is_admitted());
    assert_eq!(control.blocked_clients(), 0);
}

#[test]
fn clients_have_independent_budgets() {
    let control = AdmissionControl::with_periods(
        &test_config(1, 100, 1000),
        Duration::from_secs(60),
        Duration::from_secs(3600),
    );

    assert!(control.admit("first").is_admitted());
    assert!(matches!(
        control.admit("first"),
        AdmissionDecision::LimitExceeded { .. }
    ));
    assert!(control.admit("second").is_admitted());
}

#[test]
fn concurrent_consumers_admit_exactly_the_available_tokens() {
    const TOKENS: usize = 8;

    let control = std::sync::Arc::new(AdmissionControl::with_periods(
        &test_config(TOKENS as u64, 10_000, 100_000),
        Duration::from_secs(60),
        Duration::from_secs(3600),
    ));
    let barrier = std::sync::Arc::new(Barrier::new(TOKENS + 1));

    let handles: Vec<_> = (0..TOKENS + 1)
        .map(|_| {
            let control = std::sync::Arc::clone(&control);
            let barrier = std::sync::Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                control.admit("contended").is_admitted()
            })
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&admitted| admitted)
        .count();
    assert_eq!(admitted, TOKENS, "exactly the available tokens must win");
}

#[test]
fn snapshots_reflect_consumption_and_never_create_state() {
    let control = AdmissionControl::new(&test_config(10, 100, 1000));

    assert!(control.snapshots("unseen").is_none());
    assert_eq!(control.tracked_clients(), 0);

    assert!(control.admit("seen").is_admitted());
    let snapshots = control.snapshots("seen").expect("entry exists after admit");
    assert_eq!(snapshots[0].limit, 10);
    assert_eq!(snapshots[0].available, 9);
    assert_eq!(snapshots[1].available, 99);
    assert_eq!(snapshots[2].available, 999);
}

#[test]
fn idle_clients_are_swept_and_return_at_full_capacity() {
    let control = AdmissionControl::with_periods(
        &test_config(5, 100, 1000),
        Duration::from_secs(60),
        Duration::from_millis(50),
    );

    assert!(control.admit("transient").is_admitted());
    assert_eq!(control.tracked_clients(), 1);

    thread::sleep(Duration::from_millis(80));
    assert_eq!(control.sweep_idle(), 1);
    assert_eq!(control.tracked_clients(), 0);

    let snapshots = match control.admit("transient") {
        AdmissionDecision::Admitted { windows } => windows,
        other => panic!("expected Admitted, got {other:?}"),
    };
    assert_eq!(snapshots[0].available, 4, "recreated set must start full");
}
