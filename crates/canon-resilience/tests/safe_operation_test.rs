use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use canon_core::config::ResilienceConfig;
use canon_core::errors::{CanonError, SourceError};
use canon_core::traits::IReadiness;
use canon_resilience::backoff::total_backoff;
use canon_resilience::{CancellationToken, SafeOperation};

struct Target {
    ready: bool,
}

impl IReadiness for Target {
    fn name(&self) -> &str {
        "test-target"
    }
    fn is_ready(&self) -> bool {
        self.ready
    }
}

const READY: Target = Target { ready: true };

fn config(max_retries: u32) -> ResilienceConfig {
    ResilienceConfig {
        max_retries,
        base_delay_ms: 100,
        max_delay_ms: 10_000,
        timeout_ms: 1_000,
    }
}

fn failure() -> CanonError {
    SourceError::FetchFailed {
        source_name: "test-target".to_string(),
        reason: "boom".to_string(),
    }
    .into()
}

#[tokio::test(start_paused = true)]
async fn success_is_a_hit() {
    let safe = SafeOperation::new(config(3));
    let value = safe.run(&READY, "ok", 0, |_| async { Ok(42) }).await;
    assert_eq!(value, 42);
    let stats = safe.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.hit_rate(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn retry_exhaustion_returns_fallback_within_backoff_budget() {
    let cfg = config(3);
    let safe = SafeOperation::new(cfg.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let started = tokio::time::Instant::now();
    let value = safe
        .run(&READY, "always-fails", -1, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(failure())
            }
        })
        .await;
    let elapsed = started.elapsed();

    assert_eq!(value, -1);
    // One initial attempt plus three retries.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    let budget = total_backoff(cfg.base_delay(), cfg.max_delay(), cfg.max_retries);
    assert_eq!(budget, Duration::from_millis(700));
    assert!(elapsed <= budget, "elapsed {elapsed:?} exceeds {budget:?}");

    let stats = safe.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.retries, 3);
    assert_eq!(stats.failures_for("always-fails"), 4);
}

#[tokio::test(start_paused = true)]
async fn recovers_on_a_later_attempt() {
    let safe = SafeOperation::new(config(3));
    let calls = Arc::new(AtomicUsize::new(0));
    let value = safe
        .run(&READY, "flaky", "fallback", |_| {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(failure())
                } else {
                    Ok("real")
                }
            }
        })
        .await;
    assert_eq!(value, "real");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(safe.stats().failures_for("flaky"), 2);
}

#[tokio::test(start_paused = true)]
async fn not_ready_skips_the_operation() {
    let safe = SafeOperation::new(config(3));
    let called = Arc::new(AtomicBool::new(false));
    let value = safe
        .run(&Target { ready: false }, "probe", 7, |_| {
            let called = called.clone();
            async move {
                called.store(true, Ordering::SeqCst);
                Ok(1)
            }
        })
        .await;
    assert_eq!(value, 7);
    assert!(!called.load(Ordering::SeqCst));
    let stats = safe.stats();
    assert_eq!(stats.not_ready, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_cancels_the_attempt_token() {
    let safe = SafeOperation::new(config(1));
    let tokens: Arc<Mutex<Vec<CancellationToken>>> = Arc::new(Mutex::new(Vec::new()));
    let background_saw_cancel = Arc::new(AtomicUsize::new(0));

    let value = safe
        .run(&READY, "hangs", 0u8, |token| {
            let tokens = tokens.clone();
            let saw = background_saw_cancel.clone();
            async move {
                tokens.lock().unwrap().push(token.clone());
                // Work that outlives the attempt future must watch the token.
                tokio::spawn(async move {
                    token.cancelled().await;
                    saw.fetch_add(1, Ordering::SeqCst);
                });
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1u8)
            }
        })
        .await;

    assert_eq!(value, 0);
    {
        let tokens = tokens.lock().unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
    }
    // Let the spawned watchers observe the cancellation.
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(background_saw_cancel.load(Ordering::SeqCst), 2);
    assert_eq!(safe.stats().timeouts, 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cuts_backoff_short() {
    let safe = Arc::new(SafeOperation::new(ResilienceConfig {
        max_retries: 5,
        base_delay_ms: 10_000,
        max_delay_ms: 60_000,
        timeout_ms: 1_000,
    }));
    let calls = Arc::new(AtomicUsize::new(0));

    let runner = {
        let safe = safe.clone();
        let calls = calls.clone();
        tokio::spawn(async move {
            safe.run(&READY, "slow", 0, |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(failure())
                }
            })
            .await
        })
    };

    tokio::task::yield_now().await;
    safe.shutdown();
    assert_eq!(runner.await.unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(safe.is_shut_down());
}
