// =============================================================================
// INTEGRATION TESTS - FAST-RESOLVING PAYMENT
// A payment confirmed by the backend mid-countdown terminates the session
// =============================================================================

#[path = "../common/mod.rs"]
mod common;
use common::ScriptedStatusSource;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use payment_monitor::{PaymentStatus, PaymentStatusPoller, PollerConfig};
use serde_json::json;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_payment_completes_before_countdown_expires() {
    // Pending for the first two checks (t=0s, t=3s), completed at t=6s
    let source = ScriptedStatusSource::new(vec![
        json!({ "status": "PENDING" }),
        json!({ "status": "PENDING" }),
        json!({ "status": "COMPLETED" }),
    ]);

    let success_calls = Arc::new(AtomicUsize::new(0));
    let counter = success_calls.clone();

    let mut handle = PaymentStatusPoller::spawn(
        PollerConfig {
            payment_id: Some("pay_1".to_string()),
            timeout_seconds: Some(10.0),
            ..Default::default()
        },
        source.clone(),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    assert_eq!(handle.snapshot().status, PaymentStatus::Pending);

    let status = handle.wait_terminal().await;
    assert_eq!(status, PaymentStatus::Completed);

    // Completion lands with the third check at t=6s, well before expiry
    let snapshot = handle.snapshot();
    assert!(
        snapshot.remaining_seconds >= 4,
        "completed too late: {} seconds left",
        snapshot.remaining_seconds
    );
    assert_eq!(success_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.call_count(), 3);

    // Timers are cleared: nothing moves after termination
    sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.snapshot(), snapshot);
    assert_eq!(source.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_completion_detected_without_poll_delay() {
    // The first check fires immediately, not a full interval in
    let source = ScriptedStatusSource::new(vec![json!({ "status": "COMPLETED" })]);

    let mut handle = PaymentStatusPoller::spawn(
        PollerConfig {
            payment_id: Some("pay_1".to_string()),
            timeout_seconds: Some(10.0),
            ..Default::default()
        },
        source.clone(),
        || {},
    );

    let status = handle.wait_terminal().await;
    assert_eq!(status, PaymentStatus::Completed);
    assert_eq!(source.call_count(), 1);
    // The countdown never got a chance to tick
    assert_eq!(handle.snapshot().remaining_seconds, 10);
}

#[tokio::test(start_paused = true)]
async fn test_failed_payment_terminates_without_callback() {
    let source = ScriptedStatusSource::new(vec![
        json!({ "status": "PENDING" }),
        json!({ "status": "FAILED" }),
    ]);

    let success_calls = Arc::new(AtomicUsize::new(0));
    let counter = success_calls.clone();

    let mut handle = PaymentStatusPoller::spawn(
        PollerConfig {
            payment_id: Some("pay_1".to_string()),
            timeout_seconds: Some(30.0),
            ..Default::default()
        },
        source,
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    let status = handle.wait_terminal().await;
    assert_eq!(status, PaymentStatus::Failed);
    assert_eq!(success_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_payloads_keep_the_session_pending() {
    // Garbage first, then a recognizable completion
    let source = ScriptedStatusSource::new(vec![
        json!({ "foo": "bar" }),
        json!({ "status": "shipped" }),
        json!({ "orderStatus": "PAID" }),
    ]);

    let mut handle = PaymentStatusPoller::spawn(
        PollerConfig {
            payment_id: Some("pay_1".to_string()),
            timeout_seconds: Some(60.0),
            ..Default::default()
        },
        source,
        || {},
    );

    sleep(Duration::from_secs(4)).await;
    assert_eq!(handle.snapshot().status, PaymentStatus::Pending);

    let status = handle.wait_terminal().await;
    assert_eq!(status, PaymentStatus::Completed);
}
