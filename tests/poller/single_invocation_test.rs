// =============================================================================
// INTEGRATION TESTS - SINGLE SUCCESS INVOCATION
// The success callback fires exactly once regardless of what follows
// =============================================================================

#[path = "../common/mod.rs"]
mod common;
use common::{test_payment_id, ScriptedStatusSource};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use payment_monitor::{PaymentStatus, PaymentStatusPoller, PollerConfig};
use serde_json::json;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_success_callback_fires_exactly_once() {
    // The backend keeps reporting completed; the session must stop at the
    // first observation
    let source = ScriptedStatusSource::new(vec![
        json!({ "status": "PENDING" }),
        json!({ "status": "COMPLETED" }),
        json!({ "status": "COMPLETED" }),
        json!({ "status": "COMPLETED" }),
    ]);

    let success_calls = Arc::new(AtomicUsize::new(0));
    let counter = success_calls.clone();

    let mut handle = PaymentStatusPoller::spawn(
        PollerConfig {
            payment_id: Some(test_payment_id()),
            timeout_seconds: Some(60.0),
            ..Default::default()
        },
        source.clone(),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    let status = handle.wait_terminal().await;
    assert_eq!(status, PaymentStatus::Completed);
    assert_eq!(success_calls.load(Ordering::SeqCst), 1);

    // Terminal status is sticky and no further checks run
    assert_eq!(source.call_count(), 2);
    sleep(Duration::from_secs(30)).await;
    assert_eq!(handle.snapshot().status, PaymentStatus::Completed);
    assert_eq!(source.call_count(), 2);
    assert_eq!(success_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backend_cannot_resurrect_a_terminal_session() {
    // Completed, then the backend flips back to pending
    let source = ScriptedStatusSource::new(vec![
        json!({ "status": "COMPLETED" }),
        json!({ "status": "PENDING" }),
    ]);

    let mut handle = PaymentStatusPoller::spawn(
        PollerConfig {
            payment_id: Some(test_payment_id()),
            timeout_seconds: Some(60.0),
            ..Default::default()
        },
        source.clone(),
        || {},
    );

    let status = handle.wait_terminal().await;
    assert_eq!(status, PaymentStatus::Completed);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(handle.snapshot().status, PaymentStatus::Completed);
    // The pending entry was never even fetched: the session stopped first
    assert_eq!(source.call_count(), 1);
}
