use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant};

use crate::services::status_source::{StatusSource, StatusSourceError};

use super::normalize::normalize_status;
use super::session::{PaymentStatus, PollSession, SessionSnapshot};

/// Interval between status checks against the backend
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Interval between countdown decrements
const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);
/// Remaining seconds at which the closing-window warning fires
const LOW_TIME_WARNING_SECS: u64 = 30;

type CheckResult = Result<serde_json::Value, StatusSourceError>;
type SuccessCallback = Box<dyn FnOnce() + Send>;

/// Session configuration supplied by the caller. `qr_code_url` and `amount`
/// describe the payment for the render surface and never influence polling.
#[derive(Debug, Clone, Default)]
pub struct PollerConfig {
    pub payment_id: Option<String>,
    pub qr_code_url: Option<String>,
    pub amount: Option<f64>,
    pub timeout_seconds: Option<f64>,
    pub poll_interval: Option<Duration>,
}

/// Owns one payment's observation lifecycle: periodic status checks and a
/// wall-clock countdown reconciled into a single authoritative status, with a
/// success callback invoked exactly once on completion.
///
/// All session state lives on one engine task, so no lock is involved; checks
/// run as detached fetch tasks and report back over a channel, which keeps a
/// hung request from ever blocking the countdown.
pub struct PaymentStatusPoller {
    session: PollSession,
    source: Arc<dyn StatusSource>,
    poll_interval: Duration,
    updates: watch::Sender<SessionSnapshot>,
    on_success: Option<SuccessCallback>,
    outstanding_checks: usize,
}

impl PaymentStatusPoller {
    /// Start a session on a spawned task. Dropping the returned handle is the
    /// only teardown path: it cancels both ticking schedules unconditionally.
    pub fn spawn(
        config: PollerConfig,
        source: Arc<dyn StatusSource>,
        on_success: impl FnOnce() + Send + 'static,
    ) -> PollerHandle {
        let session = PollSession::new(config.payment_id.clone(), config.timeout_seconds);
        let (updates_tx, updates_rx) = watch::channel(session.snapshot(false));

        if let Some(amount) = config.amount {
            tracing::info!(
                qr_code_url = config.qr_code_url.as_deref().unwrap_or("-"),
                "Awaiting QR payment of {}",
                amount
            );
        }

        let poller = Self {
            session,
            source,
            poll_interval: config.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            updates: updates_tx,
            on_success: Some(Box::new(on_success)),
            outstanding_checks: 0,
        };

        PollerHandle {
            updates: updates_rx,
            task: tokio::spawn(poller.run()),
        }
    }

    async fn run(mut self) {
        let Some(payment_id) = self.session.payment_id.clone() else {
            // Nothing to observe: no network activity, no countdown. The
            // session stays pending until the caller tears it down.
            tracing::debug!("No payment id supplied, poller is idle");
            return std::future::pending().await;
        };

        tracing::info!(
            payment_id = %payment_id,
            timeout_secs = self.session.timeout_seconds,
            "Payment watch started"
        );

        let (results_tx, mut results_rx) = mpsc::unbounded_channel();

        // The poll interval fires immediately so a fast-resolving payment is
        // detected without waiting a full period; the first countdown tick
        // lands a whole second in.
        let mut poll = interval(self.poll_interval);
        let mut countdown = interval_at(Instant::now() + COUNTDOWN_INTERVAL, COUNTDOWN_INTERVAL);

        loop {
            tokio::select! {
                _ = poll.tick() => self.start_check(&payment_id, &results_tx),
                Some(result) = results_rx.recv() => self.apply_check_result(result),
                _ = countdown.tick() => self.on_countdown_tick(),
            }

            self.publish();
            if self.session.stopped {
                break;
            }
        }

        tracing::info!(
            payment_id = %payment_id,
            status = self.session.status.as_str(),
            "Payment watch finished"
        );
    }

    fn start_check(&mut self, payment_id: &str, results_tx: &mpsc::UnboundedSender<CheckResult>) {
        // Guard-then-act: a tick queued before termination must not issue a
        // fresh request afterwards.
        if self.session.stopped || self.session.status.is_terminal() {
            return;
        }

        self.outstanding_checks += 1;
        let source = self.source.clone();
        let payment_id = payment_id.to_string();
        let results_tx = results_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_status(&payment_id).await;
            let _ = results_tx.send(result);
        });
    }

    fn apply_check_result(&mut self, result: CheckResult) {
        self.outstanding_checks = self.outstanding_checks.saturating_sub(1);

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                // Transient: no new information, the next tick retries
                tracing::warn!("Status check failed, will retry: {}", e);
                return;
            }
        };

        let Some(candidate) = normalize_status(&payload) else {
            tracing::debug!("Status payload carried no recognizable status");
            return;
        };

        match self.session.apply_candidate(candidate) {
            Some(PaymentStatus::Completed) => {
                tracing::info!("✅ Payment completed");
                if let Some(on_success) = self.on_success.take() {
                    on_success();
                }
            }
            Some(PaymentStatus::Failed) => {
                tracing::warn!("❌ Payment failed");
            }
            Some(_) | None => {}
        }
    }

    fn on_countdown_tick(&mut self) {
        if self.session.tick_countdown() {
            tracing::warn!("⏰ Payment window expired");
        } else if self.session.status == PaymentStatus::Pending
            && self.session.remaining_seconds == LOW_TIME_WARNING_SECS
        {
            tracing::warn!("Payment window closes in {} seconds", LOW_TIME_WARNING_SECS);
        }
    }

    fn publish(&self) {
        let _ = self
            .updates
            .send(self.session.snapshot(self.outstanding_checks > 0));
    }
}

/// Caller-side view of a running session. Dropping the handle aborts the
/// engine task; any in-flight check result then lands in a dead channel and
/// mutates nothing.
pub struct PollerHandle {
    updates: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.updates.borrow().clone()
    }

    /// Subscribe to session updates. The receiver outlives the handle and
    /// keeps reporting the last published snapshot after teardown.
    pub fn updates(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.clone()
    }

    /// Wait until the session reaches a terminal status. For an idle session
    /// (no payment id) this pends forever, matching its lifecycle.
    pub async fn wait_terminal(&mut self) -> PaymentStatus {
        loop {
            let status = self.updates.borrow().status;
            if status.is_terminal() {
                return status;
            }
            if self.updates.changed().await.is_err() {
                return self.updates.borrow().status;
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Session identity for the restart rule. Timeouts compare by bit pattern so
/// a NaN config does not force a restart on every configure call.
#[derive(Clone, PartialEq, Eq)]
struct SessionIdentity {
    payment_id: Option<String>,
    timeout_bits: Option<u64>,
}

impl SessionIdentity {
    fn of(config: &PollerConfig) -> Self {
        Self {
            payment_id: config.payment_id.clone(),
            timeout_bits: config.timeout_seconds.map(f64::to_bits),
        }
    }
}

/// Caller-facing session manager. A session restarts only when the
/// `(payment_id, timeout_seconds)` identity changes; reconfiguring with the
/// same identity leaves the running session untouched.
pub struct PaymentWatcher {
    source: Arc<dyn StatusSource>,
    current: Option<(SessionIdentity, PollerHandle)>,
}

impl PaymentWatcher {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self {
            source,
            current: None,
        }
    }

    /// Ensure a session exists for this configuration, replacing the previous
    /// one (and clearing its timers) when the identity differs.
    pub fn configure(
        &mut self,
        config: PollerConfig,
        on_success: impl FnOnce() + Send + 'static,
    ) -> &mut PollerHandle {
        let identity = SessionIdentity::of(&config);
        let keep = matches!(&self.current, Some((current, _)) if *current == identity);

        if !keep {
            let handle = PaymentStatusPoller::spawn(config, self.source.clone(), on_success);
            self.current = Some((identity, handle));
        }

        match self.current.as_mut() {
            Some((_, handle)) => handle,
            None => unreachable!("configure always leaves a live session"),
        }
    }

    pub fn handle(&mut self) -> Option<&mut PollerHandle> {
        self.current.as_mut().map(|(_, handle)| handle)
    }
}
