use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Countdown applied when the caller supplies no usable timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Expired,
}

impl PaymentStatus {
    /// Terminal states are sticky: once reached, no further transition occurs
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Observable session state published to the render surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: PaymentStatus,
    pub remaining_seconds: u64,
    pub is_checking: bool,
}

/// Sanitize a caller-supplied timeout. Input stays loosely typed because the
/// value usually arrives from an environment variable or an untrusted caller
/// config: absent, NaN and non-positive all fall back to the default.
pub fn sanitize_timeout(raw: Option<f64>) -> u64 {
    match raw {
        Some(secs) if secs.is_finite() && secs > 0.0 => secs as u64,
        _ => DEFAULT_TIMEOUT_SECS,
    }
}

/// Render a countdown as MM:SS for display
pub fn format_remaining(remaining_seconds: u64) -> String {
    format!("{}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

/// One payment's observation lifecycle. Memory-only, owned by the engine task
/// that created it.
#[derive(Debug, Clone)]
pub struct PollSession {
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
    pub timeout_seconds: u64,
    pub remaining_seconds: u64,
    pub stopped: bool,
    pub created_at: DateTime<Utc>,
}

impl PollSession {
    pub fn new(payment_id: Option<String>, timeout_seconds: Option<f64>) -> Self {
        let timeout_seconds = sanitize_timeout(timeout_seconds);
        Self {
            payment_id,
            status: PaymentStatus::Pending,
            timeout_seconds,
            remaining_seconds: timeout_seconds,
            stopped: false,
            created_at: Utc::now(),
        }
    }

    /// Apply a normalized candidate from a status check. Returns the terminal
    /// status newly entered, if any. A candidate equal to the current status,
    /// or arriving after the session stopped, takes no effect.
    pub fn apply_candidate(&mut self, candidate: PaymentStatus) -> Option<PaymentStatus> {
        if self.stopped || self.status.is_terminal() {
            return None;
        }
        if candidate == self.status {
            return None;
        }

        self.status = candidate;
        if candidate.is_terminal() {
            self.stopped = true;
            Some(candidate)
        } else {
            None
        }
    }

    /// One countdown tick. Returns true when this tick expired the session.
    pub fn tick_countdown(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        if self.remaining_seconds == 0 && self.status == PaymentStatus::Pending {
            self.status = PaymentStatus::Expired;
            self.stopped = true;
            return true;
        }
        false
    }

    pub fn snapshot(&self, is_checking: bool) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            remaining_seconds: self.remaining_seconds,
            is_checking,
        }
    }
}
