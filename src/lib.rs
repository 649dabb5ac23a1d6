pub mod config;
pub mod services;

pub use services::poller::{
    format_remaining, PaymentStatus, PaymentStatusPoller, PaymentWatcher, PollSession,
    PollerConfig, PollerHandle, SessionSnapshot,
};
pub use services::status_source::{HttpStatusSource, StatusSource, StatusSourceError};
