pub mod engine;
pub mod normalize;
pub mod session;

pub use engine::{PaymentStatusPoller, PaymentWatcher, PollerConfig, PollerHandle};
pub use normalize::normalize_status;
pub use session::{format_remaining, PaymentStatus, PollSession, SessionSnapshot};
