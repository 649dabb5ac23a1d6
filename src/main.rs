use std::sync::Arc;

use payment_monitor::config::environment::Config;
use payment_monitor::services::poller::{format_remaining, PaymentStatus, PollerConfig};
use payment_monitor::services::status_source::HttpStatusSource;
use payment_monitor::PaymentStatusPoller;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payment_monitor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load environment configuration");

    let Some(payment_id) = config.payment_id.clone() else {
        tracing::warn!("PAYMENT_ID is not set, nothing to watch");
        return;
    };

    let source = Arc::new(HttpStatusSource::new(config.status_api_url.clone()));

    let poller_config = PollerConfig {
        payment_id: Some(payment_id.clone()),
        qr_code_url: config.qr_code_url.clone(),
        amount: config.amount,
        timeout_seconds: config.timeout_seconds,
        poll_interval: None,
    };

    let mut handle = PaymentStatusPoller::spawn(poller_config, source, move || {
        tracing::info!("🎉 Payment confirmed, order can proceed");
    });

    // Render surface: print the countdown and status until a terminal outcome
    let mut updates = handle.updates();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow().clone();
            tracing::debug!(
                "[{}] {} remaining{}",
                snapshot.status.as_str(),
                format_remaining(snapshot.remaining_seconds),
                if snapshot.is_checking { " (checking...)" } else { "" }
            );
        }
    });

    match handle.wait_terminal().await {
        PaymentStatus::Completed => tracing::info!("Payment successful"),
        PaymentStatus::Failed => tracing::error!("Payment failed"),
        PaymentStatus::Expired => tracing::error!("Payment window expired"),
        status => tracing::warn!("Watch ended without a terminal status: {}", status.as_str()),
    }
}
