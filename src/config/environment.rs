use std::env;

/// Environment configuration
/// Loads and validates environment variables
pub struct Config {
    pub status_api_url: String,
    pub payment_id: Option<String>,
    pub qr_code_url: Option<String>,
    pub amount: Option<f64>,
    pub timeout_seconds: Option<f64>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let status_api_url = env::var("STATUS_API_URL")
            .map_err(|_| "STATUS_API_URL must be set".to_string())?;

        let payment_id = env::var("PAYMENT_ID").ok().filter(|v| !v.is_empty());

        let qr_code_url = env::var("QR_CODE_URL").ok().filter(|v| !v.is_empty());

        // Loosely typed on purpose: a malformed value behaves like an absent one
        let amount = env::var("AMOUNT").ok().and_then(|v| v.parse().ok());

        let timeout_seconds = env::var("PAYMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok());

        Ok(Self {
            status_api_url,
            payment_id,
            qr_code_url,
            amount,
            timeout_seconds,
        })
    }
}
