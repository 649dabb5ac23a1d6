use async_trait::async_trait;
use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum StatusSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status: {0}")]
    Api(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read seam against the backend resource representing an in-flight payment.
/// Implementations return the raw JSON body; no particular schema is mandated
/// beyond what the normalizer can extract.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, payment_id: &str) -> Result<serde_json::Value, StatusSourceError>;
}

/// HTTP status source
/// Queries the payment route first and falls back to the order route when it
/// fails for any reason. Both routes describe the same conceptual resource, so
/// the fallback only tolerates backend route variance.
pub struct HttpStatusSource {
    client: Client,
    base_url: String,
}

impl HttpStatusSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, StatusSourceError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(StatusSourceError::Api(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| StatusSourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self, payment_id: &str) -> Result<serde_json::Value, StatusSourceError> {
        let primary = format!("{}/api/payments/{}", self.base_url, payment_id);

        match self.fetch_json(&primary).await {
            Ok(body) => Ok(body),
            Err(primary_err) => {
                tracing::debug!(
                    "Primary status route failed ({}), trying order route",
                    primary_err
                );
                let fallback = format!("{}/api/orders/{}", self.base_url, payment_id);
                self.fetch_json(&fallback).await
            }
        }
    }
}
