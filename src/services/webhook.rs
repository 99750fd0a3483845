use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Outbound delivery of submission events to the configured collaborator.
/// Callers treat delivery as best-effort; nothing upstream blocks on it.
#[derive(Clone)]
pub struct WebhookService {
    client: Client,
    target_url: Option<String>,
    secret: Option<String>,
}

impl WebhookService {
    pub fn new(target_url: Option<String>, secret: Option<String>) -> Self {
        // An unresponsive target must not hold a delivery open forever.
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client for webhook delivery");
        Self {
            client,
            target_url,
            secret,
        }
    }

    pub async fn deliver(&self, event_type: &str, payload: &JsonValue) -> Result<()> {
        let Some(url) = self.target_url.as_deref() else {
            debug!(event = event_type, "no webhook target configured, skipping");
            return Ok(());
        };

        let body = serde_json::to_vec(payload)?;
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-Event-Type", event_type);
        if let Some(signature) = self.secret.as_deref().and_then(|s| sign(s, &body)) {
            request = request.header("X-Signature", signature);
        }

        let response = request.body(body).send().await?;
        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "webhook target answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
