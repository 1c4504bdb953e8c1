//! Hand-off client for the external signer/broadcaster daemon
//!
//! Signing keys never live in this process. Finalized events and computed
//! commitments are POSTed to a sidecar daemon that signs with the validator
//! key and broadcasts the resulting messages; this client is the whole extent
//! of that boundary.

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use gravity_rs::bytes32_to_hex;
use reqwest::Client;
use std::time::Duration;

use crate::events::BridgeEvent;
use crate::oracle::EventSink;
use crate::relayer::{Confirm, ConfirmRelay};

#[derive(Debug, Clone)]
pub struct SignerDaemonClient {
    base_url: String,
    client: Client,
}

impl SignerDaemonClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .wrap_err_with(|| format!("Failed to reach signer daemon at {}", path))?;

        if !response.status().is_success() {
            return Err(eyre!(
                "Signer daemon rejected {}: {} - {}",
                path,
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl EventSink for SignerDaemonClient {
    async fn submit_events(&self, events: &[BridgeEvent]) -> Result<()> {
        let body = serde_json::json!({ "events": events });
        self.post_json("/claims", &body).await
    }
}

#[async_trait]
impl ConfirmRelay for SignerDaemonClient {
    async fn relay_confirm(&self, confirm: &Confirm) -> Result<()> {
        let body = match confirm {
            Confirm::Valset { nonce, commitment } => serde_json::json!({
                "kind": "valset",
                "nonce": nonce,
                "commitment": bytes32_to_hex(commitment),
            }),
            Confirm::Batch {
                nonce,
                token_contract,
                commitment,
            } => serde_json::json!({
                "kind": "batch",
                "nonce": nonce,
                "token_contract": token_contract.to_hex(),
                "commitment": bytes32_to_hex(commitment),
            }),
        };
        self.post_json("/confirms", &body).await
    }
}
