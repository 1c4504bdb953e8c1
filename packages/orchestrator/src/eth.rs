//! Ethereum JSON-RPC client for the Gravity contract
//!
//! Thin wrapper over an alloy HTTP provider: block height plus chunked log
//! fetches for the bridge contract. All event interpretation lives in
//! [`crate::events`].

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::http::{Client, Http};
use eyre::{Result, WrapErr};
use std::str::FromStr;

use crate::config::EthereumConfig;

#[derive(Debug, Clone)]
pub struct EthClient {
    provider: RootProvider<Http<Client>>,
    gravity_address: Address,
    max_scan_range: u64,
}

impl EthClient {
    pub fn new(config: &EthereumConfig) -> Result<Self> {
        let url = config.rpc_url.parse().wrap_err("Failed to parse RPC URL")?;
        let provider = ProviderBuilder::new().on_http(url);

        let gravity_address =
            Address::from_str(&config.gravity_address).wrap_err("Invalid gravity address")?;

        Ok(Self {
            provider,
            gravity_address,
            max_scan_range: config.max_scan_range,
        })
    }

    /// Current chain head
    pub async fn latest_block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .wrap_err("Failed to get block number")
    }

    /// Chain id, logged at startup as a sanity check against misconfiguration
    pub async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .wrap_err("Failed to get chain id")
    }

    /// All logs emitted by the gravity contract in `[from_block, to_block]`,
    /// chunked so a large catch-up range stays within provider limits
    pub async fn gravity_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>> {
        let mut all_logs = Vec::new();
        let mut current_from = from_block;

        while current_from <= to_block {
            let current_to = std::cmp::min(
                current_from.saturating_add(self.max_scan_range - 1),
                to_block,
            );

            let filter = Filter::new()
                .address(self.gravity_address)
                .from_block(current_from)
                .to_block(current_to);

            let logs = self.provider.get_logs(&filter).await.wrap_err_with(|| {
                format!(
                    "Failed to get logs from block {} to {}",
                    current_from, current_to
                )
            })?;

            all_logs.extend(logs);
            current_from = current_to + 1;
        }

        Ok(all_logs)
    }
}
