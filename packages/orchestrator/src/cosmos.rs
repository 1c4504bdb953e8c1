//! Cosmos LCD query client
//!
//! Typed query methods over the gravity module's REST endpoints. Amounts and
//! nonces arrive as JSON strings (sdk.Int marshalling); the wire structs keep
//! them as strings and the `TryFrom` conversions below are the one place they
//! are parsed into core types, so a bad amount fails loudly before any
//! commitment is computed.

use eyre::{eyre, Result, WrapErr};
use gravity_rs::{
    parse_amount, BatchTransfer, EthAddress, TransactionBatch, Valset, ValsetMember,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Gravity module LCD query client
#[derive(Debug, Clone)]
pub struct CosmosQueryClient {
    /// LCD URL
    lcd_url: String,
    /// HTTP client
    client: Client,
}

impl CosmosQueryClient {
    /// Create a new query client
    pub fn new(lcd_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            lcd_url: lcd_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.lcd_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err_with(|| format!("Failed to query {}", path))?;

        if !response.status().is_success() {
            return Err(eyre!(
                "Query {} failed: {} - {}",
                path,
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }

    // =========================================================================
    // Gravity Module Queries
    // =========================================================================

    /// Get the currently active validator set
    pub async fn current_valset(&self) -> Result<Valset> {
        let data = self.get_json("/gravity/v1beta/valset/current").await?;
        let wire: ValsetWire = serde_json::from_value(
            data.get("valset")
                .cloned()
                .ok_or_else(|| eyre!("Missing 'valset' field in response"))?,
        )?;
        wire.try_into()
    }

    /// Oldest validator-set update this orchestrator has not yet confirmed,
    /// or None when everything is signed
    pub async fn last_pending_valset(&self, orchestrator_address: &str) -> Result<Option<Valset>> {
        let path = format!(
            "/gravity/v1beta/valset/last_pending_valset_by_addr/{}",
            orchestrator_address
        );
        let data = self.get_json(&path).await?;

        let wires: Vec<ValsetWire> = match data.get("valsets") {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())?,
            _ => Vec::new(),
        };
        wires.into_iter().next().map(Valset::try_from).transpose()
    }

    /// Oldest outgoing batch this orchestrator has not yet confirmed
    pub async fn last_pending_batch(
        &self,
        orchestrator_address: &str,
    ) -> Result<Option<TransactionBatch>> {
        let path = format!(
            "/gravity/v1beta/batch/last_pending_batch_by_addr/{}",
            orchestrator_address
        );
        let data = self.get_json(&path).await?;

        let wires: Vec<BatchWire> = match data.get("batch") {
            Some(value) if value.is_array() => serde_json::from_value(value.clone())?,
            Some(value) if !value.is_null() => vec![serde_json::from_value(value.clone())?],
            _ => Vec::new(),
        };
        wires
            .into_iter()
            .next()
            .map(TransactionBatch::try_from)
            .transpose()
    }

    /// Look up the internal denomination bound to an ERC20 contract.
    /// Returns None when the chain has no binding for that token.
    pub async fn erc20_to_denom(&self, erc20: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/gravity/v1beta/cosmos_originated/erc20_to_denom?erc20={}",
            self.lcd_url, erc20
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err("Failed to query erc20_to_denom")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(eyre!(
                "erc20_to_denom query failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let data: serde_json::Value = response.json().await?;
        let denom = data
            .get("denom")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if denom.is_empty() {
            Ok(None)
        } else {
            Ok(Some(denom.to_string()))
        }
    }

    // =========================================================================
    // Chain Queries
    // =========================================================================

    /// Get current block height
    pub async fn latest_block_height(&self) -> Result<u64> {
        let data = self
            .get_json("/cosmos/base/tendermint/v1beta1/blocks/latest")
            .await?;
        data.get("block")
            .and_then(|b| b.get("header"))
            .and_then(|h| h.get("height"))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| eyre!("Failed to parse block height"))
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ValsetMemberWire {
    pub power: String,
    #[serde(default)]
    pub ethereum_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValsetWire {
    pub nonce: String,
    #[serde(default)]
    pub members: Vec<ValsetMemberWire>,
    pub reward_amount: String,
    #[serde(default)]
    pub reward_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Erc20TokenWire {
    pub contract: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchTransferWire {
    pub dest_address: String,
    pub erc20_token: Erc20TokenWire,
    pub erc20_fee: Erc20TokenWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchWire {
    pub batch_nonce: String,
    pub batch_timeout: String,
    pub token_contract: String,
    #[serde(default)]
    pub transactions: Vec<BatchTransferWire>,
}

/// An unset address on the wire (member not yet registered, no reward token)
/// means the zero address, matching the contract's treatment.
fn parse_optional_address(raw: &Option<String>) -> Result<EthAddress> {
    match raw.as_deref() {
        None | Some("") => Ok(EthAddress::zero()),
        Some(s) => Ok(EthAddress::from_hex(s)?),
    }
}

impl TryFrom<ValsetWire> for Valset {
    type Error = eyre::Report;

    fn try_from(wire: ValsetWire) -> Result<Self> {
        let nonce: u64 = wire.nonce.parse().wrap_err("bad valset nonce")?;

        let mut members = Vec::with_capacity(wire.members.len());
        for member in &wire.members {
            members.push(ValsetMember {
                power: member.power.parse().wrap_err("bad member power")?,
                eth_address: parse_optional_address(&member.ethereum_address)?,
            });
        }

        Ok(Valset {
            nonce,
            members,
            reward_amount: parse_amount("reward", &wire.reward_amount)?,
            reward_token: parse_optional_address(&wire.reward_token)?,
        })
    }
}

impl TryFrom<BatchWire> for TransactionBatch {
    type Error = eyre::Report;

    fn try_from(wire: BatchWire) -> Result<Self> {
        let mut transactions = Vec::with_capacity(wire.transactions.len());
        for tx in &wire.transactions {
            transactions.push(BatchTransfer {
                amount: parse_amount("amount", &tx.erc20_token.amount)?,
                fee: parse_amount("fee", &tx.erc20_fee.amount)?,
                destination: EthAddress::from_hex(&tx.dest_address)?,
            });
        }

        Ok(TransactionBatch {
            nonce: wire.batch_nonce.parse().wrap_err("bad batch nonce")?,
            token_contract: EthAddress::from_hex(&wire.token_contract)?,
            timeout: wire.batch_timeout.parse().wrap_err("bad batch timeout")?,
            transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    #[test]
    fn test_query_client_creation() {
        let client = CosmosQueryClient::new("http://localhost:1317/");
        assert_eq!(client.lcd_url, "http://localhost:1317");
    }

    #[test]
    fn test_valset_wire_conversion() {
        let json = serde_json::json!({
            "nonce": "12",
            "members": [
                { "power": "1000", "ethereum_address": "0xc783df8a850f42e7F7e57013759C285caa701eB6" },
                { "power": "500" }
            ],
            "reward_amount": "250",
            "reward_token": "0x7c2C195CD6D34B8F845992d380aADB2730bB9C6F",
            "height": "88"
        });
        let wire: ValsetWire = serde_json::from_value(json).unwrap();
        let valset = Valset::try_from(wire).unwrap();

        assert_eq!(valset.nonce, 12);
        assert_eq!(valset.members.len(), 2);
        assert_eq!(valset.members[0].power, 1000);
        // member without an address resolves to the zero address
        assert_eq!(valset.members[1].eth_address, EthAddress::zero());
        assert_eq!(valset.reward_amount, U256::from(250u64));
    }

    #[test]
    fn test_valset_wire_bad_reward_rejected() {
        let json = serde_json::json!({
            "nonce": "1",
            "members": [],
            "reward_amount": "not-a-number"
        });
        let wire: ValsetWire = serde_json::from_value(json).unwrap();
        assert!(Valset::try_from(wire).is_err());
    }

    #[test]
    fn test_batch_wire_conversion() {
        let json = serde_json::json!({
            "batch_nonce": "4",
            "batch_timeout": "4766922",
            "token_contract": "0x7c2C195CD6D34B8F845992d380aADB2730bB9C6F",
            "transactions": [
                {
                    "id": "9",
                    "sender": "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu",
                    "dest_address": "0x9FC9C2DfBA3b6cF204C37a5F690619772b926e39",
                    "erc20_token": { "contract": "0x7c2C195CD6D34B8F845992d380aADB2730bB9C6F", "amount": "10000" },
                    "erc20_fee": { "contract": "0x7c2C195CD6D34B8F845992d380aADB2730bB9C6F", "amount": "100" }
                }
            ]
        });
        let wire: BatchWire = serde_json::from_value(json).unwrap();
        let batch = TransactionBatch::try_from(wire).unwrap();

        assert_eq!(batch.nonce, 4);
        assert_eq!(batch.timeout, 4766922);
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].amount, U256::from(10_000u64));
        assert_eq!(batch.transactions[0].fee, U256::from(100u64));
    }

    #[test]
    fn test_batch_wire_bad_amount_rejected() {
        let json = serde_json::json!({
            "batch_nonce": "4",
            "batch_timeout": "100",
            "token_contract": "0x7c2C195CD6D34B8F845992d380aADB2730bB9C6F",
            "transactions": [
                {
                    "dest_address": "0x9FC9C2DfBA3b6cF204C37a5F690619772b926e39",
                    "erc20_token": { "contract": "0x7c2C195CD6D34B8F845992d380aADB2730bB9C6F", "amount": "-5" },
                    "erc20_fee": { "contract": "0x7c2C195CD6D34B8F845992d380aADB2730bB9C6F", "amount": "1" }
                }
            ]
        });
        let wire: BatchWire = serde_json::from_value(json).unwrap();
        assert!(TransactionBatch::try_from(wire).is_err());
    }
}
