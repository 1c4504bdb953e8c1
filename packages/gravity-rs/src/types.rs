//! Core value types shared by the commitment builders and the orchestrator
//!
//! All of these are immutable snapshots: the orchestrator hands them to the
//! builders by value and never mutates them in place. Member and transaction
//! order is significant and must be preserved exactly as received, because it
//! is part of the hashed payload.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while turning logical structures into verifier-compatible
/// bytes. These are configuration or programmer defects, not runtime
/// conditions: the enclosing operation must abort rather than emit a
/// possibly-wrong commitment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid ethereum address {0:?}")]
    InvalidAddress(String),

    #[error("invalid bridge id {0:?}")]
    InvalidBridgeId(String),

    #[error("invalid {field} value {value:?}")]
    InvalidAmount { field: &'static str, value: String },

    #[error("{name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("argument {index} of {name} does not match schema type {expected}")]
    TypeMismatch {
        name: &'static str,
        index: usize,
        expected: String,
    },

    #[error("unsupported schema type {0}")]
    UnsupportedType(String),
}

/// Parse a decimal string amount (Cosmos sdk.Int JSON form) into a `U256`.
///
/// This is the single boundary where missing, unparseable, negative or
/// oversized amounts are rejected. A value that does not fit 256 bits fails
/// here instead of being silently truncated downstream.
pub fn parse_amount(field: &'static str, value: &str) -> Result<U256, EncodingError> {
    let invalid = || EncodingError::InvalidAmount {
        field,
        value: value.to_string(),
    };
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| invalid())
}

// ============================================================================
// Bridge instance ID (32 bytes)
// ============================================================================

/// Opaque 32-byte identifier of one deployed bridge contract instance.
///
/// Included in every commitment so a signature for one deployment can never
/// be replayed against another. Immutable, supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BridgeId(pub [u8; 32]);

impl BridgeId {
    /// Create from the raw 32 bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        BridgeId(bytes)
    }

    /// Create from a short ASCII label, right-padded with zeros to 32 bytes.
    /// This is how deployments conventionally pick their id (e.g. "gravity").
    pub fn from_label(label: &str) -> Result<Self, EncodingError> {
        let raw = label.as_bytes();
        if raw.is_empty() || raw.len() > 32 {
            return Err(EncodingError::InvalidBridgeId(label.to_string()));
        }
        let mut bytes = [0u8; 32];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(BridgeId(bytes))
    }

    /// Create from a 64-char hex string (with or without 0x prefix)
    pub fn from_hex(hex_str: &str) -> Result<Self, EncodingError> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|_| EncodingError::InvalidBridgeId(hex_str.to_string()))?;
        if bytes.len() != 32 {
            return Err(EncodingError::InvalidBridgeId(hex_str.to_string()));
        }
        let mut result = [0u8; 32];
        result.copy_from_slice(&bytes);
        Ok(BridgeId(result))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ============================================================================
// Ethereum address (20 bytes)
// ============================================================================

/// Ethereum-side address (20 bytes).
///
/// The canonical textual form is lowercase 0x-prefixed hex; `to_hex` is also
/// the cache key used by the denom cache, so distinct spellings of one
/// address normalize to the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    /// Create from hex string (with or without 0x prefix).
    ///
    /// Accepts both 20-byte addresses (40 hex chars) and 32-byte padded
    /// addresses (64 hex chars). For 32-byte input the first 12 bytes must be
    /// zeros and the last 20 bytes are extracted.
    pub fn from_hex(hex_str: &str) -> Result<Self, EncodingError> {
        let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(stripped)
            .map_err(|_| EncodingError::InvalidAddress(hex_str.to_string()))?;

        match bytes.len() {
            20 => {
                let mut result = [0u8; 20];
                result.copy_from_slice(&bytes);
                Ok(EthAddress(result))
            }
            32 => {
                if bytes[..12].iter().any(|&b| b != 0) {
                    return Err(EncodingError::InvalidAddress(hex_str.to_string()));
                }
                let mut result = [0u8; 20];
                result.copy_from_slice(&bytes[12..]);
                Ok(EthAddress(result))
            }
            _ => Err(EncodingError::InvalidAddress(hex_str.to_string())),
        }
    }

    /// The all-zeros address, used for "no reward token"
    pub fn zero() -> Self {
        EthAddress([0u8; 20])
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Canonical lowercase hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for EthAddress {
    fn from(bytes: [u8; 20]) -> Self {
        EthAddress(bytes)
    }
}

// ============================================================================
// Validator sets
// ============================================================================

/// One member of a validator set: its Ethereum-side address and voting power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetMember {
    pub power: u64,
    pub eth_address: EthAddress,
}

/// One versioned snapshot of the validator set.
///
/// `nonce` increases monotonically with each new version. The member order is
/// part of the hashed payload and is never re-sorted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valset {
    pub nonce: u64,
    pub members: Vec<ValsetMember>,
    pub reward_amount: U256,
    pub reward_token: EthAddress,
}

// ============================================================================
// Outgoing transaction batches
// ============================================================================

/// A single transfer inside an outgoing batch. Amount and fee are denominated
/// in the token's smallest unit and are non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTransfer {
    pub amount: U256,
    pub fee: U256,
    pub destination: EthAddress,
}

/// One outgoing batch of transfers toward the Ethereum side.
///
/// `timeout` is an Ethereum block height after which the batch is no longer
/// executable. Transaction order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBatch {
    pub nonce: u64,
    pub token_contract: EthAddress,
    pub timeout: u64,
    pub transactions: Vec<BatchTransfer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_id_from_label() {
        let id = BridgeId::from_label("defaultgravityid").unwrap();
        assert_eq!(&id.0[..16], b"defaultgravityid");
        assert_eq!(&id.0[16..], &[0u8; 16]);
        assert_eq!(
            id.to_hex(),
            "0x64656661756c7467726176697479696400000000000000000000000000000000"
        );
    }

    #[test]
    fn test_bridge_id_label_too_long() {
        let long = "x".repeat(33);
        assert!(BridgeId::from_label(&long).is_err());
        assert!(BridgeId::from_label("").is_err());
    }

    #[test]
    fn test_bridge_id_hex_round_trip() {
        let id = BridgeId::from_label("gravity-test").unwrap();
        let parsed = BridgeId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_eth_address_from_hex() {
        let addr = EthAddress::from_hex("0xdead000000000000000000000000000000000000").unwrap();
        assert_eq!(addr.0[0], 0xde);
        assert_eq!(addr.0[1], 0xad);
    }

    #[test]
    fn test_eth_address_normalizes_case() {
        let upper = EthAddress::from_hex("0xC783df8a850f42e7F7e57013759C285caa701eB6").unwrap();
        let lower = EthAddress::from_hex("0xc783df8a850f42e7f7e57013759c285caa701eb6").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(
            upper.to_hex(),
            "0xc783df8a850f42e7f7e57013759c285caa701eb6"
        );
    }

    #[test]
    fn test_eth_address_from_padded_hex() {
        let addr = EthAddress::from_hex(
            "0x000000000000000000000000c783df8a850f42e7f7e57013759c285caa701eb6",
        )
        .unwrap();
        assert_eq!(addr.0[0], 0xc7);

        // Non-zero padding must be rejected, not truncated
        let bad = EthAddress::from_hex(
            "0x010000000000000000000000c783df8a850f42e7f7e57013759c285caa701eb6",
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_eth_address_bad_length() {
        assert!(EthAddress::from_hex("0x1234").is_err());
        assert!(EthAddress::from_hex("not hex at all").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("reward", "0").unwrap(), U256::ZERO);
        assert_eq!(
            parse_amount("reward", "1000000000000000000").unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("reward", "").is_err());
        assert!(parse_amount("reward", "abc").is_err());
        assert!(parse_amount("reward", "-5").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_overflow() {
        // 2^256 exactly, one past the largest representable value
        let too_big = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        let err = parse_amount("amount", too_big).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidAmount { field: "amount", .. }));

        // 2^256 - 1 still fits
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(parse_amount("amount", max).unwrap(), U256::MAX);
    }
}
