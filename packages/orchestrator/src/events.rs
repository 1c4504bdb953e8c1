//! Gravity contract event parsing
//!
//! Raw-log parsing for the two bridge events the oracle acts on. Layouts
//! match the contract's event declarations; indexed fields arrive as topics,
//! the rest ABI-packed in the data blob, one 32-byte word each.

use alloy::primitives::{keccak256, B256, U256};
use gravity_rs::EthAddress;
use serde::Serialize;

/// A deposit locked on the Ethereum side, to be claimed on the Cosmos side
///
/// Event: SendToCosmosEvent(address indexed tokenContract,
///                          address indexed sender,
///                          bytes32 indexed destination,
///                          uint256 amount, uint256 eventNonce)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendToCosmosEvent {
    pub token_contract: EthAddress,
    pub sender: EthAddress,
    /// Cosmos receiver account, bytes32-packed
    pub destination: [u8; 32],
    pub amount: U256,
    pub event_nonce: u64,
    pub block_number: u64,
}

/// A previously signed batch observed as executed on the Ethereum side
///
/// Event: TransactionBatchExecutedEvent(uint256 indexed batchNonce,
///                                      address indexed token,
///                                      uint256 eventNonce)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionBatchExecutedEvent {
    pub batch_nonce: u64,
    pub token_contract: EthAddress,
    pub event_nonce: u64,
    pub block_number: u64,
}

/// A finalized bridge event, ready to hand to the claim submitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Deposit plus the denom it mints on the Cosmos side
    Deposit {
        #[serde(flatten)]
        event: SendToCosmosEvent,
        denom: String,
    },
    BatchExecuted(TransactionBatchExecutedEvent),
}

impl BridgeEvent {
    pub fn block_number(&self) -> u64 {
        match self {
            BridgeEvent::Deposit { event, .. } => event.block_number,
            BridgeEvent::BatchExecuted(event) => event.block_number,
        }
    }
}

/// Topic hash of SendToCosmosEvent
pub fn send_to_cosmos_signature() -> B256 {
    keccak256(b"SendToCosmosEvent(address,address,bytes32,uint256,uint256)")
}

/// Topic hash of TransactionBatchExecutedEvent
pub fn batch_executed_signature() -> B256 {
    keccak256(b"TransactionBatchExecutedEvent(uint256,address,uint256)")
}

/// Extract the address right-aligned in a 32-byte topic word
fn address_from_topic(topic: &B256) -> EthAddress {
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&topic[12..]);
    EthAddress(addr)
}

/// Event nonces are uint256 on the wire but fit u64 for any realistic chain
/// lifetime; saturate rather than wrap if one ever does not.
fn nonce_from_word(word: &[u8]) -> u64 {
    u64::try_from(U256::from_be_slice(word)).unwrap_or(u64::MAX)
}

/// Parse a SendToCosmosEvent from a raw log
///
/// Topics: [signature, tokenContract, sender, destination]
/// Data layout (2 non-indexed fields × 32 bytes):
///   [0..32]  amount     (uint256)
///   [32..64] eventNonce (uint256)
pub fn parse_send_to_cosmos_log(log: &alloy::rpc::types::Log) -> Option<SendToCosmosEvent> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }

    let block_number = log.block_number?;

    let data = log.data().data.as_ref();
    if data.len() < 64 {
        return None;
    }

    Some(SendToCosmosEvent {
        token_contract: address_from_topic(&topics[1]),
        sender: address_from_topic(&topics[2]),
        destination: topics[3].0,
        amount: U256::from_be_slice(&data[0..32]),
        event_nonce: nonce_from_word(&data[32..64]),
        block_number,
    })
}

/// Parse a TransactionBatchExecutedEvent from a raw log
///
/// Topics: [signature, batchNonce, token]
/// Data layout: [0..32] eventNonce (uint256)
pub fn parse_batch_executed_log(
    log: &alloy::rpc::types::Log,
) -> Option<TransactionBatchExecutedEvent> {
    let topics = log.topics();
    if topics.len() < 3 {
        return None;
    }

    let block_number = log.block_number?;

    let data = log.data().data.as_ref();
    if data.len() < 32 {
        return None;
    }

    Some(TransactionBatchExecutedEvent {
        batch_nonce: nonce_from_word(&topics[1].0),
        token_contract: address_from_topic(&topics[2]),
        event_nonce: nonce_from_word(&data[0..32]),
        block_number,
    })
}
