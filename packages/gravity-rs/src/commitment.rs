//! Checkpoint and batch confirmation hashes
//!
//! These are the two values validators sign. The verifier contract computes
//! its expected commitment by ABI-encoding the same fields as a call to one
//! of its `pure` functions and hashing the argument bytes, so each builder
//! encodes through the matching schema and strips the selector before
//! hashing (see [`crate::hash::encoded_call_digest`]).
//!
//! Each payload carries a constant 32-byte method-name word ("checkpoint" /
//! "transactionBatch") in addition to the selector. That word is part of the
//! hashed bytes and domain-separates the two commitment kinds: a signature
//! over a batch can never double as a signature over a checkpoint, even if
//! the surrounding fields were to line up structurally.

use alloy::primitives::U256;
use lazy_static::lazy_static;

use crate::abi::{Function, ParamType, Value};
use crate::hash::encoded_call_digest;
use crate::types::{BridgeId, EncodingError, TransactionBatch, Valset};

lazy_static! {
    /// checkpoint(bytes32 bridgeId, bytes32 methodName, uint256 valsetNonce,
    ///            address[] validators, uint256[] powers,
    ///            uint256 rewardAmount, address rewardToken)
    static ref CHECKPOINT_CALL: Function = Function::new(
        "checkpoint",
        vec![
            ParamType::Bytes32,
            ParamType::Bytes32,
            ParamType::Uint256,
            ParamType::Array(Box::new(ParamType::Address)),
            ParamType::Array(Box::new(ParamType::Uint256)),
            ParamType::Uint256,
            ParamType::Address,
        ],
    )
    .expect("checkpoint schema is within the supported subset");

    /// transactionBatch(bytes32 bridgeId, bytes32 methodName,
    ///                  uint256[] amounts, address[] destinations,
    ///                  uint256[] fees, uint256 batchNonce,
    ///                  address tokenContract, uint256 batchTimeout)
    static ref TRANSACTION_BATCH_CALL: Function = Function::new(
        "transactionBatch",
        vec![
            ParamType::Bytes32,
            ParamType::Bytes32,
            ParamType::Array(Box::new(ParamType::Uint256)),
            ParamType::Array(Box::new(ParamType::Address)),
            ParamType::Array(Box::new(ParamType::Uint256)),
            ParamType::Uint256,
            ParamType::Address,
            ParamType::Uint256,
        ],
    )
    .expect("transactionBatch schema is within the supported subset");
}

/// Force both schemas at startup so a schema outside the encoder's subset
/// aborts the process before any loop runs, rather than on first use.
pub fn init_schemas() {
    lazy_static::initialize(&CHECKPOINT_CALL);
    lazy_static::initialize(&TRANSACTION_BATCH_CALL);
}

/// ASCII method name right-padded with zeros to a 32-byte payload word
fn method_name_word(name: &str) -> [u8; 32] {
    debug_assert!(name.len() <= 32);
    let mut word = [0u8; 32];
    word[..name.len()].copy_from_slice(name.as_bytes());
    word
}

/// Commitment hash for one validator-set snapshot.
///
/// Validators sign this to authorize recognizing the set version `nonce` on
/// the Ethereum side. Member order is encoded exactly as given; powers are
/// promoted from u64 to uint256 words.
pub fn valset_confirm_hash(
    bridge_id: &BridgeId,
    valset: &Valset,
) -> Result<[u8; 32], EncodingError> {
    let mut validators = Vec::with_capacity(valset.members.len());
    let mut powers = Vec::with_capacity(valset.members.len());
    for member in &valset.members {
        validators.push(Value::Address(member.eth_address));
        powers.push(Value::Uint(U256::from(member.power)));
    }

    let call = CHECKPOINT_CALL.encode_call(&[
        Value::Bytes32(*bridge_id.as_bytes()),
        Value::Bytes32(method_name_word("checkpoint")),
        Value::Uint(U256::from(valset.nonce)),
        Value::Array(validators),
        Value::Array(powers),
        Value::Uint(valset.reward_amount),
        Value::Address(valset.reward_token),
    ])?;

    Ok(encoded_call_digest(&call))
}

/// Commitment hash for one outgoing transaction batch.
///
/// Validators sign this to authorize executing the batch on the Ethereum
/// side. The per-transfer fields are flattened into parallel arrays in
/// original transaction order.
pub fn batch_confirm_hash(
    bridge_id: &BridgeId,
    batch: &TransactionBatch,
) -> Result<[u8; 32], EncodingError> {
    let mut amounts = Vec::with_capacity(batch.transactions.len());
    let mut destinations = Vec::with_capacity(batch.transactions.len());
    let mut fees = Vec::with_capacity(batch.transactions.len());
    for tx in &batch.transactions {
        amounts.push(Value::Uint(tx.amount));
        destinations.push(Value::Address(tx.destination));
        fees.push(Value::Uint(tx.fee));
    }

    let call = TRANSACTION_BATCH_CALL.encode_call(&[
        Value::Bytes32(*bridge_id.as_bytes()),
        Value::Bytes32(method_name_word("transactionBatch")),
        Value::Array(amounts),
        Value::Array(destinations),
        Value::Array(fees),
        Value::Uint(U256::from(batch.nonce)),
        Value::Address(batch.token_contract),
        Value::Uint(U256::from(batch.timeout)),
    ])?;

    Ok(encoded_call_digest(&call))
}
