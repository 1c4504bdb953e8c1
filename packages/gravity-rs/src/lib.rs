//! Gravity-RS: Shared Core Library for the Gravity Bridge Orchestrator
//!
//! This crate holds the trust-critical, pure pieces of the orchestrator:
//!
//! - **Types** - `BridgeId`, `EthAddress`, validator sets and transaction batches
//! - **ABI Encoding** - The call-encoding subset the on-chain verifier expects
//! - **Hashing** - keccak256 and the selector-discarding commitment digest
//! - **Commitments** - Checkpoint and batch confirmation hashes
//! - **Finality** - Height-dependent confirmation-delay policy
//!
//! Everything here is deterministic and free of I/O: the same logical inputs
//! always produce the same bytes, which is the property independent validators
//! rely on to converge on one commitment to sign.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! gravity-rs = { path = "../gravity-rs" }
//! ```

pub mod abi;
pub mod commitment;
pub mod finality;
pub mod hash;
pub mod types;

// Re-export commonly used items at the crate root
pub use abi::{Function, ParamType, Value};
pub use commitment::{batch_confirm_hash, valset_confirm_hash};
pub use finality::{DelayRange, FinalityRule};
pub use hash::{bytes32_to_hex, encoded_call_digest, keccak256};
pub use types::{
    parse_amount, BatchTransfer, BridgeId, EncodingError, EthAddress, TransactionBatch, Valset,
    ValsetMember,
};
