//! Hashing primitives for commitment computation
//!
//! The on-chain verifier recomputes each commitment as keccak256 over the
//! ABI-encoded arguments of a `pure` contract function. The orchestrator must
//! reproduce that byte-for-byte, including stripping the 4-byte function
//! selector the call packer prepends.

use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Digest of an ABI-encoded function call, as the verifier computes it.
///
/// The first 4 bytes are the function selector. They are a fixed artifact of
/// the encoding step with no semantic content, so they are discarded before
/// hashing; the remainder is exactly `abi.encode(...)` of the arguments.
///
/// Panics if `call` is shorter than a selector, which cannot happen for
/// output of [`crate::abi::Function::encode_call`].
pub fn encoded_call_digest(call: &[u8]) -> [u8; 32] {
    keccak256(&call[4..])
}

/// Convert 32 bytes to a hex string with 0x prefix
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
