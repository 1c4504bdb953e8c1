//! Contract-call ABI encoding, restricted to the verifier's subset
//!
//! The verifier contract recomputes commitments from a standard ABI-encoded
//! function call, so the orchestrator must produce the exact head/tail word
//! layout a contract-call encoder would: one 32-byte head word per argument
//! (static values in place, dynamic arrays as byte offsets into the tail),
//! then for each dynamic array a length word followed by one word per
//! element. Addresses are right-aligned in their word, unsigned integers are
//! big-endian left-padded, bytes32 values are used verbatim.
//!
//! Only the subset the commitments need is supported: uint256, address,
//! bytes32, and dynamic arrays of those scalars. Any divergence here -
//! argument order, integer width, padding, selector truncation - produces a
//! commitment the chain rejects, so the layouts are pinned by test vectors.

use alloy::primitives::U256;
use std::fmt;

use crate::hash::keccak256;
use crate::types::{EncodingError, EthAddress};

/// Schema type of one function argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Uint256,
    Address,
    Bytes32,
    Array(Box<ParamType>),
}

impl ParamType {
    /// Whether this type is encoded indirectly through the tail region
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamType::Array(_))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Uint256 => write!(f, "uint256"),
            ParamType::Address => write!(f, "address"),
            ParamType::Bytes32 => write!(f, "bytes32"),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

/// One typed argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(U256),
    Address(EthAddress),
    Bytes32([u8; 32]),
    Array(Vec<Value>),
}

impl Value {
    /// Check this value against a schema type. Array elements are checked
    /// recursively so a heterogeneous array cannot slip through.
    fn matches(&self, ty: &ParamType) -> bool {
        match (self, ty) {
            (Value::Uint(_), ParamType::Uint256) => true,
            (Value::Address(_), ParamType::Address) => true,
            (Value::Bytes32(_), ParamType::Bytes32) => true,
            (Value::Array(items), ParamType::Array(inner)) => {
                items.iter().all(|item| item.matches(inner))
            }
            _ => false,
        }
    }

    /// Encode a scalar value into its 32-byte word
    fn encode_word(&self) -> [u8; 32] {
        match self {
            Value::Uint(v) => v.to_be_bytes::<32>(),
            Value::Address(addr) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr.as_bytes());
                word
            }
            Value::Bytes32(bytes) => *bytes,
            // Arrays never reach here: encode_call routes them to the tail
            Value::Array(_) => unreachable!("arrays are not scalar words"),
        }
    }
}

/// An immutable function-call schema: name plus ordered argument types.
///
/// The production schemas are constructed once as static values and passed
/// into the encoder, so the encoder itself carries no hidden state and can be
/// tested against arbitrary schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    name: &'static str,
    inputs: Vec<ParamType>,
}

impl Function {
    /// Build a schema, rejecting shapes outside the supported subset
    /// (currently: dynamic arrays may only contain scalar types).
    pub fn new(name: &'static str, inputs: Vec<ParamType>) -> Result<Self, EncodingError> {
        for input in &inputs {
            if let ParamType::Array(inner) = input {
                if inner.is_dynamic() {
                    return Err(EncodingError::UnsupportedType(input.to_string()));
                }
            }
        }
        Ok(Function { name, inputs })
    }

    /// Canonical signature string, e.g. `checkpoint(bytes32,uint256,...)`
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|t| t.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// First 4 bytes of keccak256 over the canonical signature
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Encode a full function call: selector, head words, then tail regions.
    ///
    /// Dynamic-array offsets are measured in bytes from the start of the
    /// argument block (immediately after the selector), matching what the
    /// on-chain call decoder expects.
    pub fn encode_call(&self, args: &[Value]) -> Result<Vec<u8>, EncodingError> {
        if args.len() != self.inputs.len() {
            return Err(EncodingError::ArityMismatch {
                name: self.name,
                expected: self.inputs.len(),
                got: args.len(),
            });
        }
        for (index, (arg, ty)) in args.iter().zip(&self.inputs).enumerate() {
            if !arg.matches(ty) {
                return Err(EncodingError::TypeMismatch {
                    name: self.name,
                    index,
                    expected: ty.to_string(),
                });
            }
        }

        let head_len = 32 * args.len();
        let mut head = Vec::with_capacity(head_len);
        let mut tail = Vec::new();

        for arg in args {
            match arg {
                Value::Array(items) => {
                    let offset = U256::from(head_len + tail.len());
                    head.extend_from_slice(&offset.to_be_bytes::<32>());
                    tail.extend_from_slice(&U256::from(items.len()).to_be_bytes::<32>());
                    for item in items {
                        tail.extend_from_slice(&item.encode_word());
                    }
                }
                scalar => head.extend_from_slice(&scalar.encode_word()),
            }
        }

        let mut call = Vec::with_capacity(4 + head_len + tail.len());
        call.extend_from_slice(&self.selector());
        call.extend_from_slice(&head);
        call.extend_from_slice(&tail);
        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fn() -> Function {
        Function::new(
            "sample",
            vec![
                ParamType::Bytes32,
                ParamType::Uint256,
                ParamType::Array(Box::new(ParamType::Address)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_signature_rendering() {
        assert_eq!(sample_fn().signature(), "sample(bytes32,uint256,address[])");
    }

    #[test]
    fn test_nested_dynamic_rejected() {
        let err = Function::new(
            "bad",
            vec![ParamType::Array(Box::new(ParamType::Array(Box::new(
                ParamType::Uint256,
            ))))],
        )
        .unwrap_err();
        assert_eq!(err, EncodingError::UnsupportedType("uint256[][]".to_string()));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = sample_fn().encode_call(&[Value::Uint(U256::ZERO)]).unwrap_err();
        assert!(matches!(err, EncodingError::ArityMismatch { expected: 3, got: 1, .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let err = sample_fn()
            .encode_call(&[
                Value::Bytes32([0u8; 32]),
                Value::Bytes32([0u8; 32]),
                Value::Array(vec![]),
            ])
            .unwrap_err();
        assert!(matches!(err, EncodingError::TypeMismatch { index: 1, .. }));
    }

    #[test]
    fn test_heterogeneous_array_rejected() {
        let err = sample_fn()
            .encode_call(&[
                Value::Bytes32([0u8; 32]),
                Value::Uint(U256::ZERO),
                Value::Array(vec![Value::Uint(U256::ZERO)]),
            ])
            .unwrap_err();
        assert!(matches!(err, EncodingError::TypeMismatch { index: 2, .. }));
    }

    #[test]
    fn test_static_words() {
        let f = Function::new(
            "words",
            vec![ParamType::Uint256, ParamType::Address, ParamType::Bytes32],
        )
        .unwrap();
        let addr = EthAddress::from_hex("0xc783df8a850f42e7f7e57013759c285caa701eb6").unwrap();
        let call = f
            .encode_call(&[
                Value::Uint(U256::from(0x1234u64)),
                Value::Address(addr),
                Value::Bytes32([0xaa; 32]),
            ])
            .unwrap();

        assert_eq!(call.len(), 4 + 3 * 32);
        // uint256: big-endian, left-padded
        assert_eq!(&call[4..34], &[0u8; 30]);
        assert_eq!(&call[34..36], &[0x12, 0x34]);
        // address: right-aligned in its word
        assert_eq!(&call[36..48], &[0u8; 12]);
        assert_eq!(&call[48..68], addr.as_bytes());
        // bytes32: verbatim
        assert_eq!(&call[68..100], &[0xaa; 32]);
    }

    #[test]
    fn test_dynamic_array_layout() {
        // Two head words: a scalar and an offset pointing just past the head
        let f = Function::new(
            "arr",
            vec![
                ParamType::Uint256,
                ParamType::Array(Box::new(ParamType::Uint256)),
            ],
        )
        .unwrap();
        let call = f
            .encode_call(&[
                Value::Uint(U256::from(7u64)),
                Value::Array(vec![Value::Uint(U256::from(1u64)), Value::Uint(U256::from(2u64))]),
            ])
            .unwrap();

        // selector + 2 head words + length word + 2 elements
        assert_eq!(call.len(), 4 + 2 * 32 + 32 + 2 * 32);
        // offset word = 0x40 (two head words)
        assert_eq!(call[4 + 32 + 31], 0x40);
        // length word = 2
        assert_eq!(call[4 + 64 + 31], 2);
        // elements
        assert_eq!(call[4 + 96 + 31], 1);
        assert_eq!(call[4 + 128 + 31], 2);
    }

    #[test]
    fn test_empty_array_layout() {
        let f = Function::new("arr", vec![ParamType::Array(Box::new(ParamType::Uint256))]).unwrap();
        let call = f.encode_call(&[Value::Array(vec![])]).unwrap();
        // selector + offset word + length word (zero)
        assert_eq!(call.len(), 4 + 32 + 32);
        assert_eq!(call[4 + 31], 0x20);
        assert_eq!(&call[4 + 32..], &[0u8; 32]);
    }

    #[test]
    fn test_two_arrays_tail_packing() {
        // Second array's offset must account for the first array's tail
        let f = Function::new(
            "pair",
            vec![
                ParamType::Array(Box::new(ParamType::Uint256)),
                ParamType::Array(Box::new(ParamType::Uint256)),
            ],
        )
        .unwrap();
        let call = f
            .encode_call(&[
                Value::Array(vec![Value::Uint(U256::from(9u64))]),
                Value::Array(vec![Value::Uint(U256::from(8u64))]),
            ])
            .unwrap();

        // head: offsets 0x40 and 0x80 (0x40 + length word + one element)
        assert_eq!(call[4 + 31], 0x40);
        assert_eq!(call[4 + 32 + 31], 0x80);
    }
}
