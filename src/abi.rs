//! Minimal ABI encoding for contract calls and event topics.
//!
//! The deploy steps only ever pass statically-sized arguments (addresses,
//! uints, bools, bytes32), so this module implements head-only encoding:
//! a 4-byte selector followed by one 32-byte word per argument. Dynamic
//! types are out of scope.

use crate::error::{DeployError, Result};
use alloy_primitives::{keccak256, Address, B256, U256};

/// A statically-sized ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// 20-byte address, left-padded to a word
    Address(Address),
    /// Unsigned 256-bit integer
    Uint(U256),
    /// Boolean, encoded as 0 or 1
    Bool(bool),
    /// Raw 32-byte word
    FixedBytes(B256),
}

impl Token {
    /// Encode this value as a single 32-byte word
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Address(addr) => word[12..].copy_from_slice(addr.as_slice()),
            Token::Uint(value) => word.copy_from_slice(&value.to_be_bytes::<32>()),
            Token::Bool(flag) => word[31] = *flag as u8,
            Token::FixedBytes(bytes) => word.copy_from_slice(bytes.as_slice()),
        }
        word
    }
}

/// 4-byte function selector for a canonical signature, e.g. `createMarket(address,address)`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Event topic0 for a canonical event signature, e.g. `MarketCreated(address,address)`
pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

/// Encode a full calldata payload as a 0x-prefixed hex string
pub fn encode_call(signature: &str, args: &[Token]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * 32);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&arg.to_word());
    }
    format!("0x{}", hex::encode(data))
}

/// Encode constructor arguments (no selector) appended to creation bytecode
pub fn encode_constructor_args(args: &[Token]) -> String {
    let mut data = Vec::with_capacity(args.len() * 32);
    for arg in args {
        data.extend_from_slice(&arg.to_word());
    }
    hex::encode(data)
}

/// Encode a short ASCII name as a right-padded bytes32 word, Solidity style
pub fn bytes32_from_str(name: &str) -> Result<B256> {
    let bytes = name.as_bytes();
    if bytes.len() > 32 {
        return Err(DeployError::AbiError(format!(
            "'{}' does not fit in bytes32",
            name
        )));
    }
    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(B256::from(word))
}

/// Strip a 0x prefix and decode hex return data into raw bytes
fn decode_return_data(data: &str) -> Result<Vec<u8>> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    Ok(hex::decode(stripped)?)
}

/// Extract the `index`-th 32-byte word from `eth_call` return data
fn word_at(data: &str, index: usize) -> Result<[u8; 32]> {
    let bytes = decode_return_data(data)?;
    let start = index * 32;
    if bytes.len() < start + 32 {
        return Err(DeployError::AbiError(format!(
            "return data too short for word {} ({} bytes)",
            index,
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes[start..start + 32]);
    Ok(word)
}

/// Decode an address from the `index`-th return word
pub fn decode_address(data: &str, index: usize) -> Result<Address> {
    let word = word_at(data, index)?;
    Ok(Address::from_slice(&word[12..]))
}

/// Decode a uint256 from the `index`-th return word
pub fn decode_uint(data: &str, index: usize) -> Result<U256> {
    let word = word_at(data, index)?;
    Ok(U256::from_be_bytes(word))
}

/// Decode a bool from the `index`-th return word
pub fn decode_bool(data: &str, index: usize) -> Result<bool> {
    let word = word_at(data, index)?;
    Ok(word[31] != 0)
}

/// Decode the revert reason out of `Error(string)` revert data, when present.
///
/// The payload comes straight from the node, so a malformed length word is
/// treated like any other malformed payload and yields `None`.
pub fn decode_revert_reason(data: &str) -> Option<String> {
    let bytes = decode_return_data(data).ok()?;
    // Error(string) selector is 0x08c379a0.
    if bytes.len() < 4 + 32 + 32 || bytes[..4] != [0x08, 0xc3, 0x79, 0xa0] {
        return None;
    }
    let len = usize::try_from(U256::from_be_slice(&bytes[36..68])).ok()?;
    let start = 68usize;
    let end = start.checked_add(len)?;
    if bytes.len() < end {
        return None;
    }
    String::from_utf8(bytes[start..end].to_vec()).ok()
}
