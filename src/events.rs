//! Event assertions over transaction receipts.
//!
//! A thin DSL for test suites: given a receipt, assert that a named event was
//! (or was not) emitted with expected argument words. Mismatches panic with a
//! descriptive assertion message, matching the harness-style usage in tests;
//! the underlying [`emitted_logs`] primitive is available when a non-panicking
//! check is needed.

use crate::abi;
use crate::rpc::{LogEntry, TransactionReceipt};
use alloy_primitives::{Address, B256, U256};

/// Find every log in the receipt whose topic0 matches the event signature.
///
/// `signature` is the canonical form, e.g. `MarketCreated(address,address)`.
pub fn emitted_logs<'r>(receipt: &'r TransactionReceipt, signature: &str) -> Vec<&'r LogEntry> {
    let topic0 = format!("{:#x}", abi::event_topic(signature));
    receipt
        .logs
        .iter()
        .filter(|log| {
            log.topics
                .first()
                .map(|t| t.eq_ignore_ascii_case(&topic0))
                .unwrap_or(false)
        })
        .collect()
}

/// Assertion builder for one expected event
pub struct EventAssertion<'r> {
    receipt: &'r TransactionReceipt,
    signature: String,
}

/// Start an assertion over the given receipt and event signature
pub fn expect_event<'r>(receipt: &'r TransactionReceipt, signature: &str) -> EventAssertion<'r> {
    EventAssertion {
        receipt,
        signature: signature.to_string(),
    }
}

impl<'r> EventAssertion<'r> {
    /// Assert the event was emitted at least once, returning the matches
    /// for further argument checks
    pub fn emitted(self) -> EmittedEvent<'r> {
        let logs = emitted_logs(self.receipt, &self.signature);
        assert!(
            !logs.is_empty(),
            "expected event '{}' in transaction {}, but it was not emitted",
            self.signature,
            self.receipt.transaction_hash
        );
        EmittedEvent {
            signature: self.signature,
            logs,
        }
    }

    /// Assert the event was not emitted
    pub fn not_emitted(self) {
        let logs = emitted_logs(self.receipt, &self.signature);
        assert!(
            logs.is_empty(),
            "expected event '{}' to be absent from transaction {}, but it was emitted {} time(s)",
            self.signature,
            self.receipt.transaction_hash,
            logs.len()
        );
    }
}

/// A matched event with argument assertions
pub struct EmittedEvent<'r> {
    signature: String,
    logs: Vec<&'r LogEntry>,
}

impl EmittedEvent<'_> {
    /// Number of matching logs
    pub fn count(&self) -> usize {
        self.logs.len()
    }

    fn first(&self) -> &LogEntry {
        // emitted() guarantees at least one match.
        self.logs[0]
    }

    /// Assert the emitting contract address
    pub fn from_address(self, expected: Address) -> Self {
        let actual = self.first().address;
        assert_eq!(
            actual, expected,
            "event '{}' emitted by {} instead of {}",
            self.signature, actual, expected
        );
        self
    }

    /// Assert an indexed address argument (topic position, 0-based after topic0)
    pub fn with_indexed_address(self, position: usize, expected: Address) -> Self {
        let topic = self.indexed_word(position);
        let actual = Address::from_slice(&topic.as_slice()[12..]);
        assert_eq!(
            actual, expected,
            "event '{}' indexed argument {} is {} instead of {}",
            self.signature, position, actual, expected
        );
        self
    }

    /// Assert a non-indexed address argument (data word position, 0-based)
    pub fn with_address_arg(self, position: usize, expected: Address) -> Self {
        let actual = abi::decode_address(&self.first().data, position)
            .unwrap_or_else(|e| panic!("event '{}' data malformed: {}", self.signature, e));
        assert_eq!(
            actual, expected,
            "event '{}' argument {} is {} instead of {}",
            self.signature, position, actual, expected
        );
        self
    }

    /// Assert a non-indexed uint argument (data word position, 0-based)
    pub fn with_uint_arg(self, position: usize, expected: U256) -> Self {
        let actual = abi::decode_uint(&self.first().data, position)
            .unwrap_or_else(|e| panic!("event '{}' data malformed: {}", self.signature, e));
        assert_eq!(
            actual, expected,
            "event '{}' argument {} is {} instead of {}",
            self.signature, position, actual, expected
        );
        self
    }

    fn indexed_word(&self, position: usize) -> B256 {
        let topics = &self.first().topics;
        let topic = topics.get(position + 1).unwrap_or_else(|| {
            panic!(
                "event '{}' has {} indexed argument(s), position {} requested",
                self.signature,
                topics.len().saturating_sub(1),
                position
            )
        });
        topic
            .parse()
            .unwrap_or_else(|e| panic!("event '{}' topic malformed: {}", self.signature, e))
    }
}
