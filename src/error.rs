//! Error types for the deployment orchestration layer.
//!
//! This module defines all error types that can occur while resolving network
//! configuration, talking to the node, or running deployment steps.

use thiserror::Error;

/// Main error type for deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Network name is not present in the configuration tables
    #[error("Network not configured: {0}")]
    UnknownNetwork(String),

    /// Token symbol is not present in the network's token table
    #[error("Token not configured for this network: {0}")]
    UnknownToken(String),

    /// Configuration tables are internally inconsistent
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Market lookup against a ledger with no record for the pair
    #[error("Market not found in ledger: {0}")]
    MarketNotFound(String),

    /// Node RPC returned a JSON-RPC level error
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Transaction was mined but reverted
    #[error("Transaction reverted: {reason}")]
    Reverted {
        /// Revert reason string, or a placeholder when the node gave none
        reason: String,
    },

    /// Transaction submission failed before mining
    #[error("Transaction submission failed: {0}")]
    TransactionSubmissionError(String),

    /// Receipt never appeared within the configured timeout
    #[error("Transaction timeout after {0} seconds")]
    TransactionTimeout(u64),

    /// Deployment step failed
    #[error("Deploy step '{step}' failed: {message}")]
    StepFailed {
        /// Identifier of the failing step
        step: String,
        /// Description of the failure
        message: String,
    },

    /// Step graph contains a dependency cycle
    #[error("Deploy step graph contains a cycle involving '{0}'")]
    DependencyCycle(String),

    /// Step registered twice in one session
    #[error("Deploy step '{0}' registered more than once")]
    DuplicateStep(String),

    /// ABI encoding or decoding failed
    #[error("ABI error: {0}")]
    AbiError(String),

    /// Ledger file could not be read or written
    #[error("Ledger I/O error: {0}")]
    LedgerIo(#[from] std::io::Error),

    /// Contract artifact missing or malformed
    #[error("Artifact error: {0}")]
    ArtifactError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid response from the node
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Max retries exceeded
    #[error("Max retries ({0}) exceeded")]
    MaxRetriesExceeded(usize),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// Hex decode error
    #[error("Hex decode error: {0}")]
    HexError(#[from] hex::FromHexError),
}

/// Result type alias for deployment operations
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Wrap an error with the step it occurred in
    pub fn in_step(step: &str, message: impl Into<String>) -> Self {
        DeployError::StepFailed {
            step: step.to_string(),
            message: message.into(),
        }
    }
}
