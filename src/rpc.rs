//! JSON-RPC client for the target EVM node.
//!
//! Covers the small method surface the deploy runner needs: chain identity,
//! read-only calls, transaction submission through the node's unlocked
//! deployer account, and receipt polling. Timeout and retry tuning comes from
//! [`DeployConfig`]; revert reasons are decoded out of error payloads when the
//! node provides them.

use crate::abi;
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::retry::RetryStrategy;
use alloy_primitives::Address;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// JSON-RPC request ID type
type RequestId = u64;

/// JSON-RPC request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: RequestId,
    method: String,
    params: Value,
}

/// JSON-RPC response
///
/// `result` defaults to JSON null so a pending-receipt response
/// (`"result": null`) is distinguishable from an error response.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: RequestId,
    #[serde(default)]
    result: Value,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// A single log entry from a transaction receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Emitting contract address
    pub address: Address,
    /// Indexed topics; topic0 is the event signature hash
    pub topics: Vec<String>,
    /// Non-indexed data words, 0x-prefixed hex
    pub data: String,
}

/// Transaction receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash
    pub transaction_hash: String,
    /// Status, `0x1` for success and `0x0` for revert
    pub status: String,
    /// Block number, hex encoded
    pub block_number: String,
    /// Created contract address for deployment transactions
    pub contract_address: Option<Address>,
    /// Logs emitted by the transaction
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl TransactionReceipt {
    /// Whether the transaction executed without reverting
    pub fn is_success(&self) -> bool {
        self.status == "0x1"
    }
}

/// Parameters for a transaction submitted through the node
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    /// Sender account (must be unlocked on the node)
    pub from: Address,
    /// Recipient; `None` deploys a contract
    pub to: Option<Address>,
    /// Calldata or creation bytecode, 0x-prefixed hex
    pub data: String,
}

/// EVM JSON-RPC client
#[derive(Clone)]
pub struct EvmRpcClient {
    client: Client,
    node_url: String,
    retry_strategy: RetryStrategy,
    config: Arc<DeployConfig>,
    request_id: Arc<std::sync::atomic::AtomicU64>,
}

impl EvmRpcClient {
    /// Create a new RPC client from the deploy configuration
    pub fn new(config: Arc<DeployConfig>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(DeployError::NetworkError)?;

        let retry_strategy = RetryStrategy::from_config(&config);

        Ok(Self {
            client,
            node_url: config.node_url.clone(),
            retry_strategy,
            config,
            request_id: Arc::new(std::sync::atomic::AtomicU64::new(1)),
        })
    }

    fn next_request_id(&self) -> RequestId {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }

    /// Map a JSON-RPC error object into a structured deploy error.
    ///
    /// Nodes surface execution reverts as RPC errors whose `data` carries the
    /// `Error(string)` payload; those become [`DeployError::Reverted`].
    fn map_rpc_error(error: JsonRpcError) -> DeployError {
        if let Some(reason) = error
            .data
            .as_ref()
            .and_then(Value::as_str)
            .and_then(abi::decode_revert_reason)
        {
            return DeployError::Reverted { reason };
        }
        if let Some(reason) = Self::revert_reason(error.code, &error.message) {
            return DeployError::Reverted { reason };
        }
        DeployError::RpcError(format!("{} (code: {})", error.message, error.code))
    }

    /// Extract a revert reason from an RPC error message, when the error is
    /// actually an execution revert.
    ///
    /// Anchored on the conventional markers (geth's `execution reverted`
    /// prefix, ganache's `transaction: revert` phrasing, error code 3) so an
    /// unrelated node message that merely mentions reverting is not misfiled
    /// as a contract revert.
    fn revert_reason(code: i64, message: &str) -> Option<String> {
        let tail = message
            .split_once("execution reverted")
            .map(|(_, tail)| tail)
            .or_else(|| message.split_once("transaction: revert").map(|(_, tail)| tail));
        if let Some(tail) = tail {
            let tail = tail.trim_start_matches(':').trim();
            return Some(if tail.is_empty() {
                "execution reverted".to_string()
            } else {
                tail.to_string()
            });
        }
        // Code 3 is the execution-revert error code even when the message
        // carries no recognizable prefix.
        if code == 3 {
            return Some(message.to_string());
        }
        None
    }

    /// Make a JSON-RPC call
    async fn call_rpc(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: self.next_request_id(),
            method: method.to_string(),
            params,
        };

        debug!("RPC request: {} (id: {})", method, request.id);

        self.retry_strategy
            .retry(|| async {
                let response = self
                    .client
                    .post(&self.node_url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(DeployError::NetworkError)?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(DeployError::RpcError(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }

                let rpc_response: JsonRpcResponse = response
                    .json()
                    .await
                    .map_err(|e| DeployError::InvalidResponse(e.to_string()))?;

                if let Some(rpc_error) = rpc_response.error {
                    error!(
                        "RPC error for {}: {} (code: {})",
                        request.method, rpc_error.message, rpc_error.code
                    );
                    return Err(Self::map_rpc_error(rpc_error));
                }

                Ok(rpc_response.result)
            })
            .await
    }

    fn parse_hex_u64(value: &Value, what: &str) -> Result<u64> {
        let text = value
            .as_str()
            .ok_or_else(|| DeployError::InvalidResponse(format!("Missing {}", what)))?;
        u64::from_str_radix(text.trim_start_matches("0x"), 16)
            .map_err(|e| DeployError::InvalidResponse(format!("Bad {}: {}", what, e)))
    }

    /// Get the node's chain id
    pub async fn chain_id(&self) -> Result<u64> {
        let result = self.call_rpc("eth_chainId", json!([])).await?;
        Self::parse_hex_u64(&result, "chain id")
    }

    /// Get the latest block number
    pub async fn block_number(&self) -> Result<u64> {
        let result = self.call_rpc("eth_blockNumber", json!([])).await?;
        Self::parse_hex_u64(&result, "block number")
    }

    /// Execute a read-only call against a contract, returning raw hex data
    pub async fn call(&self, to: Address, data: &str) -> Result<String> {
        let params = json!([{ "to": to, "data": data }, "latest"]);
        let result = self.call_rpc("eth_call", params).await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| DeployError::InvalidResponse("Missing call result".to_string()))
    }

    /// Get deployed bytecode at an address (`0x` when none)
    pub async fn get_code(&self, address: Address) -> Result<String> {
        let params = json!([address, "latest"]);
        let result = self.call_rpc("eth_getCode", params).await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| DeployError::InvalidResponse("Missing code result".to_string()))
    }

    /// Submit a transaction through the node's unlocked account
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<String> {
        let mut tx = json!({
            "from": request.from,
            "data": request.data,
        });
        if let Some(to) = request.to {
            tx["to"] = json!(to);
        }

        let result = self.call_rpc("eth_sendTransaction", json!([tx])).await?;
        let hash = result
            .as_str()
            .ok_or_else(|| {
                DeployError::TransactionSubmissionError("Missing transaction hash".to_string())
            })?
            .to_string();

        info!("Transaction submitted: {}", hash);
        Ok(hash)
    }

    /// Fetch a transaction receipt, `None` while the transaction is pending
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>> {
        let result = self
            .call_rpc("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: TransactionReceipt = serde_json::from_value(result)?;
        Ok(Some(receipt))
    }

    /// Poll until the transaction is mined, failing on revert or timeout.
    ///
    /// The runner is strictly sequential: every submitted transaction goes
    /// through here before the next step proceeds.
    pub async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        let start = Instant::now();
        let timeout = Duration::from_secs(self.config.tx_timeout_secs);
        let poll_interval = Duration::from_millis(self.config.tx_poll_interval_ms);

        loop {
            if start.elapsed() >= timeout {
                warn!("Receipt polling timed out: {}", tx_hash);
                return Err(DeployError::TransactionTimeout(self.config.tx_timeout_secs));
            }

            match self.get_transaction_receipt(tx_hash).await? {
                Some(receipt) if receipt.is_success() => {
                    debug!(
                        "Transaction mined: {} (block {})",
                        tx_hash, receipt.block_number
                    );
                    return Ok(receipt);
                }
                Some(_) => {
                    warn!("Transaction reverted: {}", tx_hash);
                    return Err(DeployError::Reverted {
                        reason: format!("transaction {} reverted", tx_hash),
                    });
                }
                None => debug!("Transaction pending: {}", tx_hash),
            }

            sleep(poll_interval).await;
        }
    }

    /// Submit a transaction and wait for its receipt
    pub async fn send_and_confirm(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionReceipt> {
        let hash = self.send_transaction(request).await?;
        self.wait_for_receipt(&hash).await
    }

    /// Health check: verify connectivity and that the node's chain id matches
    /// the configured network
    pub async fn health_check(&self) -> Result<bool> {
        let chain_id = self.chain_id().await?;
        let expected = self.config.network.chain_id();
        if chain_id != expected {
            return Err(DeployError::ConfigError(format!(
                "Node chain id {} does not match {} ({})",
                chain_id, self.config.network, expected
            )));
        }
        info!("Node health check passed (chain id {})", chain_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    fn test_config() -> Arc<DeployConfig> {
        Arc::new(
            DeployConfig::new(Network::Ganache, Address::repeat_byte(0xaa))
                .with_request_timeout(Duration::from_secs(5))
                .with_max_retries(1),
        )
    }

    #[test]
    fn test_client_creation() {
        assert!(EvmRpcClient::new(test_config()).is_ok());
    }

    #[test]
    fn test_request_id_increments() {
        let client = EvmRpcClient::new(test_config()).unwrap();
        assert_eq!(client.next_request_id(), 1);
        assert_eq!(client.next_request_id(), 2);
    }

    #[test]
    fn test_receipt_status() {
        let receipt = TransactionReceipt {
            transaction_hash: "0xabc".to_string(),
            status: "0x1".to_string(),
            block_number: "0x10".to_string(),
            contract_address: None,
            logs: vec![],
        };
        assert!(receipt.is_success());

        let failed = TransactionReceipt {
            status: "0x0".to_string(),
            ..receipt
        };
        assert!(!failed.is_success());
    }

    #[test]
    fn test_map_rpc_error_plain() {
        let err = EvmRpcClient::map_rpc_error(JsonRpcError {
            code: -32000,
            message: "nonce too low".to_string(),
            data: None,
        });
        assert!(matches!(err, DeployError::RpcError(_)));
    }

    #[test]
    fn test_map_rpc_error_revert_message() {
        let err = EvmRpcClient::map_rpc_error(JsonRpcError {
            code: 3,
            message: "execution reverted: NOT_PAUSER".to_string(),
            data: None,
        });
        match err {
            DeployError::Reverted { reason } => assert!(reason.contains("NOT_PAUSER")),
            other => panic!("expected revert, got {:?}", other),
        }
    }

    #[test]
    fn test_map_rpc_error_ganache_revert_message() {
        let err = EvmRpcClient::map_rpc_error(JsonRpcError {
            code: -32000,
            message: "VM Exception while processing transaction: revert NOT_PAUSER".to_string(),
            data: None,
        });
        match err {
            DeployError::Reverted { reason } => assert_eq!(reason, "NOT_PAUSER"),
            other => panic!("expected revert, got {:?}", other),
        }
    }

    #[test]
    fn test_map_rpc_error_code_three_without_prefix() {
        let err = EvmRpcClient::map_rpc_error(JsonRpcError {
            code: 3,
            message: "out of gas".to_string(),
            data: None,
        });
        assert!(matches!(err, DeployError::Reverted { .. }));
    }

    #[test]
    fn test_map_rpc_error_revert_mention_is_not_a_revert() {
        // A node message that merely mentions reverting stays an RPC error.
        let err = EvmRpcClient::map_rpc_error(JsonRpcError {
            code: -32000,
            message: "cannot revert state: snapshot not found".to_string(),
            data: None,
        });
        assert!(matches!(err, DeployError::RpcError(_)));
    }

    // Network-facing behavior is covered by the wiremock suites in tests/.
}
