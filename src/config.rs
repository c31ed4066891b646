//! Deployment configuration: target network, node endpoint, deployer account,
//! timeouts and retry tuning.
//!
//! The per-network address/settings tables themselves live in [`crate::networks`];
//! this module only carries the knobs an operator sets for a single run.

use crate::error::{DeployError, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Deployment target network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// Kovan testnet
    Kovan,
    /// Rinkeby testnet
    Rinkeby,
    /// Ropsten testnet
    Ropsten,
    /// Local ganache development chain
    Ganache,
}

impl Network {
    /// All networks the configuration tables cover
    pub const ALL: [Network; 5] = [
        Network::Mainnet,
        Network::Kovan,
        Network::Rinkeby,
        Network::Ropsten,
        Network::Ganache,
    ];

    /// Chain id of this network
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
            Network::Kovan => 42,
            Network::Ganache => 1337,
        }
    }

    /// Canonical lowercase name, used as the deployments directory key
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Kovan => "kovan",
            Network::Rinkeby => "rinkeby",
            Network::Ropsten => "ropsten",
            Network::Ganache => "ganache",
        }
    }

    /// Default node RPC URL for this network
    pub fn default_node_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet.infura.io/v3/",
            Network::Kovan => "https://kovan.infura.io/v3/",
            Network::Rinkeby => "https://rinkeby.infura.io/v3/",
            Network::Ropsten => "https://ropsten.infura.io/v3/",
            Network::Ganache => "http://127.0.0.1:8545",
        }
    }

    /// Parse a network from its canonical name
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "kovan" => Ok(Network::Kovan),
            "rinkeby" => Ok(Network::Rinkeby),
            "ropsten" => Ok(Network::Ropsten),
            "ganache" | "localhost" => Ok(Network::Ganache),
            other => Err(DeployError::UnknownNetwork(other.to_string())),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for a deployment session
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Network to deploy against
    pub network: Network,

    /// Node RPC endpoint URL
    pub node_url: String,

    /// Account the node signs transactions with
    pub deployer: Address,

    /// Optional CRA signer added to every LoanManager's signer set
    pub cra_signer: Option<Address>,

    /// Directory holding compiled contract artifacts
    pub artifacts_dir: PathBuf,

    /// Directory the address ledger is persisted under
    pub deployments_dir: PathBuf,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Maximum number of retries for failed requests
    pub max_retries: usize,

    /// Initial retry delay (in milliseconds)
    pub retry_initial_delay_ms: u64,

    /// Maximum retry delay (in milliseconds)
    pub retry_max_delay_ms: u64,

    /// Retry backoff multiplier
    pub retry_multiplier: f64,

    /// Receipt polling interval (in milliseconds)
    pub tx_poll_interval_ms: u64,

    /// Receipt polling timeout (in seconds)
    pub tx_timeout_secs: u64,
}

impl DeployConfig {
    /// Create a configuration for the given network with default tuning
    pub fn new(network: Network, deployer: Address) -> Self {
        Self {
            network,
            node_url: network.default_node_url().to_string(),
            deployer,
            cra_signer: None,
            artifacts_dir: PathBuf::from("artifacts"),
            deployments_dir: PathBuf::from("deployments"),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 5000,
            retry_multiplier: 2.0,
            tx_poll_interval_ms: 1000,
            tx_timeout_secs: 120,
        }
    }

    /// Set the node RPC URL
    pub fn with_node_url(mut self, node_url: impl Into<String>) -> Self {
        self.node_url = node_url.into();
        self
    }

    /// Set the CRA signer added to LoanManager signer sets
    pub fn with_cra_signer(mut self, signer: Address) -> Self {
        self.cra_signer = Some(signer);
        self
    }

    /// Set the artifacts directory
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Set the deployments directory
    pub fn with_deployments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.deployments_dir = dir.into();
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set retry delays
    pub fn with_retry_config(
        mut self,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    ) -> Self {
        self.retry_initial_delay_ms = initial_delay_ms;
        self.retry_max_delay_ms = max_delay_ms;
        self.retry_multiplier = multiplier;
        self
    }

    /// Set receipt polling configuration
    pub fn with_tx_config(mut self, poll_interval_ms: u64, timeout_secs: u64) -> Self {
        self.tx_poll_interval_ms = poll_interval_ms;
        self.tx_timeout_secs = timeout_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.node_url.is_empty() {
            return Err(DeployError::ConfigError(
                "Node URL cannot be empty".to_string(),
            ));
        }
        url::Url::parse(&self.node_url)?;
        if self.deployer == Address::ZERO {
            return Err(DeployError::ConfigError(
                "Deployer account cannot be the zero address".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(DeployError::ConfigError(
                "Max retries must be greater than 0".to_string(),
            ));
        }
        if self.retry_initial_delay_ms == 0 {
            return Err(DeployError::ConfigError(
                "Retry initial delay must be greater than 0".to_string(),
            ));
        }
        if self.retry_multiplier <= 1.0 {
            return Err(DeployError::ConfigError(
                "Retry multiplier must be greater than 1.0".to_string(),
            ));
        }
        if self.tx_poll_interval_ms == 0 {
            return Err(DeployError::ConfigError(
                "Receipt poll interval must be greater than 0".to_string(),
            ));
        }
        if self.tx_timeout_secs == 0 {
            return Err(DeployError::ConfigError(
                "Receipt timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployer() -> Address {
        "0x00000000000000000000000000000000000000aa"
            .parse()
            .unwrap()
    }

    #[test]
    fn test_chain_ids() {
        assert_eq!(Network::Mainnet.chain_id(), 1);
        assert_eq!(Network::Kovan.chain_id(), 42);
        assert_eq!(Network::Ganache.chain_id(), 1337);
    }

    #[test]
    fn test_network_from_name() {
        assert_eq!(Network::from_name("kovan").unwrap(), Network::Kovan);
        assert_eq!(Network::from_name("MAINNET").unwrap(), Network::Mainnet);
        assert_eq!(Network::from_name("localhost").unwrap(), Network::Ganache);
        assert!(Network::from_name("hardhat").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DeployConfig::new(Network::Ganache, deployer());
        assert!(config.validate().is_ok());
        assert_eq!(config.node_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn test_config_builder() {
        let config = DeployConfig::new(Network::Kovan, deployer())
            .with_node_url("http://localhost:9999")
            .with_request_timeout(Duration::from_secs(60))
            .with_max_retries(5)
            .with_retry_config(200, 10000, 2.5)
            .with_tx_config(2000, 300);

        assert_eq!(config.node_url, "http://localhost:9999");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_initial_delay_ms, 200);
        assert_eq!(config.tx_poll_interval_ms, 2000);
        assert_eq!(config.tx_timeout_secs, 300);
    }

    #[test]
    fn test_config_validation() {
        let mut config = DeployConfig::new(Network::Ganache, deployer());
        assert!(config.validate().is_ok());

        config.max_retries = 0;
        assert!(config.validate().is_err());

        config.max_retries = 3;
        config.retry_multiplier = 0.5;
        assert!(config.validate().is_err());

        config.retry_multiplier = 2.0;
        config.deployer = Address::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_node_url() {
        let config =
            DeployConfig::new(Network::Ganache, deployer()).with_node_url("not a url at all");
        assert!(config.validate().is_err());
    }
}
