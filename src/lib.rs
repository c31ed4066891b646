//! Teller Protocol Deployment Orchestration Layer
//!
//! This library sequences the deployment of the Teller lending protocol's
//! contracts against an EVM network. It includes the per-network
//! configuration tables, a typed deployment step graph, a JSON-RPC client
//! with retry logic, the persisted deployment address ledger, ABI encoding
//! helpers, and event assertions for test suites.
//!
//! # Features
//!
//! - **Config Resolution**: Pure per-network tables for tokens, markets,
//!   platform/asset settings, chainlink pairs, signers, nodes, ATMs, dapps
//! - **Deploy Step Runner**: Typed dependency DAG executed sequentially,
//!   each step idempotent against existing on-chain state
//! - **Market Materialization**: Factory-driven market creation with ledger
//!   records under `LP_<token>` and `Market_<lend>_<coll>` keys
//! - **Address Ledger**: Deterministic JSON persisted per network under
//!   `deployments/<network>/_addresses.json`
//! - **Event Assertions**: Receipt-level event checks for contract tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use teller_deploy::{DeployConfig, Deployer, Network};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tracing_subscriber::fmt::init();
//!
//!     let deployer_account = "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1".parse()?;
//!     let config = Arc::new(DeployConfig::new(Network::Ganache, deployer_account));
//!
//!     let deployer = Deployer::new(config)?;
//!     deployer.health_check().await?;
//!     let outcomes = deployer.run_full().await?;
//!
//!     for (step, outcome) in outcomes {
//!         println!("{}: {:?}", step, outcome);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod abi;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod networks;
pub mod retry;
pub mod rpc;
pub mod steps;
pub mod types;

// Re-export commonly used types
pub use config::{DeployConfig, Network};
pub use error::{DeployError, Result};
pub use events::{emitted_logs, expect_event};
pub use ledger::{AddressLedger, Section};
pub use retry::RetryStrategy;
pub use rpc::{EvmRpcClient, LogEntry, TransactionReceipt, TransactionRequest};
pub use steps::{DeployContext, DeployRunner, DeployStep, StepId, StepOutcome};
pub use types::{
    AssetSetting, AtmConfig, ChainlinkPair, Dapp, Market, NetworkConfig, PlatformSetting,
};

use alloy_primitives::Address;
use std::sync::Arc;
use steps::markets::{lending_pool_key, market_key};
use tracing::info;

/// Addresses materialized for one (lending token, collateral token) market
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketAddresses {
    /// TToken lending pool
    pub lending_pool: Address,
    /// Loan manager
    pub loan_manager: Address,
}

/// Look up a materialized market's addresses in the ledger
pub fn get_market(
    ledger: &AddressLedger,
    lend_token_sym: &str,
    coll_token_sym: &str,
) -> Result<MarketAddresses> {
    let market = market_key(lend_token_sym, coll_token_sym);
    let loan_manager = ledger
        .get(Section::Markets, &market)
        .ok_or_else(|| DeployError::MarketNotFound(market.clone()))?;
    let lending_pool = ledger
        .get(Section::LendingPools, &lending_pool_key(lend_token_sym))
        .ok_or_else(|| DeployError::MarketNotFound(market))?;
    Ok(MarketAddresses {
        lending_pool,
        loan_manager,
    })
}

/// Main entry point: binds configuration, RPC client, and ledger into one
/// deployment session.
#[derive(Clone)]
pub struct Deployer {
    rpc: EvmRpcClient,
    config: Arc<DeployConfig>,
}

impl Deployer {
    /// Create a deployer after validating the configuration
    pub fn new(config: Arc<DeployConfig>) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing deployer for network {} via {}",
            config.network, config.node_url
        );
        let rpc = EvmRpcClient::new(config.clone())?;
        Ok(Self { rpc, config })
    }

    /// Run the full protocol deployment sequence against the configured
    /// network, returning the per-step outcomes
    pub async fn run_full(&self) -> Result<Vec<(StepId, StepOutcome)>> {
        let runner = DeployRunner::full_protocol()?;
        let ledger = AddressLedger::load(&self.config.deployments_dir, self.config.network)?;
        self.run_with(&runner, ledger).await.map(|(outcomes, _)| outcomes)
    }

    /// Run a custom step set against an explicit ledger handle, returning the
    /// outcomes together with the (saved) ledger
    pub async fn run_with(
        &self,
        runner: &DeployRunner,
        ledger: AddressLedger,
    ) -> Result<(Vec<(StepId, StepOutcome)>, AddressLedger)> {
        let network = NetworkConfig::resolve(self.config.network)?;
        let mut ctx = DeployContext::new(
            self.config.clone(),
            network,
            self.rpc.clone(),
            ledger,
        );
        let outcomes = runner.run(&mut ctx).await?;
        let mut ledger = ctx.ledger;
        ledger.save()?;
        Ok((outcomes, ledger))
    }

    /// Node RPC client
    pub fn rpc(&self) -> &EvmRpcClient {
        &self.rpc
    }

    /// Session configuration
    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Verify node connectivity and chain id
    pub async fn health_check(&self) -> Result<bool> {
        self.rpc.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn deployer_account() -> Address {
        Address::repeat_byte(0xaa)
    }

    #[test]
    fn test_deployer_creation() {
        let config = Arc::new(DeployConfig::new(Network::Ganache, deployer_account()));
        assert!(Deployer::new(config).is_ok());
    }

    #[test]
    fn test_deployer_rejects_invalid_config() {
        let mut config = DeployConfig::new(Network::Ganache, deployer_account());
        config.max_retries = 0;
        assert!(Deployer::new(Arc::new(config)).is_err());
    }

    #[test]
    fn test_get_market_lookup() {
        let mut ledger = AddressLedger::in_memory(Network::Ganache);
        ledger.record(Section::Markets, "Market_DAI_ETH", Address::repeat_byte(1));
        ledger.record(Section::LendingPools, "LP_DAI", Address::repeat_byte(2));

        let market = get_market(&ledger, "DAI", "ETH").unwrap();
        assert_eq!(market.loan_manager, Address::repeat_byte(1));
        assert_eq!(market.lending_pool, Address::repeat_byte(2));

        assert_matches!(
            get_market(&ledger, "USDC", "ETH"),
            Err(DeployError::MarketNotFound(_))
        );
    }
}
