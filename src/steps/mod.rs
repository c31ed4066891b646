//! Deployment step graph and runner.
//!
//! Steps form a typed DAG: every step names its dependencies as [`StepId`]
//! variants, so a dangling reference is a compile error rather than a typo in
//! a string tag. The runner executes steps sequentially in topological order,
//! breaking ties by registration order, at most once per session. The first
//! failure aborts the run; there is no rollback, and steps are written to be
//! idempotent so a re-run converges.

mod asset_settings;
mod chainlink;
mod dapps;
pub mod markets;
mod platform_settings;
mod settings;

pub use asset_settings::AssetSettingsStep;
pub use chainlink::ChainlinkStep;
pub use dapps::DappsStep;
pub use markets::MarketsStep;
pub use platform_settings::PlatformSettingsStep;
pub use settings::SettingsStep;

use crate::abi::{self, Token};
use crate::artifacts::ContractArtifact;
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::ledger::{AddressLedger, Section};
use crate::rpc::{EvmRpcClient, TransactionReceipt, TransactionRequest};
use crate::types::NetworkConfig;
use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Identifier of a deployment step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    /// Core protocol contracts (settings, factories, registries)
    Settings,
    /// Platform setting registration
    PlatformSettings,
    /// Per-asset setting registration
    AssetSettings,
    /// Chainlink pair registration
    Chainlink,
    /// Market materialization
    Markets,
    /// Third-party dapp registration
    Dapps,
}

impl StepId {
    /// Stable name used in logs and the ledger
    pub fn name(&self) -> &'static str {
        match self {
            StepId::Settings => "settings",
            StepId::PlatformSettings => "platform-settings",
            StepId::AssetSettings => "asset-settings",
            StepId::Chainlink => "chainlink",
            StepId::Markets => "markets",
            StepId::Dapps => "dapps",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a completed step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// At least one transaction was sent
    Deployed,
    /// Every on-chain precondition was already satisfied
    Reused,
}

/// Shared state threaded through the deployment steps
pub struct DeployContext {
    /// Session configuration
    pub config: Arc<DeployConfig>,
    /// Resolved network tables
    pub network: NetworkConfig,
    /// Node RPC client
    pub rpc: EvmRpcClient,
    /// Address ledger for this network
    pub ledger: AddressLedger,
    txs_sent: usize,
}

impl DeployContext {
    /// Create a context from its parts
    pub fn new(
        config: Arc<DeployConfig>,
        network: NetworkConfig,
        rpc: EvmRpcClient,
        ledger: AddressLedger,
    ) -> Self {
        Self {
            config,
            network,
            rpc,
            ledger,
            txs_sent: 0,
        }
    }

    /// Number of transactions sent so far in this session
    pub fn txs_sent(&self) -> usize {
        self.txs_sent
    }

    /// Read-only contract call with ABI-encoded arguments
    pub async fn call(&self, to: Address, signature: &str, args: &[Token]) -> Result<String> {
        self.rpc.call(to, &abi::encode_call(signature, args)).await
    }

    /// Send a state-changing contract call and wait for its receipt
    pub async fn send(
        &mut self,
        to: Address,
        signature: &str,
        args: &[Token],
    ) -> Result<TransactionReceipt> {
        let request = TransactionRequest {
            from: self.config.deployer,
            to: Some(to),
            data: abi::encode_call(signature, args),
        };
        self.txs_sent += 1;
        self.rpc.send_and_confirm(&request).await
    }

    /// Deploy a contract, or reuse the ledger entry when the recorded address
    /// still has code on-chain
    pub async fn deploy_contract(
        &mut self,
        section: Section,
        name: &str,
        args: &[Token],
    ) -> Result<Address> {
        if let Some(existing) = self.ledger.get(section, name) {
            let code = self.rpc.get_code(existing).await?;
            if code != "0x" && !code.is_empty() {
                debug!("Reusing {} at {}", name, existing);
                return Ok(existing);
            }
        }

        let artifact = ContractArtifact::load(&self.config.artifacts_dir, name)?;
        let data = artifact.creation_data(&abi::encode_constructor_args(args));
        let request = TransactionRequest {
            from: self.config.deployer,
            to: None,
            data,
        };
        self.txs_sent += 1;
        let receipt = self.rpc.send_and_confirm(&request).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::InvalidResponse(format!(
                "deployment receipt for {} is missing a contract address",
                name
            ))
        })?;

        info!("Deployed {} at {}", name, address);
        self.ledger.record(section, name, address);
        Ok(address)
    }

    /// Deploy a logic contract and a proxy pointing at it, recording both.
    ///
    /// Returns the proxy address, which is what the rest of the protocol
    /// interacts with.
    pub async fn deploy_logic_and_proxy(&mut self, name: &str) -> Result<Address> {
        let logic = self.deploy_contract(Section::Logics, name, &[]).await?;
        // The recorded proxy shares the logical name; the proxy artifact takes
        // the logic address as its only constructor argument.
        if let Some(existing) = self.ledger.get(Section::Proxies, name) {
            let code = self.rpc.get_code(existing).await?;
            if code != "0x" && !code.is_empty() {
                return Ok(existing);
            }
        }
        let artifact = ContractArtifact::load(&self.config.artifacts_dir, "DynamicProxy")?;
        let data = artifact
            .creation_data(&abi::encode_constructor_args(&[Token::Address(logic)]));
        let request = TransactionRequest {
            from: self.config.deployer,
            to: None,
            data,
        };
        self.txs_sent += 1;
        let receipt = self.rpc.send_and_confirm(&request).await?;
        let proxy = receipt.contract_address.ok_or_else(|| {
            DeployError::InvalidResponse(format!(
                "proxy deployment receipt for {} is missing a contract address",
                name
            ))
        })?;

        info!("Deployed proxy for {} at {}", name, proxy);
        self.ledger.record(Section::Proxies, name, proxy);
        Ok(proxy)
    }

    /// Proxy address a prior step recorded, as a step precondition
    pub fn required_proxy(&self, step: StepId, name: &str) -> Result<Address> {
        self.ledger.get(Section::Proxies, name).ok_or_else(|| {
            DeployError::in_step(step.name(), format!("required contract '{}' is not deployed", name))
        })
    }
}

/// A single deployment step
#[async_trait]
pub trait DeployStep: Send + Sync {
    /// Identifier of this step
    fn id(&self) -> StepId;

    /// Steps that must complete before this one
    fn dependencies(&self) -> &'static [StepId] {
        &[]
    }

    /// Execute the step. Implementations must be idempotent: when the
    /// on-chain state already matches the configuration, no transaction is
    /// sent.
    async fn run(&self, ctx: &mut DeployContext) -> Result<()>;
}

/// Sequential executor over a typed step DAG
pub struct DeployRunner {
    steps: Vec<Box<dyn DeployStep>>,
}

impl DeployRunner {
    /// Create an empty runner
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Runner preloaded with the full protocol deployment sequence
    pub fn full_protocol() -> Result<Self> {
        let mut runner = Self::new();
        runner.register(Box::new(SettingsStep))?;
        runner.register(Box::new(PlatformSettingsStep))?;
        runner.register(Box::new(AssetSettingsStep))?;
        runner.register(Box::new(ChainlinkStep))?;
        runner.register(Box::new(MarketsStep))?;
        runner.register(Box::new(DappsStep))?;
        Ok(runner)
    }

    /// Register a step; registration order breaks ordering ties
    pub fn register(&mut self, step: Box<dyn DeployStep>) -> Result<()> {
        if self.steps.iter().any(|s| s.id() == step.id()) {
            return Err(DeployError::DuplicateStep(step.id().name().to_string()));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Compute the execution order: topological over dependencies, stable
    /// with respect to registration order
    pub fn execution_order(&self) -> Result<Vec<StepId>> {
        let registered: HashSet<StepId> = self.steps.iter().map(|s| s.id()).collect();
        for step in &self.steps {
            for dep in step.dependencies() {
                if !registered.contains(dep) {
                    return Err(DeployError::ConfigError(format!(
                        "step '{}' depends on unregistered step '{}'",
                        step.id(),
                        dep
                    )));
                }
            }
        }

        let mut order = Vec::with_capacity(self.steps.len());
        let mut done: HashSet<StepId> = HashSet::new();
        while order.len() < self.steps.len() {
            let next = self.steps.iter().find(|s| {
                !done.contains(&s.id()) && s.dependencies().iter().all(|d| done.contains(d))
            });
            match next {
                Some(step) => {
                    done.insert(step.id());
                    order.push(step.id());
                }
                None => {
                    let stuck = self
                        .steps
                        .iter()
                        .find(|s| !done.contains(&s.id()))
                        .map(|s| s.id().name().to_string())
                        .unwrap_or_default();
                    return Err(DeployError::DependencyCycle(stuck));
                }
            }
        }
        Ok(order)
    }

    /// Run every registered step once, in dependency order.
    ///
    /// The ledger is saved after each completed step, so an aborted run keeps
    /// the records of everything that finished.
    pub async fn run(&self, ctx: &mut DeployContext) -> Result<Vec<(StepId, StepOutcome)>> {
        let order = self.execution_order()?;
        info!(
            "Running {} deploy steps against {}: {:?}",
            order.len(),
            ctx.ledger.network(),
            order.iter().map(|s| s.name()).collect::<Vec<_>>()
        );

        let mut outcomes = Vec::with_capacity(order.len());
        for id in order {
            let step = self
                .steps
                .iter()
                .find(|s| s.id() == id)
                .ok_or_else(|| DeployError::ConfigError(format!("step '{}' vanished", id)))?;

            let before = ctx.txs_sent();
            info!("Step '{}' starting", id);
            step.run(ctx).await?;
            ctx.ledger.save()?;

            let outcome = if ctx.txs_sent() > before {
                StepOutcome::Deployed
            } else {
                StepOutcome::Reused
            };
            info!(
                "Step '{}' finished ({} transaction(s), {:?})",
                id,
                ctx.txs_sent() - before,
                outcome
            );
            outcomes.push((id, outcome));
        }
        Ok(outcomes)
    }
}

impl Default for DeployRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct FakeStep {
        id: StepId,
        deps: &'static [StepId],
    }

    #[async_trait]
    impl DeployStep for FakeStep {
        fn id(&self) -> StepId {
            self.id
        }
        fn dependencies(&self) -> &'static [StepId] {
            self.deps
        }
        async fn run(&self, _ctx: &mut DeployContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_full_protocol_order() {
        let runner = DeployRunner::full_protocol().unwrap();
        let order = runner.execution_order().unwrap();
        assert_eq!(order[0], StepId::Settings);
        // Markets runs after everything it depends on.
        let markets_pos = order.iter().position(|s| *s == StepId::Markets).unwrap();
        for dep in [
            StepId::PlatformSettings,
            StepId::AssetSettings,
            StepId::Chainlink,
        ] {
            let dep_pos = order.iter().position(|s| *s == dep).unwrap();
            assert!(dep_pos < markets_pos);
        }
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut runner = DeployRunner::new();
        runner
            .register(Box::new(FakeStep {
                id: StepId::Chainlink,
                deps: &[],
            }))
            .unwrap();
        runner
            .register(Box::new(FakeStep {
                id: StepId::Dapps,
                deps: &[],
            }))
            .unwrap();
        runner
            .register(Box::new(FakeStep {
                id: StepId::Settings,
                deps: &[],
            }))
            .unwrap();

        // No constraints: declaration order is preserved.
        assert_eq!(
            runner.execution_order().unwrap(),
            vec![StepId::Chainlink, StepId::Dapps, StepId::Settings]
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut runner = DeployRunner::new();
        runner
            .register(Box::new(FakeStep {
                id: StepId::Settings,
                deps: &[],
            }))
            .unwrap();
        let result = runner.register(Box::new(FakeStep {
            id: StepId::Settings,
            deps: &[],
        }));
        assert_matches!(result, Err(DeployError::DuplicateStep(_)));
    }

    #[test]
    fn test_missing_dependency_rejected() {
        let mut runner = DeployRunner::new();
        runner
            .register(Box::new(FakeStep {
                id: StepId::Markets,
                deps: &[StepId::Settings],
            }))
            .unwrap();
        assert_matches!(
            runner.execution_order(),
            Err(DeployError::ConfigError(_))
        );
    }

    #[test]
    fn test_cycle_detected() {
        // Settings and Markets each waiting on the other.
        let mut runner = DeployRunner::new();
        runner
            .register(Box::new(FakeStep {
                id: StepId::Settings,
                deps: &[StepId::Markets],
            }))
            .unwrap();
        runner
            .register(Box::new(FakeStep {
                id: StepId::Markets,
                deps: &[StepId::Settings],
            }))
            .unwrap();
        assert_matches!(
            runner.execution_order(),
            Err(DeployError::DependencyCycle(_))
        );
    }
}
