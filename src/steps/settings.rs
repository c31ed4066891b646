//! Core contract deployment: settings, factories, and registries.
//!
//! Everything later steps talk to is deployed here, each as a logic contract
//! behind a proxy recorded under the same logical name. Re-runs reuse any
//! recorded address that still has code on-chain.

use super::{DeployContext, DeployStep, StepId};
use crate::error::Result;
use crate::ledger::Section;
use async_trait::async_trait;

/// Names of the proxied core contracts, in deployment order
pub const CORE_CONTRACTS: [&str; 4] = [
    "Settings",
    "ChainlinkAggregator",
    "MarketFactory",
    "DappRegistry",
];

/// Deploys the protocol's core singleton contracts
pub struct SettingsStep;

#[async_trait]
impl DeployStep for SettingsStep {
    fn id(&self) -> StepId {
        StepId::Settings
    }

    async fn run(&self, ctx: &mut DeployContext) -> Result<()> {
        // Shared library first; the core contracts link against it.
        ctx.deploy_contract(Section::Libraries, "LoanLib", &[])
            .await?;

        for name in CORE_CONTRACTS {
            ctx.deploy_logic_and_proxy(name).await?;
        }
        Ok(())
    }
}
