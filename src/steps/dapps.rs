//! Third-party dapp registration.

use super::{DeployContext, DeployStep, StepId};
use crate::abi::{self, Token};
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Registers configured dapps (Uniswap, Compound adapters) with the registry.
///
/// Guarded per dapp by `isDapp`, so re-runs send nothing for dapps already
/// registered.
pub struct DappsStep;

#[async_trait]
impl DeployStep for DappsStep {
    fn id(&self) -> StepId {
        StepId::Dapps
    }

    fn dependencies(&self) -> &'static [StepId] {
        &[StepId::Settings]
    }

    async fn run(&self, ctx: &mut DeployContext) -> Result<()> {
        let registry = ctx.required_proxy(self.id(), "DappRegistry")?;

        for dapp in ctx.network.dapps.clone() {
            let registered = ctx
                .call(registry, "isDapp(address)", &[Token::Address(dapp.address)])
                .await
                .and_then(|data| abi::decode_bool(&data, 0))?;
            if registered {
                debug!("Dapp '{}' already registered", dapp.name);
                continue;
            }

            info!("Registering dapp '{}' at {}", dapp.name, dapp.address);
            ctx.send(
                registry,
                "addDapp(address,bool)",
                &[Token::Address(dapp.address), Token::Bool(dapp.unsecured)],
            )
            .await?;
        }
        Ok(())
    }
}
