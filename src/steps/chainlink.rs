//! Chainlink pair registration.

use super::{DeployContext, DeployStep, StepId};
use crate::abi::{self, Token};
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Registers configured Chainlink aggregators, keyed by (base, quote).
///
/// Idempotence guard: the currently registered aggregator is read first and
/// the registration is skipped when it already matches the configured
/// address, so re-runs send nothing for registered pairs.
pub struct ChainlinkStep;

#[async_trait]
impl DeployStep for ChainlinkStep {
    fn id(&self) -> StepId {
        StepId::Chainlink
    }

    fn dependencies(&self) -> &'static [StepId] {
        &[StepId::Settings]
    }

    async fn run(&self, ctx: &mut DeployContext) -> Result<()> {
        let registry = ctx.required_proxy(self.id(), "ChainlinkAggregator")?;

        for pair in ctx.network.chainlink_pairs.clone() {
            let base = ctx.network.token(&pair.base)?;
            let quote = ctx.network.token(&pair.quote)?;

            let current = ctx
                .call(
                    registry,
                    "aggregatorFor(address,address)",
                    &[Token::Address(base), Token::Address(quote)],
                )
                .await
                .and_then(|data| abi::decode_address(&data, 0))?;
            if current == pair.aggregator {
                debug!(
                    "Aggregator for {}/{} already registered at {}",
                    pair.base, pair.quote, current
                );
                continue;
            }

            info!(
                "Registering aggregator for {}/{} at {}",
                pair.base, pair.quote, pair.aggregator
            );
            ctx.send(
                registry,
                "registerAggregator(address,address,address)",
                &[
                    Token::Address(base),
                    Token::Address(quote),
                    Token::Address(pair.aggregator),
                ],
            )
            .await?;
        }
        Ok(())
    }
}
