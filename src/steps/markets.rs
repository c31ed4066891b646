//! Market materialization.
//!
//! For each configured market and collateral token, asks the market factory
//! to create the (lending token, collateral token) market, then records the
//! resulting LendingPool and LoanManager addresses in the ledger and
//! authorizes the configured signers on the new LoanManager.

use super::{DeployContext, DeployStep, StepId};
use crate::abi::{self, Token};
use crate::ledger::Section;
use crate::error::Result;
use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::{debug, info};

/// Ledger key for a market's loan manager
pub fn market_key(lending: &str, collateral: &str) -> String {
    format!("Market_{}_{}", lending, collateral)
}

/// Ledger key for a lending pool
pub fn lending_pool_key(lending: &str) -> String {
    format!("LP_{}", lending)
}

/// Creates configured markets through the on-chain factory
pub struct MarketsStep;

#[async_trait]
impl DeployStep for MarketsStep {
    fn id(&self) -> StepId {
        StepId::Markets
    }

    fn dependencies(&self) -> &'static [StepId] {
        &[
            StepId::Settings,
            StepId::PlatformSettings,
            StepId::AssetSettings,
            StepId::Chainlink,
        ]
    }

    async fn run(&self, ctx: &mut DeployContext) -> Result<()> {
        let factory = ctx.required_proxy(self.id(), "MarketFactory")?;

        for market in ctx.network.markets.clone() {
            market.validate()?;
            let lending = ctx.network.token(&market.lending_token)?;

            for collateral_symbol in &market.collateral_tokens {
                let collateral = ctx.network.token(collateral_symbol)?;

                // Re-running creation for an existing pair reverts on-chain,
                // so the pair is checked first and silently skipped.
                let exists = ctx
                    .call(
                        factory,
                        "existsMarket(address,address)",
                        &[Token::Address(lending), Token::Address(collateral)],
                    )
                    .await
                    .and_then(|data| abi::decode_bool(&data, 0))?;

                if !exists {
                    info!(
                        "Creating market {}/{}",
                        market.lending_token, collateral_symbol
                    );
                    ctx.send(
                        factory,
                        "createMarket(address,address)",
                        &[Token::Address(lending), Token::Address(collateral)],
                    )
                    .await?;
                } else {
                    debug!(
                        "Market {}/{} already exists",
                        market.lending_token, collateral_symbol
                    );
                }

                // getMarket returns (loanManager, lendingPool).
                let data = ctx
                    .call(
                        factory,
                        "getMarket(address,address)",
                        &[Token::Address(lending), Token::Address(collateral)],
                    )
                    .await?;
                let loan_manager = abi::decode_address(&data, 0)?;
                let lending_pool = abi::decode_address(&data, 1)?;

                ctx.ledger.record(
                    Section::Markets,
                    &market_key(&market.lending_token, collateral_symbol),
                    loan_manager,
                );
                ctx.ledger.record(
                    Section::LendingPools,
                    &lending_pool_key(&market.lending_token),
                    lending_pool,
                );

                authorize_signers(ctx, loan_manager).await?;
            }
        }
        Ok(())
    }
}

/// Add configured signers, plus the CRA signer when one is named, to the
/// LoanManager's authorized set. Guarded per signer by `isSigner`.
async fn authorize_signers(ctx: &mut DeployContext, loan_manager: Address) -> Result<()> {
    let mut signers = ctx.network.signers.clone();
    if let Some(cra) = ctx.config.cra_signer {
        signers.push(cra);
    }

    for signer in signers {
        let already = ctx
            .call(loan_manager, "isSigner(address)", &[Token::Address(signer)])
            .await
            .and_then(|data| abi::decode_bool(&data, 0))?;
        if already {
            debug!("Signer {} already authorized on {}", signer, loan_manager);
            continue;
        }
        info!("Authorizing signer {} on {}", signer, loan_manager);
        ctx.send(loan_manager, "addSigner(address)", &[Token::Address(signer)])
            .await?;
    }
    Ok(())
}
