//! Per-asset setting registration.

use super::{DeployContext, DeployStep, StepId};
use crate::abi::{self, Token};
use crate::error::{DeployError, Result};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tracing::{debug, info};

/// Registers asset settings for every configured asset symbol.
///
/// Asset and backing-token symbols resolve against the network's token table;
/// a dangling symbol is a configuration error surfaced before any
/// transaction is sent.
pub struct AssetSettingsStep;

#[async_trait]
impl DeployStep for AssetSettingsStep {
    fn id(&self) -> StepId {
        StepId::AssetSettings
    }

    fn dependencies(&self) -> &'static [StepId] {
        &[StepId::Settings]
    }

    async fn run(&self, ctx: &mut DeployContext) -> Result<()> {
        let settings = ctx.required_proxy(self.id(), "Settings")?;
        let entries: Vec<_> = ctx
            .network
            .asset_settings
            .iter()
            .map(|(sym, setting)| (sym.clone(), setting.clone()))
            .collect();

        for (symbol, setting) in entries {
            let asset = ctx.network.token(&symbol)?;
            let backing_symbol = setting
                .ctoken
                .as_ref()
                .or(setting.atoken.as_ref())
                .or(setting.yvault.as_ref())
                .ok_or_else(|| {
                    DeployError::in_step(
                        self.id().name(),
                        format!("asset '{}' has no backing token configured", symbol),
                    )
                })?;
            let backing = ctx.network.token(backing_symbol)?;

            let initialized = ctx
                .call(
                    settings,
                    "isAssetSettingInitialized(address)",
                    &[Token::Address(asset)],
                )
                .await
                .and_then(|data| abi::decode_bool(&data, 0))?;
            if initialized {
                debug!("Asset setting for '{}' already initialized", symbol);
                continue;
            }

            info!(
                "Creating asset setting for '{}' (backed by '{}', max loan {}, max TVL {})",
                symbol, backing_symbol, setting.max_loan_amount, setting.max_tvl_amount
            );
            create_asset_setting(ctx, settings, asset, backing, &setting).await?;
        }
        Ok(())
    }
}

async fn create_asset_setting(
    ctx: &mut DeployContext,
    settings: Address,
    asset: Address,
    backing: Address,
    setting: &crate::types::AssetSetting,
) -> Result<()> {
    ctx.send(
        settings,
        "createAssetSetting(address,address,uint256,uint256,uint256)",
        &[
            Token::Address(asset),
            Token::Address(backing),
            Token::Uint(U256::from(setting.max_loan_amount)),
            Token::Uint(U256::from(setting.max_tvl_amount)),
            Token::Uint(U256::from(setting.max_debt_ratio)),
        ],
    )
    .await?;
    Ok(())
}
