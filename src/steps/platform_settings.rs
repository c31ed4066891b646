//! Platform setting registration.

use super::{DeployContext, DeployStep, StepId};
use crate::abi::{self, Token};
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Registers every platform setting marked for deployment processing.
///
/// Idempotence guard: `hasPlatformSetting` is consulted before sending, so a
/// re-run against an already-configured network sends nothing.
pub struct PlatformSettingsStep;

#[async_trait]
impl DeployStep for PlatformSettingsStep {
    fn id(&self) -> StepId {
        StepId::PlatformSettings
    }

    fn dependencies(&self) -> &'static [StepId] {
        &[StepId::Settings]
    }

    async fn run(&self, ctx: &mut DeployContext) -> Result<()> {
        let settings = ctx.required_proxy(self.id(), "Settings")?;
        let to_process: Vec<_> = ctx
            .network
            .platform_settings
            .iter()
            .filter(|s| s.process_on_deployment)
            .cloned()
            .collect();

        for setting in to_process {
            setting.validate()?;
            let name_word = abi::bytes32_from_str(&setting.name)?;

            let exists = ctx
                .call(
                    settings,
                    "hasPlatformSetting(bytes32)",
                    &[Token::FixedBytes(name_word)],
                )
                .await
                .and_then(|data| abi::decode_bool(&data, 0))?;
            if exists {
                debug!("Platform setting '{}' already registered", setting.name);
                continue;
            }

            info!(
                "Creating platform setting '{}' = {} (min {}, max {})",
                setting.name, setting.value, setting.min, setting.max
            );
            ctx.send(
                settings,
                "createPlatformSetting(bytes32,uint256,uint256,uint256)",
                &[
                    Token::FixedBytes(name_word),
                    Token::Uint(setting.value),
                    Token::Uint(setting.min),
                    Token::Uint(setting.max),
                ],
            )
            .await?;
        }
        Ok(())
    }
}
