//! Configuration record types shared by the network tables and deploy steps.

use crate::error::{DeployError, Result};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token symbol, e.g. `DAI` or `TLR`
pub type TokenSymbol = String;

/// Token symbol to on-chain address table for one network
pub type TokenTable = BTreeMap<TokenSymbol, Address>;

/// A named numeric protocol parameter applied on-chain at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSetting {
    /// Setting name as registered on-chain (bytes32 padded)
    pub name: String,
    /// Current value
    pub value: U256,
    /// Lower bound enforced by the settings contract
    pub min: U256,
    /// Upper bound enforced by the settings contract
    pub max: U256,
    /// Whether the initial deployment registers this setting
    pub process_on_deployment: bool,
}

impl PlatformSetting {
    /// Construct a setting that is registered during deployment
    pub fn new(name: &str, value: u64, min: u64, max: u64) -> Self {
        Self {
            name: name.to_string(),
            value: U256::from(value),
            min: U256::from(min),
            max: U256::from(max),
            process_on_deployment: true,
        }
    }

    /// Mark this setting as not registered during initial deployment
    pub fn skip_on_deployment(mut self) -> Self {
        self.process_on_deployment = false;
        self
    }

    /// Check `min <= value <= max`
    pub fn validate(&self) -> Result<()> {
        if self.min > self.value || self.value > self.max {
            return Err(DeployError::ConfigError(format!(
                "Platform setting '{}' violates min <= value <= max ({} <= {} <= {})",
                self.name, self.min, self.value, self.max
            )));
        }
        Ok(())
    }
}

/// Per-asset risk settings referencing symbols in the token table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSetting {
    /// Compound cToken symbol backing this asset, if any
    pub ctoken: Option<TokenSymbol>,
    /// Aave aToken symbol backing this asset, if any
    pub atoken: Option<TokenSymbol>,
    /// Yearn vault symbol backing this asset, if any
    pub yvault: Option<TokenSymbol>,
    /// Maximum single loan amount, in whole tokens
    pub max_loan_amount: u64,
    /// Maximum total value locked, in whole tokens
    pub max_tvl_amount: u64,
    /// Maximum debt ratio, in basis points
    pub max_debt_ratio: u64,
}

impl AssetSetting {
    /// Settings for a Compound-backed asset
    pub fn compound(ctoken: &str, max_loan_amount: u64, max_tvl_amount: u64) -> Self {
        Self {
            ctoken: Some(ctoken.to_string()),
            atoken: None,
            yvault: None,
            max_loan_amount,
            max_tvl_amount,
            max_debt_ratio: 5000,
        }
    }

    /// Set the maximum debt ratio in basis points
    pub fn with_max_debt_ratio(mut self, bps: u64) -> Self {
        self.max_debt_ratio = bps;
        self
    }

    /// Symbols this setting references in the token table
    pub fn referenced_symbols(&self) -> Vec<&TokenSymbol> {
        [&self.ctoken, &self.atoken, &self.yvault]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// A lending market: one lending token against a set of collateral tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Symbol of the token being lent
    pub lending_token: TokenSymbol,
    /// Symbols accepted as collateral
    pub collateral_tokens: Vec<TokenSymbol>,
    /// Yield strategy name used by the lending pool
    pub strategy: String,
}

impl Market {
    /// Build a market, splicing the lending token out of the collateral list
    pub fn new(lending_token: &str, collateral_tokens: &[&str], strategy: &str) -> Self {
        let collateral_tokens = collateral_tokens
            .iter()
            .filter(|sym| **sym != lending_token)
            .map(|sym| sym.to_string())
            .collect();
        Self {
            lending_token: lending_token.to_string(),
            collateral_tokens,
            strategy: strategy.to_string(),
        }
    }

    /// Check the lending token does not collateralize itself
    pub fn validate(&self) -> Result<()> {
        if self.collateral_tokens.contains(&self.lending_token) {
            return Err(DeployError::ConfigError(format!(
                "Market '{}' lists its lending token as collateral",
                self.lending_token
            )));
        }
        Ok(())
    }
}

/// An on-chain Chainlink price feed registration, keyed by (base, quote)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainlinkPair {
    /// Base token symbol
    pub base: TokenSymbol,
    /// Quote token symbol
    pub quote: TokenSymbol,
    /// Deployed aggregator contract address
    pub aggregator: Address,
    /// Aggregator response decimals
    pub response_decimals: u8,
    /// Collateral buffer applied to this feed, in basis points
    pub collateral_buffer: u64,
}

impl ChainlinkPair {
    /// Construct a pair registration
    pub fn new(base: &str, quote: &str, aggregator: Address) -> Self {
        Self {
            base: base.to_string(),
            quote: quote.to_string(),
            aggregator,
            response_decimals: 8,
            collateral_buffer: 3200,
        }
    }
}

/// ATM ("Asset Tier Module") governance/reward token parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtmToken {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Token decimals
    pub decimals: u8,
    /// Maximum cap, in whole tokens
    pub max_cap: u64,
    /// Maximum vesting slots per wallet
    pub max_vestings_per_wallet: u64,
}

/// Per-network ATM configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtmConfig {
    /// Reward token parameters
    pub token: AtmToken,
    /// Initial TLR reward per block
    pub tlr_initial_reward: u64,
    /// Supply-to-debt ratio, in basis points
    pub supply_to_debt: u64,
}

/// Named third-party dapp contract registered with the protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dapp {
    /// Registry name, e.g. `Uniswap`
    pub name: String,
    /// Deployed dapp adapter address
    pub address: Address,
    /// Whether loans may call this dapp without extra checks
    pub unsecured: bool,
}

/// Fully resolved configuration bundle for one network.
///
/// Assembled by [`crate::networks::NetworkConfig::resolve`]; static and never
/// mutated after resolution.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Token symbol to address table
    pub tokens: TokenTable,
    /// Markets to materialize
    pub markets: Vec<Market>,
    /// Platform settings registered at deploy time
    pub platform_settings: Vec<PlatformSetting>,
    /// Per-asset settings, keyed by symbol
    pub asset_settings: BTreeMap<TokenSymbol, AssetSetting>,
    /// Chainlink pairs to register
    pub chainlink_pairs: Vec<ChainlinkPair>,
    /// Authorized off-chain signer addresses
    pub signers: Vec<Address>,
    /// Known node URLs for this network
    pub nodes: Vec<String>,
    /// ATM configurations, keyed by name
    pub atms: BTreeMap<String, AtmConfig>,
    /// Dapps to register
    pub dapps: Vec<Dapp>,
}

impl NetworkConfig {
    /// Look up a token address by symbol
    pub fn token(&self, symbol: &str) -> Result<Address> {
        self.tokens
            .get(symbol)
            .copied()
            .ok_or_else(|| DeployError::UnknownToken(symbol.to_string()))
    }

    /// Validate invariants and cross-table references.
    ///
    /// Symbols referenced by markets, asset settings, and chainlink pairs must
    /// resolve against the token table; settings and markets must satisfy
    /// their own invariants.
    pub fn validate(&self) -> Result<()> {
        for setting in &self.platform_settings {
            setting.validate()?;
        }
        for market in &self.markets {
            market.validate()?;
            self.token(&market.lending_token)?;
            for coll in &market.collateral_tokens {
                self.token(coll)?;
            }
        }
        for (symbol, setting) in &self.asset_settings {
            self.token(symbol)?;
            for referenced in setting.referenced_symbols() {
                self.token(referenced)?;
            }
        }
        for pair in &self.chainlink_pairs {
            self.token(&pair.base)?;
            self.token(&pair.quote)?;
        }
        Ok(())
    }
}
