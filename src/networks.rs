//! Per-network configuration tables and their resolvers.
//!
//! Each resolver is a pure function from a [`Network`] to one table; nothing
//! here performs I/O. [`NetworkConfig::resolve`] assembles the full bundle for
//! a network and cross-validates symbolic references against the token table.

use crate::config::Network;
use crate::error::Result;
use crate::types::{
    AssetSetting, AtmConfig, AtmToken, ChainlinkPair, Dapp, Market, NetworkConfig,
    PlatformSetting, TokenSymbol, TokenTable,
};
use alloy_primitives::{address, Address};
use std::collections::BTreeMap;

/// Token address table for a network
pub fn tokens(network: Network) -> Result<TokenTable> {
    let entries: &[(&str, Address)] = match network {
        Network::Mainnet => &[
            ("ETH", address!("0000000000000000000000000000000000000000")),
            ("WETH", address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
            ("DAI", address!("6B175474E89094C44Da98b954EedeAC495271d0F")),
            ("USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
            ("LINK", address!("514910771AF9Ca656af840dff83E8264EcF986CA")),
            ("CDAI", address!("5d3a536E4D6DbD6114cc1Ead35777bAB948E3643")),
            ("CUSDC", address!("39AA39c021dfbaE8faC545936693aC917d5E7563")),
            ("CETH", address!("4Ddc2D193948926D02f9B1fE9e1daa0718270ED5")),
            ("COMP", address!("c00e94Cb662C3520282E6f5717214004A7f26888")),
        ],
        Network::Kovan => &[
            ("ETH", address!("0000000000000000000000000000000000000000")),
            ("WETH", address!("d0A1E359811322d97991E03f863a0C30C2cF029C")),
            ("DAI", address!("4F96Fe3b7A6Cf9725f59d353F723c1bDb64CA6Aa")),
            ("USDC", address!("b7a4F3E9097C08dA09517b5aB877F7a917224ede")),
            ("LINK", address!("a36085F69e2889c224210F603D836748e7dC0088")),
            ("CDAI", address!("F0d0EB522cfa50B716B3b1604C4F0fA6f04376AD")),
            ("CUSDC", address!("4a92E71227D294F041BD82dd8f78591B75140d63")),
            ("CETH", address!("41B5844f4680a8C38fBb695b7F9CFd1F64474a72")),
            ("COMP", address!("61460874a7196d6a22D1eE4922473664b3E95270")),
        ],
        Network::Rinkeby => &[
            ("ETH", address!("0000000000000000000000000000000000000000")),
            ("WETH", address!("c778417E063141139Fce010982780140Aa0cD5Ab")),
            ("DAI", address!("5592EC0cfb4dbc12D3aB100b257153436a1f0FEa")),
            ("USDC", address!("4DBCdF9B62e891a7cec5A2568C3F4FAF9E8Abe2b")),
            ("LINK", address!("01BE23585060835E02B77ef475b0Cc51aA1e0709")),
            ("CDAI", address!("6D7F0754FFeb405d23C51CE938289d4835bE3b14")),
            ("CUSDC", address!("5B281A6DdA0B271e91ae35DE655Ad301C976edb1")),
            ("CETH", address!("d6801a1DfFCd0a410336Ef88DeF4320D6DF1883e")),
        ],
        Network::Ropsten => &[
            ("ETH", address!("0000000000000000000000000000000000000000")),
            ("WETH", address!("0a180A76e4466bF68A7F86fB029BEd3cCcFaAac5")),
            ("DAI", address!("31F42841c2db5173425b5223809CF3A38FEde360")),
            ("USDC", address!("07865c6E87B9F70255377e024ace6630C1Eaa37F")),
            ("LINK", address!("20fE562d797A42Dcb3399062AE9546cd06f63280")),
            ("CDAI", address!("bc689667C13FB2a04f09272753760E38a95B998C")),
            ("CUSDC", address!("2973e69b20563bcc66dC63Bde153072c33eF37fe")),
            ("CETH", address!("859e9d8a4edadfEDb5A2fF311243af80F85A91b8")),
        ],
        // Local chains fund a deterministic token set at fixed addresses.
        Network::Ganache => &[
            ("ETH", address!("0000000000000000000000000000000000000000")),
            ("WETH", address!("1000000000000000000000000000000000000001")),
            ("DAI", address!("1000000000000000000000000000000000000002")),
            ("USDC", address!("1000000000000000000000000000000000000003")),
            ("LINK", address!("1000000000000000000000000000000000000004")),
            ("CDAI", address!("1000000000000000000000000000000000000005")),
            ("CUSDC", address!("1000000000000000000000000000000000000006")),
            ("CETH", address!("1000000000000000000000000000000000000007")),
        ],
    };

    Ok(entries
        .iter()
        .map(|(sym, addr)| (sym.to_string(), *addr))
        .collect())
}

/// Markets materialized on a network
pub fn markets(network: Network) -> Result<Vec<Market>> {
    // The helper splices the lending token out of its own collateral list.
    let list = match network {
        Network::Mainnet | Network::Kovan | Network::Ganache => vec![
            Market::new("DAI", &["DAI", "ETH", "LINK"], "compound"),
            Market::new("USDC", &["USDC", "ETH", "LINK"], "compound"),
        ],
        Network::Rinkeby | Network::Ropsten => vec![
            Market::new("DAI", &["DAI", "ETH", "LINK"], "compound"),
        ],
    };
    Ok(list)
}

/// Platform settings registered during initial deployment
pub fn platform_settings(network: Network) -> Result<Vec<PlatformSetting>> {
    let mut settings = vec![
        PlatformSetting::new("RequiredSubmissionsPercentage", 8000, 0, 10000),
        PlatformSetting::new("MaximumTolerance", 0, 0, 3000),
        PlatformSetting::new("ResponseExpiryLength", 900, 300, 3600),
        PlatformSetting::new("SafetyInterval", 300, 60, 3600),
        PlatformSetting::new("TermsExpiryTime", 3600, 600, 86400),
        PlatformSetting::new("LiquidateEthPrice", 9500, 9000, 10000),
        PlatformSetting::new("MaximumLoanDuration", 5184000, 86400, 31536000),
        PlatformSetting::new("CollateralBuffer", 1500, 0, 5000),
        PlatformSetting::new("RequestLoanTermsRateLimit", 90, 30, 3600),
    ];
    if network == Network::Ganache {
        // Only local chains register the buffer used by liquidation tests.
        settings.push(PlatformSetting::new("OverCollateralizedBuffer", 13000, 11000, 50000));
    }
    Ok(settings)
}

/// Per-asset settings, keyed by token symbol
pub fn asset_settings(network: Network) -> Result<BTreeMap<TokenSymbol, AssetSetting>> {
    let mut settings = BTreeMap::new();
    match network {
        Network::Mainnet => {
            settings.insert(
                "DAI".to_string(),
                AssetSetting::compound("CDAI", 25000, 10000000),
            );
            settings.insert(
                "USDC".to_string(),
                AssetSetting::compound("CUSDC", 25000, 10000000),
            );
        }
        _ => {
            settings.insert(
                "DAI".to_string(),
                AssetSetting::compound("CDAI", 1000, 100000),
            );
            settings.insert(
                "USDC".to_string(),
                AssetSetting::compound("CUSDC", 1000, 100000),
            );
        }
    }
    Ok(settings)
}

/// Chainlink pairs registered on a network, keyed by (base, quote)
pub fn chainlink_pairs(network: Network) -> Result<Vec<ChainlinkPair>> {
    let pairs = match network {
        Network::Mainnet => vec![
            ChainlinkPair::new(
                "ETH",
                "DAI",
                address!("773616E4d11A78F511299002da57A0a94577F1f4"),
            ),
            ChainlinkPair::new(
                "ETH",
                "USDC",
                address!("986b5E1e1755e3C2440e960477f25201B0a8bbD4"),
            ),
            ChainlinkPair::new(
                "LINK",
                "DAI",
                address!("DC530D9457755926550b59e8ECcdaE7624181557"),
            ),
            ChainlinkPair::new(
                "LINK",
                "USDC",
                address!("9f2A0CF3Ce8Ff025f8b42266aA1b5bf0A32D82a3"),
            ),
        ],
        Network::Kovan => vec![
            ChainlinkPair::new(
                "ETH",
                "DAI",
                address!("22B58f1EbEDfCA50feF632bD73368b2FdA96D541"),
            ),
            ChainlinkPair::new(
                "ETH",
                "USDC",
                address!("64EaC61A2DFda2c3Fa04eED49AA33D021AeC8838"),
            ),
            ChainlinkPair::new(
                "LINK",
                "DAI",
                address!("3Af8C569ab77af5230596Acf0E8c2F9351d24C38"),
            ),
            ChainlinkPair::new(
                "LINK",
                "USDC",
                address!("f1e71Afd1459C05A2F898502C4025be755aa844A"),
            ),
        ],
        Network::Rinkeby | Network::Ropsten => vec![
            ChainlinkPair::new(
                "ETH",
                "DAI",
                address!("2000000000000000000000000000000000000001"),
            ),
            ChainlinkPair::new(
                "LINK",
                "DAI",
                address!("2000000000000000000000000000000000000002"),
            ),
        ],
        Network::Ganache => vec![
            ChainlinkPair::new(
                "ETH",
                "DAI",
                address!("2000000000000000000000000000000000000001"),
            ),
            ChainlinkPair::new(
                "ETH",
                "USDC",
                address!("2000000000000000000000000000000000000002"),
            ),
            ChainlinkPair::new(
                "LINK",
                "DAI",
                address!("2000000000000000000000000000000000000003"),
            ),
        ],
    };
    Ok(pairs)
}

/// Authorized off-chain signer addresses for a network
pub fn signers(network: Network) -> Result<Vec<Address>> {
    let list = match network {
        Network::Mainnet => vec![
            address!("34aAA2D7b0A8cF35830bd737bfA6E5e10bd2C305"),
            address!("86E44Dd12915A3Cc3e2f17C65bD6a4DA90447f7b"),
        ],
        Network::Kovan | Network::Rinkeby | Network::Ropsten => vec![
            address!("8DDbC3Bd38fdA84E6D77BE8Ac5570AeC2a7e6b1b"),
            address!("1C2bbE3ed8cA66a184a4c73deA4B2FcFc0F05386"),
        ],
        Network::Ganache => vec![
            address!("3000000000000000000000000000000000000001"),
            address!("3000000000000000000000000000000000000002"),
        ],
    };
    Ok(list)
}

/// Known node URLs for a network
pub fn nodes(network: Network) -> Result<Vec<String>> {
    let list = match network {
        Network::Ganache => vec!["http://127.0.0.1:8545".to_string()],
        other => vec![
            other.default_node_url().to_string(),
            format!("https://{}.eth.cloud.ava.do", other.name()),
        ],
    };
    Ok(list)
}

/// ATM configurations for a network, keyed by ATM name
pub fn atms(network: Network) -> Result<BTreeMap<String, AtmConfig>> {
    let mut table = BTreeMap::new();
    table.insert(
        "teller".to_string(),
        AtmConfig {
            token: AtmToken {
                name: "Teller Token".to_string(),
                symbol: "TLR".to_string(),
                decimals: 18,
                max_cap: 100000000,
                max_vestings_per_wallet: 50,
            },
            tlr_initial_reward: if network == Network::Mainnet { 0 } else { 1000 },
            supply_to_debt: 5000,
        },
    );
    Ok(table)
}

/// Third-party dapps registered with the protocol on a network
pub fn dapps(network: Network) -> Result<Vec<Dapp>> {
    let list = match network {
        Network::Mainnet => vec![
            Dapp {
                name: "Uniswap".to_string(),
                address: address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
                unsecured: false,
            },
            Dapp {
                name: "Compound".to_string(),
                address: address!("3d9819210A31b4961b30EF54bE2aeD79B9c9Cd3B"),
                unsecured: true,
            },
        ],
        Network::Kovan => vec![
            Dapp {
                name: "Uniswap".to_string(),
                address: address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
                unsecured: false,
            },
            Dapp {
                name: "Compound".to_string(),
                address: address!("5eAe89DC1C671724A672ff0630122ee834098657"),
                unsecured: true,
            },
        ],
        _ => vec![Dapp {
            name: "Uniswap".to_string(),
            address: address!("4000000000000000000000000000000000000001"),
            unsecured: false,
        }],
    };
    Ok(list)
}

impl NetworkConfig {
    /// Resolve the complete, validated configuration bundle for a network.
    ///
    /// Fails with [`crate::error::DeployError::UnknownNetwork`] when the
    /// network has no tables, and with a configuration error when any
    /// cross-table reference dangles.
    pub fn resolve(network: Network) -> Result<Self> {
        let config = Self {
            tokens: tokens(network)?,
            markets: markets(network)?,
            platform_settings: platform_settings(network)?,
            asset_settings: asset_settings(network)?,
            chainlink_pairs: chainlink_pairs(network)?,
            signers: signers(network)?,
            nodes: nodes(network)?,
            atms: atms(network)?,
            dapps: dapps(network)?,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Network::Mainnet)]
    #[test_case(Network::Kovan)]
    #[test_case(Network::Rinkeby)]
    #[test_case(Network::Ropsten)]
    #[test_case(Network::Ganache)]
    fn test_every_network_resolves(network: Network) {
        let config = NetworkConfig::resolve(network).unwrap();
        assert!(!config.tokens.is_empty());
        assert!(!config.markets.is_empty());
        assert!(!config.platform_settings.is_empty());
        assert!(!config.asset_settings.is_empty());
        assert!(!config.chainlink_pairs.is_empty());
        assert!(!config.signers.is_empty());
        assert!(!config.nodes.is_empty());
    }

    #[test_case(Network::Mainnet)]
    #[test_case(Network::Kovan)]
    #[test_case(Network::Rinkeby)]
    #[test_case(Network::Ropsten)]
    #[test_case(Network::Ganache)]
    fn test_no_market_collateralizes_itself(network: Network) {
        for market in markets(network).unwrap() {
            assert!(
                !market.collateral_tokens.contains(&market.lending_token),
                "market {} lists itself as collateral",
                market.lending_token
            );
        }
    }

    #[test_case(Network::Mainnet)]
    #[test_case(Network::Kovan)]
    #[test_case(Network::Ganache)]
    fn test_platform_settings_within_bounds(network: Network) {
        for setting in platform_settings(network).unwrap() {
            setting.validate().unwrap();
        }
    }

    #[test]
    fn test_kovan_dai_asset_setting() {
        let settings = asset_settings(Network::Kovan).unwrap();
        let dai = settings.get("DAI").unwrap();
        assert_eq!(dai.ctoken.as_deref(), Some("CDAI"));
        assert_eq!(dai.max_loan_amount, 1000);
        assert_eq!(dai.max_tvl_amount, 100000);
    }

    #[test]
    fn test_mainnet_teller_atm_token() {
        let table = atms(Network::Mainnet).unwrap();
        assert_eq!(table.get("teller").unwrap().token.symbol, "TLR");
    }

    #[test]
    fn test_chainlink_pairs_unique_by_base_quote() {
        for network in Network::ALL {
            let pairs = chainlink_pairs(network).unwrap();
            let mut keys: Vec<_> = pairs
                .iter()
                .map(|p| (p.base.clone(), p.quote.clone()))
                .collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), pairs.len());
        }
    }

    #[test]
    fn test_token_lookup_failure_is_structured() {
        let config = NetworkConfig::resolve(Network::Kovan).unwrap();
        assert!(matches!(
            config.token("NOT_A_TOKEN"),
            Err(crate::error::DeployError::UnknownToken(_))
        ));
    }
}
