//! Cross-network configuration table properties.
//!
//! Every network's tables must resolve into a validated bundle: symbolic
//! references land in the token table, settings sit within their bounds, and
//! no market lists its own lending token as collateral.

use teller_deploy::config::{DeployConfig, Network};
use teller_deploy::error::DeployError;
use teller_deploy::networks;
use teller_deploy::types::NetworkConfig;
use alloy_primitives::Address;
use test_case::test_case;

#[test_case(Network::Mainnet)]
#[test_case(Network::Kovan)]
#[test_case(Network::Rinkeby)]
#[test_case(Network::Ropsten)]
#[test_case(Network::Ganache)]
fn every_network_resolves_and_validates(network: Network) {
    let config = NetworkConfig::resolve(network).unwrap();
    assert!(config.validate().is_ok());
}

#[test_case(Network::Mainnet)]
#[test_case(Network::Kovan)]
#[test_case(Network::Rinkeby)]
#[test_case(Network::Ropsten)]
#[test_case(Network::Ganache)]
fn market_symbols_resolve_against_token_table(network: Network) {
    let config = NetworkConfig::resolve(network).unwrap();
    for market in &config.markets {
        assert!(config.token(&market.lending_token).is_ok());
        for collateral in &market.collateral_tokens {
            assert!(config.token(collateral).is_ok());
            assert_ne!(collateral, &market.lending_token);
        }
    }
}

#[test_case(Network::Mainnet)]
#[test_case(Network::Kovan)]
#[test_case(Network::Rinkeby)]
#[test_case(Network::Ropsten)]
#[test_case(Network::Ganache)]
fn asset_settings_reference_known_tokens(network: Network) {
    let config = NetworkConfig::resolve(network).unwrap();
    for (symbol, setting) in &config.asset_settings {
        assert!(config.token(symbol).is_ok());
        for backing in setting.referenced_symbols() {
            assert!(config.token(backing).is_ok());
        }
        assert!(setting.max_loan_amount <= setting.max_tvl_amount);
    }
}

#[test_case(Network::Mainnet)]
#[test_case(Network::Kovan)]
#[test_case(Network::Rinkeby)]
#[test_case(Network::Ropsten)]
#[test_case(Network::Ganache)]
fn platform_settings_satisfy_their_bounds(network: Network) {
    for setting in networks::platform_settings(network).unwrap() {
        assert!(
            setting.validate().is_ok(),
            "setting '{}' violates its bounds",
            setting.name
        );
    }
}

#[test_case(Network::Mainnet)]
#[test_case(Network::Kovan)]
#[test_case(Network::Rinkeby)]
#[test_case(Network::Ropsten)]
#[test_case(Network::Ganache)]
fn chainlink_pairs_resolve_and_are_unique(network: Network) {
    let config = NetworkConfig::resolve(network).unwrap();
    let mut keys = Vec::new();
    for pair in &config.chainlink_pairs {
        assert!(config.token(&pair.base).is_ok());
        assert!(config.token(&pair.quote).is_ok());
        assert_ne!(pair.aggregator, Address::ZERO);
        keys.push((pair.base.clone(), pair.quote.clone()));
    }
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total, "duplicate (base, quote) pair");
}

#[test]
fn kovan_dai_asset_setting_matches_deployed_values() {
    let settings = networks::asset_settings(Network::Kovan).unwrap();
    let dai = settings.get("DAI").unwrap();
    assert_eq!(dai.ctoken.as_deref(), Some("CDAI"));
    assert_eq!(dai.max_loan_amount, 1000);
    assert_eq!(dai.max_tvl_amount, 100000);
}

#[test]
fn mainnet_teller_atm_uses_tlr_token() {
    let atms = networks::atms(Network::Mainnet).unwrap();
    let teller = atms.get("teller").unwrap();
    assert_eq!(teller.token.symbol, "TLR");
    assert_eq!(teller.token.decimals, 18);
}

#[test]
fn unknown_token_lookup_is_structured() {
    let config = NetworkConfig::resolve(Network::Mainnet).unwrap();
    match config.token("SHIB") {
        Err(DeployError::UnknownToken(symbol)) => assert_eq!(symbol, "SHIB"),
        other => panic!("expected UnknownToken, got {:?}", other),
    }
}

#[test]
fn network_names_round_trip() {
    for network in Network::ALL {
        assert_eq!(Network::from_name(network.name()).unwrap(), network);
    }
    assert!(matches!(
        Network::from_name("hardhat"),
        Err(DeployError::UnknownNetwork(_))
    ));
}

#[test_case(Network::Mainnet)]
#[test_case(Network::Kovan)]
#[test_case(Network::Rinkeby)]
#[test_case(Network::Ropsten)]
#[test_case(Network::Ganache)]
fn default_deploy_config_is_valid(network: Network) {
    let config = DeployConfig::new(network, Address::repeat_byte(0xaa));
    assert!(config.validate().is_ok());
}
