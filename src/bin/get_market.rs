//! Prints the deployed addresses for one market pair.
//!
//! ```text
//! get-market --lendTokenSym DAI --collTokenSym ETH [--network kovan] [--log false]
//! ```
//!
//! The network defaults to the `NETWORK` environment variable, then ganache.
//! Addresses come from the persisted ledger under
//! `deployments/<network>/_addresses.json`.

use anyhow::{bail, Context};
use std::path::PathBuf;
use teller_deploy::config::Network;
use teller_deploy::ledger::AddressLedger;
use teller_deploy::{get_market, MarketAddresses};

struct Args {
    lend_token_sym: String,
    coll_token_sym: String,
    network: Network,
    deployments_dir: PathBuf,
    log: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut lend_token_sym = None;
    let mut coll_token_sym = None;
    let mut network_name = std::env::var("NETWORK").ok();
    let mut deployments_dir = PathBuf::from("deployments");
    let mut log = true;

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("missing value for {}", flag))
        };
        match flag.as_str() {
            "--lendTokenSym" => lend_token_sym = Some(value(&flag)?),
            "--collTokenSym" => coll_token_sym = Some(value(&flag)?),
            "--network" => network_name = Some(value(&flag)?),
            "--deploymentsDir" => deployments_dir = PathBuf::from(value(&flag)?),
            "--log" => {
                let raw = value(&flag)?;
                log = raw
                    .parse::<bool>()
                    .with_context(|| format!("--log expects true or false, got '{}'", raw))?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => bail!("unknown argument '{}'", other),
        }
    }

    let lend_token_sym = lend_token_sym.context("--lendTokenSym is required")?;
    let coll_token_sym = coll_token_sym.context("--collTokenSym is required")?;
    let network = match network_name {
        Some(name) => Network::from_name(&name)?,
        None => Network::Ganache,
    };

    Ok(Args {
        lend_token_sym,
        coll_token_sym,
        network,
        deployments_dir,
        log,
    })
}

fn print_usage() {
    println!(
        "Usage: get-market --lendTokenSym <SYM> --collTokenSym <SYM> \
         [--network <name>] [--deploymentsDir <dir>] [--log <bool>]"
    );
}

fn main() -> anyhow::Result<()> {
    let args = parse_args().map_err(|e| {
        print_usage();
        e
    })?;

    if args.log {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let ledger = AddressLedger::load(&args.deployments_dir, args.network)?;
    let MarketAddresses {
        lending_pool,
        loan_manager,
    } = get_market(&ledger, &args.lend_token_sym, &args.coll_token_sym).with_context(|| {
        format!(
            "market {}/{} is not deployed on {}",
            args.lend_token_sym, args.coll_token_sym, args.network
        )
    })?;

    println!(
        "Market {}/{} on {}:",
        args.lend_token_sym, args.coll_token_sym, args.network
    );
    println!("  LendingPool: {}", lending_pool);
    println!("  LoanManager: {}", loan_manager);
    Ok(())
}
