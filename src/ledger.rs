//! Persisted deployment address ledger.
//!
//! One ledger per network, written to `deployments/<network>/_addresses.json`.
//! Sections are `BTreeMap`s so serialization is deterministic regardless of
//! insertion order. The ledger is an explicit handle owned by the deployment
//! session; nothing in the crate mutates a shared file behind the caller's
//! back. Single-operator assumption: writes are plain overwrites, unguarded
//! by locks.

use crate::config::Network;
use crate::error::Result;
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ledger section a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// TToken lending pools, keyed `LP_<token>`
    LendingPools,
    /// Loan managers, keyed `Market_<lend>_<coll>`
    Markets,
    /// Deployed libraries
    Libraries,
    /// Upgradeable proxies
    Proxies,
    /// Logic contracts behind proxies
    Logics,
}

/// Serialized ledger layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerFile {
    lending_pools: BTreeMap<String, Address>,
    markets: BTreeMap<String, Address>,
    libraries: BTreeMap<String, Address>,
    proxies: BTreeMap<String, Address>,
    logics: BTreeMap<String, Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Deployment address ledger for one network
#[derive(Debug, Clone)]
pub struct AddressLedger {
    network: Network,
    path: Option<PathBuf>,
    file: LedgerFile,
    dirty: bool,
}

impl AddressLedger {
    /// Ledger file path for a network under the deployments directory
    pub fn path_for(deployments_dir: &Path, network: Network) -> PathBuf {
        deployments_dir
            .join(network.name())
            .join("_addresses.json")
    }

    /// Load the ledger for a network, starting empty when no file exists yet
    pub fn load(deployments_dir: &Path, network: Network) -> Result<Self> {
        let path = Self::path_for(deployments_dir, network);
        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            LedgerFile::default()
        };

        debug!("Loaded address ledger for {} from {:?}", network, path);
        Ok(Self {
            network,
            path: Some(path),
            file,
            dirty: false,
        })
    }

    /// Create an in-memory ledger that is never persisted (test use)
    pub fn in_memory(network: Network) -> Self {
        Self {
            network,
            path: None,
            file: LedgerFile::default(),
            dirty: false,
        }
    }

    /// Network this ledger belongs to
    pub fn network(&self) -> Network {
        self.network
    }

    fn section(&self, section: Section) -> &BTreeMap<String, Address> {
        match section {
            Section::LendingPools => &self.file.lending_pools,
            Section::Markets => &self.file.markets,
            Section::Libraries => &self.file.libraries,
            Section::Proxies => &self.file.proxies,
            Section::Logics => &self.file.logics,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut BTreeMap<String, Address> {
        match section {
            Section::LendingPools => &mut self.file.lending_pools,
            Section::Markets => &mut self.file.markets,
            Section::Libraries => &mut self.file.libraries,
            Section::Proxies => &mut self.file.proxies,
            Section::Logics => &mut self.file.logics,
        }
    }

    /// Look up a recorded address
    pub fn get(&self, section: Section, name: &str) -> Option<Address> {
        self.section(section).get(name).copied()
    }

    /// Whether a logical name already has a recorded address
    pub fn contains(&self, section: Section, name: &str) -> bool {
        self.section(section).contains_key(name)
    }

    /// Record an address under a logical name.
    ///
    /// Recording the same (section, name, address) again is a no-op and does
    /// not mark the ledger dirty, so idempotent re-runs leave the file
    /// untouched.
    pub fn record(&mut self, section: Section, name: &str, address: Address) {
        let entry = self.section_mut(section);
        if entry.get(name) == Some(&address) {
            return;
        }
        entry.insert(name.to_string(), address);
        self.dirty = true;
        debug!("Recorded {:?} entry {} = {}", section, name, address);
    }

    /// Number of entries across all sections
    pub fn len(&self) -> usize {
        [
            Section::LendingPools,
            Section::Markets,
            Section::Libraries,
            Section::Proxies,
            Section::Logics,
        ]
        .iter()
        .map(|s| self.section(*s).len())
        .sum()
    }

    /// Whether the ledger has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether unsaved changes exist
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Serialize the ledger to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.file)?)
    }

    /// Persist the ledger when it changed since the last save.
    ///
    /// In-memory ledgers skip the write but still clear the dirty flag.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.file.updated_at = Some(Utc::now());

        if let Some(path) = self.path.clone() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, self.to_json()?)?;
            info!("Saved address ledger for {} to {:?}", self.network, path);
        }
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_record_and_lookup() {
        let mut ledger = AddressLedger::in_memory(Network::Ganache);
        ledger.record(Section::LendingPools, "LP_DAI", addr(1));
        ledger.record(Section::Markets, "Market_DAI_ETH", addr(2));

        assert_eq!(ledger.get(Section::LendingPools, "LP_DAI"), Some(addr(1)));
        assert!(ledger.contains(Section::Markets, "Market_DAI_ETH"));
        assert!(!ledger.contains(Section::Proxies, "LP_DAI"));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_identical_record_is_not_dirty() {
        let mut ledger = AddressLedger::in_memory(Network::Ganache);
        ledger.record(Section::Logics, "Settings", addr(3));
        ledger.save().unwrap();
        assert!(!ledger.is_dirty());

        ledger.record(Section::Logics, "Settings", addr(3));
        assert!(!ledger.is_dirty());

        ledger.record(Section::Logics, "Settings", addr(4));
        assert!(ledger.is_dirty());
    }

    #[test]
    fn test_json_sections_are_sorted() {
        let mut ledger = AddressLedger::in_memory(Network::Kovan);
        ledger.record(Section::LendingPools, "LP_USDC", addr(2));
        ledger.record(Section::LendingPools, "LP_DAI", addr(1));

        let json = ledger.to_json().unwrap();
        let dai_pos = json.find("LP_DAI").unwrap();
        let usdc_pos = json.find("LP_USDC").unwrap();
        assert!(dai_pos < usdc_pos);
        assert!(json.contains("lendingPools"));
        assert!(json.contains("markets"));
        assert!(json.contains("libraries"));
        assert!(json.contains("proxies"));
        assert!(json.contains("logics"));
    }

    #[test]
    fn test_load_save_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "teller-deploy-ledger-test-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);

        let mut ledger = AddressLedger::load(&dir, Network::Ganache).unwrap();
        assert!(ledger.is_empty());

        ledger.record(Section::Proxies, "Settings", addr(7));
        ledger.save().unwrap();

        let reloaded = AddressLedger::load(&dir, Network::Ganache).unwrap();
        assert_eq!(reloaded.get(Section::Proxies, "Settings"), Some(addr(7)));

        fs::remove_dir_all(&dir).unwrap();
    }
}
