//! Compiled contract artifact loading.
//!
//! Deploy steps read `<Name>.bin` (hex creation bytecode) and `<Name>.abi.json`
//! from the configured artifacts directory. The ABI is kept as raw JSON; this
//! crate only needs it for the deployment record, not for dispatch.

use crate::error::{DeployError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A compiled contract ready to deploy
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// Contract name, matching the artifact file stem
    pub name: String,
    /// Creation bytecode, hex without 0x prefix
    pub bytecode: String,
    /// Contract ABI as raw JSON
    pub abi: Value,
}

impl ContractArtifact {
    /// Load an artifact pair from the artifacts directory
    pub fn load(artifacts_dir: &Path, name: &str) -> Result<Self> {
        let bin_path = artifacts_dir.join(format!("{}.bin", name));
        let abi_path = artifacts_dir.join(format!("{}.abi.json", name));

        let bytecode = fs::read_to_string(&bin_path)
            .map_err(|e| {
                DeployError::ArtifactError(format!("cannot read {:?}: {}", bin_path, e))
            })?
            .trim()
            .trim_start_matches("0x")
            .to_string();
        if bytecode.is_empty() {
            return Err(DeployError::ArtifactError(format!(
                "empty bytecode for contract {}",
                name
            )));
        }
        if bytecode.len() % 2 != 0 || !bytecode.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DeployError::ArtifactError(format!(
                "bytecode for contract {} is not valid hex",
                name
            )));
        }

        let abi_text = fs::read_to_string(&abi_path).map_err(|e| {
            DeployError::ArtifactError(format!("cannot read {:?}: {}", abi_path, e))
        })?;
        let abi: Value = serde_json::from_str(&abi_text).map_err(|e| {
            DeployError::ArtifactError(format!("invalid ABI JSON for {}: {}", name, e))
        })?;

        Ok(Self {
            name: name.to_string(),
            bytecode,
            abi,
        })
    }

    /// Creation payload with constructor arguments appended, 0x-prefixed
    pub fn creation_data(&self, encoded_constructor_args: &str) -> String {
        format!("0x{}{}", self.bytecode, encoded_constructor_args)
    }
}
