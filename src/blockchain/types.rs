// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network definitions and resolution of the `--network` selection.

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Built-in network defaults.
#[derive(Debug, Clone)]
pub struct KnownNetwork {
    /// Network name as typed on the command line
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: Option<&'static str>,
}

/// Local development node (Hardhat / Anvil).
pub const LOCALHOST: KnownNetwork = KnownNetwork {
    name: "localhost",
    chain_id: 31337,
    rpc_url: "http://127.0.0.1:8545",
    explorer_url: None,
};

/// Ethereum Sepolia testnet.
pub const SEPOLIA: KnownNetwork = KnownNetwork {
    name: "sepolia",
    chain_id: 11_155_111,
    rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
    explorer_url: Some("https://sepolia.etherscan.io"),
};

pub const KNOWN_NETWORKS: &[KnownNetwork] = &[LOCALHOST, SEPOLIA];

/// Connection parameters for the selected network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl From<&KnownNetwork> for NetworkConfig {
    fn from(known: &KnownNetwork) -> Self {
        Self {
            name: known.name.to_string(),
            chain_id: known.chain_id,
            rpc_url: known.rpc_url.to_string(),
            explorer_url: known.explorer_url.map(str::to_string),
        }
    }
}

impl NetworkConfig {
    /// Resolve a network by name, applying overrides.
    ///
    /// Known names fill in defaults; a custom name needs both an RPC URL and
    /// a chain id.
    pub fn resolve(
        name: &str,
        rpc_url: Option<&str>,
        chain_id: Option<u64>,
    ) -> SdkResult<Self> {
        let key = name.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(SdkError::validation("network name must not be empty"));
        }

        let mut config = match KNOWN_NETWORKS.iter().find(|n| n.name == key) {
            Some(known) => NetworkConfig::from(known),
            None => {
                let (Some(rpc_url), Some(chain_id)) = (rpc_url, chain_id) else {
                    return Err(SdkError::validation(format!(
                        "unknown network `{key}`: custom networks need --rpc-url and --chain-id"
                    )));
                };
                NetworkConfig {
                    name: key,
                    chain_id,
                    rpc_url: rpc_url.to_string(),
                    explorer_url: None,
                }
            }
        };

        if let Some(url) = rpc_url {
            config.rpc_url = url.to_string();
        }
        if let Some(id) = chain_id {
            config.chain_id = id;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_network_uses_defaults() {
        let config = NetworkConfig::resolve("Sepolia", None, None).unwrap();
        assert_eq!(config.name, "sepolia");
        assert_eq!(config.chain_id, 11_155_111);
        assert_eq!(config.rpc_url, SEPOLIA.rpc_url);
        assert_eq!(
            config.explorer_url.as_deref(),
            Some("https://sepolia.etherscan.io")
        );
    }

    #[test]
    fn overrides_apply_to_known_network() {
        let config =
            NetworkConfig::resolve("localhost", Some("http://10.0.0.2:8545"), None).unwrap();
        assert_eq!(config.rpc_url, "http://10.0.0.2:8545");
        assert_eq!(config.chain_id, 31337);
        assert!(config.explorer_url.is_none());
    }

    #[test]
    fn custom_network_requires_rpc_and_chain_id() {
        let err = NetworkConfig::resolve("devnet", Some("http://x:1"), None).unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));

        let config = NetworkConfig::resolve("devnet", Some("http://x:1"), Some(9000)).unwrap();
        assert_eq!(config.chain_id, 9000);
    }
}
