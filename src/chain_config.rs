// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-network context shared by every command.
//!
//! Bundles the network parameters, the RPC provider, the wallet resolver and
//! the deployment history of one network.

use std::path::Path;

use alloy::{primitives::Address, providers::DynProvider};
use serde_json::json;

use crate::blockchain::{bindings::IOwnable, connect, ensure_chain_id, NetworkConfig};
use crate::config::{DEFAULT_CONFIRMS, DEFAULT_MNEMONIC, DEFAULT_WALLET_COUNT};
use crate::error::{SdkError, SdkResult};
use crate::storage::{DeploymentKind, HistoryStore};
use crate::wallet::{AliasTable, SigningWallet, WalletResolver, WalletSpec};

/// Where wallets come from.
#[derive(Debug, Clone)]
pub struct WalletParams {
    pub mnemonic: String,
    pub count: u32,
    pub aliases: AliasTable,
}

impl Default for WalletParams {
    fn default() -> Self {
        Self {
            mnemonic: DEFAULT_MNEMONIC.to_string(),
            count: DEFAULT_WALLET_COUNT,
            aliases: AliasTable::builtin(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainParams {
    pub network: NetworkConfig,
    pub confirms: u64,
    pub wallets: WalletParams,
}

impl ChainParams {
    pub fn new(network: NetworkConfig) -> Self {
        Self {
            network,
            confirms: DEFAULT_CONFIRMS,
            wallets: WalletParams::default(),
        }
    }
}

pub struct ChainConfig {
    params: ChainParams,
    provider: DynProvider,
    resolver: WalletResolver,
    history: HistoryStore,
}

impl ChainConfig {
    /// Build the context without touching the network.
    ///
    /// A missing history file is created empty; an unreadable one is
    /// reported as corrupt.
    pub fn load(params: ChainParams, history_path: &Path) -> SdkResult<Self> {
        let provider = connect(&params.network.rpc_url)?;
        let resolver = WalletResolver::from_mnemonic(
            &params.wallets.mnemonic,
            params.wallets.count,
            &params.wallets.aliases,
        )?;
        let history = HistoryStore::open(history_path)?;

        tracing::debug!(
            network = %params.network.name,
            chain_id = params.network.chain_id,
            history = %history.path().display(),
            "Loaded chain config"
        );
        Ok(Self {
            params,
            provider,
            resolver,
            history,
        })
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.params.network
    }

    pub fn confirms(&self) -> u64 {
        self.params.confirms
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn resolver(&self) -> &WalletResolver {
        &self.resolver
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    /// Fail unless the RPC endpoint is reachable and on the expected chain.
    pub async fn ensure_chain_id(&self) -> SdkResult<()> {
        ensure_chain_id(&self.provider, self.params.network.chain_id).await
    }

    pub async fn owner_of(&self, contract: Address) -> SdkResult<Address> {
        IOwnable::new(contract, &self.provider)
            .owner()
            .call()
            .await
            .map_err(|e| SdkError::network(format!("owner() of {contract}: {e}")))
    }

    /// The derived wallet that owns `contract`.
    pub async fn get_owner_wallet(&self, contract: Address) -> SdkResult<SigningWallet> {
        let owner = self.owner_of(contract).await?;
        self.resolve_owner(contract, owner)
    }

    pub fn resolve_owner(&self, contract: Address, owner: Address) -> SdkResult<SigningWallet> {
        self.resolver
            .wallet_for_address(owner)
            .map(SigningWallet::from)
            .ok_or(SdkError::UnresolvableOwner { contract, owner })
    }

    pub async fn signing_wallet(&self, spec: &WalletSpec) -> SdkResult<SigningWallet> {
        match spec {
            WalletSpec::AutoOwnerOf(contract) => self.get_owner_wallet(*contract).await,
            other => self.resolver.resolve_signing(other),
        }
    }

    pub fn record_deployment(
        &mut self,
        kind: DeploymentKind,
        key: &str,
        address: Address,
    ) -> SdkResult<()> {
        Ok(self.history.record(kind, key, address)?)
    }

    pub fn lookup_deployment(&self, kind: DeploymentKind, key: &str) -> Option<Address> {
        self.history.lookup(kind, key)
    }

    /// Snapshot of the context, as printed by `ctrex history`.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "network": self.params.network.name,
            "chainId": self.params.network.chain_id,
            "rpcUrl": self.params.network.rpc_url,
            "explorerUrl": self.params.network.explorer_url,
            "confirms": self.params.confirms,
            "historyFile": self.history.path().display().to_string(),
            "history": self.history.history(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::LOCALHOST;
    use alloy::primitives::address;

    const TOKEN: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    fn params() -> ChainParams {
        ChainParams::new(NetworkConfig::from(&LOCALHOST))
    }

    #[test]
    fn load_creates_missing_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localhost").join("history.json");
        let config = ChainConfig::load(params(), &path).unwrap();
        assert!(path.exists());
        assert!(config.history().history().is_empty());
        assert_eq!(config.resolver().count(), DEFAULT_WALLET_COUNT);
    }

    #[test]
    fn recorded_deployments_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut config = ChainConfig::load(params(), &path).unwrap();
        config
            .record_deployment(DeploymentKind::Token, "salt-1", TOKEN)
            .unwrap();
        config
            .record_deployment(DeploymentKind::ClaimIssuer, "", TOKEN)
            .unwrap();
        drop(config);

        let config = ChainConfig::load(params(), &path).unwrap();
        assert_eq!(
            config.lookup_deployment(DeploymentKind::Token, "salt-1"),
            Some(TOKEN)
        );
        assert_eq!(
            config.lookup_deployment(DeploymentKind::ClaimIssuer, "0"),
            Some(TOKEN)
        );
        let snapshot = config.to_json();
        assert_eq!(snapshot["chainId"], 31337);
        assert!(snapshot["explorerUrl"].is_null());
        let recorded: Address = snapshot["history"]["tokens"]["salt-1"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(recorded, TOKEN);
    }

    #[test]
    fn corrupt_history_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ChainConfig::load(params(), &path),
            Err(SdkError::CorruptHistory { path: p, .. }) if p == path
        ));
    }

    #[test]
    fn malformed_rpc_url_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = params();
        params.network.rpc_url = "::nope".into();
        assert!(matches!(
            ChainConfig::load(params, &dir.path().join("h.json")),
            Err(SdkError::Network(_))
        ));
    }

    #[test]
    fn owner_must_be_a_derived_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChainConfig::load(params(), &dir.path().join("h.json")).unwrap();
        let admin = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(config.resolve_owner(TOKEN, admin).unwrap().index, Some(0));
        assert!(matches!(
            config.resolve_owner(TOKEN, TOKEN),
            Err(SdkError::UnresolvableOwner { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_rpc_fails_chain_id_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = params();
        params.network.rpc_url = "http://127.0.0.1:1".into();
        let config = ChainConfig::load(params, &dir.path().join("h.json")).unwrap();
        assert!(matches!(
            config.ensure_chain_id().await,
            Err(SdkError::Network(_))
        ));
    }
}
