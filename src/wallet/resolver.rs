// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deterministic wallet registry.
//!
//! Wallets are derived once from a BIP-39 mnemonic along
//! `m/44'/60'/0'/0/{index}` and never change for the lifetime of the
//! process. Aliases are human-readable names bound to indices.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use alloy::{
    primitives::Address,
    signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
};

use super::spec::WalletSpec;
use crate::blockchain::signing::{signer_from_hex, signer_from_key_file};
use crate::config::DEFAULT_ALIASES;
use crate::error::{SdkError, SdkResult};

// =============================================================================
// Alias table
// =============================================================================

/// Index → aliases, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<u32, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table (`admin`, `token-agent`, `alice`, ...).
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (index, names) in DEFAULT_ALIASES {
            for name in *names {
                table.push(*index, name);
            }
        }
        table
    }

    pub fn push(&mut self, index: u32, name: &str) {
        self.entries
            .entry(index)
            .or_default()
            .push(name.trim().to_lowercase());
    }

    /// Parse `0=admin,deployer;3=bob`.
    pub fn parse(raw: &str) -> SdkResult<Self> {
        let mut table = Self::new();
        for group in raw.split(';').map(str::trim).filter(|g| !g.is_empty()) {
            let (index, names) = group.split_once('=').ok_or_else(|| {
                SdkError::validation(format!("alias group `{group}` is not `index=name,...`"))
            })?;
            let index: u32 = index.trim().parse().map_err(|_| {
                SdkError::validation(format!("alias group `{group}` has a bad index"))
            })?;
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                table.push(index, name);
            }
        }
        Ok(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.entries.iter().map(|(i, names)| (*i, names.as_slice()))
    }
}

// =============================================================================
// Wallets
// =============================================================================

/// A derived wallet.
#[derive(Clone)]
pub struct Wallet {
    pub index: u32,
    pub aliases: Vec<String>,
    pub address: Address,
    signer: PrivateKeySigner,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("index", &self.index)
            .field("aliases", &self.aliases)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Result of resolving a spec without signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub index: Option<u32>,
    pub aliases: Vec<String>,
}

/// A wallet that can sign.
#[derive(Clone)]
pub struct SigningWallet {
    pub address: Address,
    pub index: Option<u32>,
    pub signer: PrivateKeySigner,
}

impl fmt::Debug for SigningWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningWallet")
            .field("address", &self.address)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl From<&Wallet> for SigningWallet {
    fn from(wallet: &Wallet) -> Self {
        Self {
            address: wallet.address,
            index: Some(wallet.index),
            signer: wallet.signer.clone(),
        }
    }
}

impl From<PrivateKeySigner> for SigningWallet {
    fn from(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            index: None,
            signer,
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

#[derive(Debug, Clone)]
pub struct WalletResolver {
    wallets: Vec<Wallet>,
    by_alias: HashMap<String, u32>,
    by_address: HashMap<Address, u32>,
}

impl WalletResolver {
    /// Derive `count` wallets from `phrase` and bind `aliases`.
    ///
    /// Aliases bound to an index past `count` are dropped. A name bound to
    /// two indices is rejected.
    pub fn from_mnemonic(phrase: &str, count: u32, aliases: &AliasTable) -> SdkResult<Self> {
        let mut wallets = Vec::with_capacity(count as usize);
        for index in 0..count {
            let signer = derive(phrase, index)?;
            wallets.push(Wallet {
                index,
                aliases: Vec::new(),
                address: signer.address(),
                signer,
            });
        }

        let mut by_alias = HashMap::new();
        for (index, names) in aliases.iter() {
            let Some(wallet) = wallets.get_mut(index as usize) else {
                tracing::debug!(index, count, ?names, "Ignoring aliases past the wallet count");
                continue;
            };
            for name in names {
                if let Some(previous) = by_alias.insert(name.clone(), index) {
                    return Err(SdkError::validation(format!(
                        "alias `{name}` is bound to both wallet {previous} and wallet {index}"
                    )));
                }
                if !wallet.aliases.contains(name) {
                    wallet.aliases.push(name.clone());
                }
            }
        }

        let by_address = wallets.iter().map(|w| (w.address, w.index)).collect();

        tracing::debug!(count, aliases = by_alias.len(), "Derived wallets");
        Ok(Self {
            wallets,
            by_alias,
            by_address,
        })
    }

    pub fn count(&self) -> u32 {
        self.wallets.len() as u32
    }

    pub fn wallets(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.iter()
    }

    /// Aliases of `index` in insertion order, empty if none or out of range.
    pub fn names_of(&self, index: u32) -> &[String] {
        self.wallets
            .get(index as usize)
            .map(|w| w.aliases.as_slice())
            .unwrap_or(&[])
    }

    pub fn wallet_for_address(&self, address: Address) -> Option<&Wallet> {
        self.by_address
            .get(&address)
            .and_then(|i| self.wallets.get(*i as usize))
    }

    fn by_index(&self, index: i64) -> SdkResult<&Wallet> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.wallets.get(i))
            .ok_or(SdkError::OutOfRange {
                index,
                count: self.count(),
            })
    }

    fn by_alias(&self, name: &str) -> SdkResult<&Wallet> {
        let key = name.trim().to_lowercase();
        self.by_alias
            .get(&key)
            .and_then(|i| self.wallets.get(*i as usize))
            .ok_or(SdkError::UnknownAlias(key))
    }

    fn account_for(&self, address: Address) -> Account {
        match self.wallet_for_address(address) {
            Some(wallet) => Account {
                address,
                index: Some(wallet.index),
                aliases: wallet.aliases.clone(),
            },
            None => Account {
                address,
                index: None,
                aliases: Vec::new(),
            },
        }
    }

    /// Resolve to an address, without requiring a key.
    pub fn resolve(&self, spec: &WalletSpec) -> SdkResult<Account> {
        match spec {
            WalletSpec::Address(address) => Ok(self.account_for(*address)),
            WalletSpec::Index(index) => Ok(self.account_for(self.by_index(*index)?.address)),
            WalletSpec::Alias(name) => Ok(self.account_for(self.by_alias(name)?.address)),
            WalletSpec::PrivateKey(_) | WalletSpec::KeyFile(_) => {
                Ok(self.account_for(self.resolve_signing(spec)?.address))
            }
            WalletSpec::AutoOwnerOf(contract) => Err(SdkError::validation(format!(
                "auto:{contract} needs a chain connection to resolve"
            ))),
        }
    }

    /// Resolve to a wallet that can sign.
    pub fn resolve_signing(&self, spec: &WalletSpec) -> SdkResult<SigningWallet> {
        match spec {
            WalletSpec::Index(index) => Ok(self.by_index(*index)?.into()),
            WalletSpec::Alias(name) => Ok(self.by_alias(name)?.into()),
            WalletSpec::Address(address) => self
                .wallet_for_address(*address)
                .map(SigningWallet::from)
                .ok_or_else(|| SdkError::NotOwner {
                    address: *address,
                    reason: "no derived wallet has this address".into(),
                }),
            WalletSpec::PrivateKey(hex) => Ok(self.adopt(signer_from_hex(hex)?)),
            WalletSpec::KeyFile(path) => Ok(self.adopt(signer_from_key_file(path)?)),
            WalletSpec::AutoOwnerOf(contract) => Err(SdkError::validation(format!(
                "auto:{contract} needs a chain connection to resolve"
            ))),
        }
    }

    /// Wrap an external key, keeping the index if it happens to be derived.
    fn adopt(&self, signer: PrivateKeySigner) -> SigningWallet {
        let mut wallet = SigningWallet::from(signer);
        wallet.index = self.wallet_for_address(wallet.address).map(|w| w.index);
        wallet
    }
}

fn derive(phrase: &str, index: u32) -> SdkResult<PrivateKeySigner> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .index(index)
        .and_then(|builder| builder.build())
        .map_err(|e| SdkError::InvalidKey(format!("cannot derive wallet {index}: {e}")))
}
