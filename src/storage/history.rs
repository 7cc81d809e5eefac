// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deployment history: contract addresses created by earlier commands.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "claimIssuers": ["0x…"],
//!   "factories": { "dva": "0x…", "trex": "0x…" },
//!   "tokens": { "<salt>": "0x…" },
//!   "transferManagers": { "<token>:<identity>": "0x…" },
//!   "updatedAt": "2026-01-01T00:00:00Z"
//! }
//! ```
//!
//! The whole document is rewritten on every mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::json_store::{JsonFile, StorageResult};

/// Category of a recorded deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentKind {
    /// Ordered list; the key is the decimal position on lookup.
    ClaimIssuer,
    /// Keyed by purpose (`trex`, `dva`, ...).
    Factory,
    /// Keyed by deployment salt.
    Token,
    /// Keyed by `{token}:{identity}`.
    TransferManager,
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentKind::ClaimIssuer => write!(f, "claim-issuer"),
            DeploymentKind::Factory => write!(f, "factory"),
            DeploymentKind::Token => write!(f, "token"),
            DeploymentKind::TransferManager => write!(f, "transfer-manager"),
        }
    }
}

/// Persisted ledger of deployed contract addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentHistory {
    #[serde(default)]
    pub claim_issuers: Vec<Address>,
    #[serde(default)]
    pub factories: BTreeMap<String, Address>,
    #[serde(default)]
    pub tokens: BTreeMap<String, Address>,
    #[serde(default)]
    pub transfer_managers: BTreeMap<String, Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeploymentHistory {
    pub fn is_empty(&self) -> bool {
        self.claim_issuers.is_empty()
            && self.factories.is_empty()
            && self.tokens.is_empty()
            && self.transfer_managers.is_empty()
    }

    /// Record an address. Returns `false` when the entry already held it.
    pub fn record(&mut self, kind: DeploymentKind, key: &str, address: Address) -> bool {
        let changed = match kind {
            DeploymentKind::ClaimIssuer => {
                if self.claim_issuers.contains(&address) {
                    false
                } else {
                    self.claim_issuers.push(address);
                    true
                }
            }
            DeploymentKind::Factory => self.factories.insert(key.to_string(), address) != Some(address),
            DeploymentKind::Token => self.tokens.insert(key.to_string(), address) != Some(address),
            DeploymentKind::TransferManager => {
                self.transfer_managers.insert(key.to_string(), address) != Some(address)
            }
        };
        if changed {
            self.updated_at = Some(Utc::now());
        }
        changed
    }

    pub fn lookup(&self, kind: DeploymentKind, key: &str) -> Option<Address> {
        match kind {
            DeploymentKind::ClaimIssuer => key
                .parse::<usize>()
                .ok()
                .and_then(|i| self.claim_issuers.get(i).copied()),
            DeploymentKind::Factory => self.factories.get(key).copied(),
            DeploymentKind::Token => self.tokens.get(key).copied(),
            DeploymentKind::TransferManager => self.transfer_managers.get(key).copied(),
        }
    }
}

/// History bound to its backing file; every mutation is flushed.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    file: JsonFile,
    history: DeploymentHistory,
}

impl HistoryStore {
    /// Open the history at `path`, creating an empty file if it is absent.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let file = JsonFile::new(path);
        let history = match file.read::<DeploymentHistory>()? {
            Some(history) => history,
            None => {
                let history = DeploymentHistory::default();
                file.write(&history)?;
                tracing::debug!(path = %file.path().display(), "Created empty deployment history");
                history
            }
        };
        Ok(Self { file, history })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn history(&self) -> &DeploymentHistory {
        &self.history
    }

    /// Last-write-wins per `(kind, key)`; persisted before returning.
    pub fn record(&mut self, kind: DeploymentKind, key: &str, address: Address) -> StorageResult<()> {
        let mut next = self.history.clone();
        if !next.record(kind, key, address) {
            return Ok(());
        }
        self.file.write(&next)?;
        self.history = next;
        tracing::info!(%kind, key, %address, "Recorded deployment");
        Ok(())
    }

    pub fn lookup(&self, kind: DeploymentKind, key: &str) -> Option<Address> {
        self.history.lookup(kind, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use std::fs;

    const A: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
    const B: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

    #[test]
    fn missing_file_creates_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localhost").join("history.json");

        let store = HistoryStore::open(&path).unwrap();
        assert!(store.history().is_empty());
        assert!(path.exists());
    }

    #[test]
    fn record_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path).unwrap();
        store.record(DeploymentKind::Token, "salt-1", A).unwrap();
        store.record(DeploymentKind::Factory, "dva", B).unwrap();
        store.record(DeploymentKind::ClaimIssuer, "", A).unwrap();
        drop(store);

        let reopened = HistoryStore::open(&path).unwrap();
        assert_eq!(reopened.lookup(DeploymentKind::Token, "salt-1"), Some(A));
        assert_eq!(reopened.lookup(DeploymentKind::Factory, "dva"), Some(B));
        assert_eq!(reopened.lookup(DeploymentKind::ClaimIssuer, "0"), Some(A));
        assert_eq!(reopened.lookup(DeploymentKind::ClaimIssuer, "1"), None);
    }

    #[test]
    fn record_is_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("h.json")).unwrap();

        store.record(DeploymentKind::Token, "salt", A).unwrap();
        store.record(DeploymentKind::Token, "salt", B).unwrap();
        assert_eq!(store.lookup(DeploymentKind::Token, "salt"), Some(B));
    }

    #[test]
    fn claim_issuers_stay_ordered_and_unique() {
        let mut history = DeploymentHistory::default();
        assert!(history.record(DeploymentKind::ClaimIssuer, "", B));
        assert!(history.record(DeploymentKind::ClaimIssuer, "", A));
        assert!(!history.record(DeploymentKind::ClaimIssuer, "", B));
        assert_eq!(history.claim_issuers, vec![B, A]);
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[1, 2").unwrap();

        let err = HistoryStore::open(&path).unwrap_err();
        assert!(matches!(err, super::super::StorageError::Corrupt { .. }));
    }

    #[test]
    fn serialized_keys_are_camel_case_and_sorted() {
        let mut history = DeploymentHistory::default();
        history.record(DeploymentKind::Token, "zeta", A);
        history.record(DeploymentKind::Token, "alpha", B);
        history.updated_at = None;

        let json = serde_json::to_string(&history).unwrap();
        assert!(json.starts_with(r#"{"claimIssuers":[],"factories":{},"tokens":{"alpha""#));
        assert!(json.contains("transferManagers"));
        assert!(!json.contains("updatedAt"));
    }
}
