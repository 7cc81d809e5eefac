// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the SDK and CLI. Every CLI flag can also be supplied through
//! the environment variable listed here.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CTREX_NETWORK` | Network name (`localhost`, `sepolia`, or custom) | `localhost` |
//! | `CTREX_RPC_URL` | RPC endpoint, overrides the network default | network default |
//! | `CTREX_CHAIN_ID` | Expected chain id, overrides the network default | network default |
//! | `CTREX_MNEMONIC` | BIP-39 mnemonic wallets are derived from | development mnemonic |
//! | `CTREX_WALLET_COUNT` | Number of derived wallets | `10` |
//! | `CTREX_WALLET_ALIASES` | Alias table, e.g. `0=admin,deployer;3=bob` | built-in table |
//! | `CTREX_DATA_DIR` | Root directory for deployment history | `.ctrex` |
//! | `CTREX_HISTORY` | Explicit history file path | `{data_dir}/{network}/history.json` |
//! | `CTREX_CONFIRMS` | Confirmations to wait for per transaction | `1` |
//! | `CTREX_GATEWAY_URL` | Confidential gateway (relayer) base URL | `http://127.0.0.1:3000` |
//! | `CTREX_DVA_FACTORY` | DVA manager factory address | from history |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

pub const NETWORK_ENV: &str = "CTREX_NETWORK";
pub const RPC_URL_ENV: &str = "CTREX_RPC_URL";
pub const CHAIN_ID_ENV: &str = "CTREX_CHAIN_ID";
pub const MNEMONIC_ENV: &str = "CTREX_MNEMONIC";
pub const WALLET_COUNT_ENV: &str = "CTREX_WALLET_COUNT";
pub const WALLET_ALIASES_ENV: &str = "CTREX_WALLET_ALIASES";
pub const DATA_DIR_ENV: &str = "CTREX_DATA_DIR";
pub const HISTORY_ENV: &str = "CTREX_HISTORY";
pub const CONFIRMS_ENV: &str = "CTREX_CONFIRMS";
pub const GATEWAY_URL_ENV: &str = "CTREX_GATEWAY_URL";
pub const DVA_FACTORY_ENV: &str = "CTREX_DVA_FACTORY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Well-known development mnemonic (Hardhat/Anvil default accounts).
///
/// Only meant for local networks. Public networks must set
/// `CTREX_MNEMONIC`.
pub const DEFAULT_MNEMONIC: &str = "test test test test test test test test test test test junk";

pub const DEFAULT_NETWORK: &str = "localhost";
pub const DEFAULT_WALLET_COUNT: u32 = 10;
pub const DEFAULT_DATA_DIR: &str = ".ctrex";
pub const DEFAULT_CONFIRMS: u64 = 1;
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:3000";

/// Upper bound on waiting for a transaction receipt.
pub const TX_TIMEOUT: Duration = Duration::from_secs(120);

/// History `factories` key the DVA manager factory is recorded under.
pub const DVA_FACTORY_PURPOSE: &str = "dva";

/// Built-in alias table (index, aliases in insertion order).
pub const DEFAULT_ALIASES: &[(u32, &[&str])] = &[
    (0, &["admin", "deployer", "owner"]),
    (1, &["token-agent", "agent"]),
    (2, &["alice"]),
    (3, &["bob"]),
    (4, &["charlie"]),
    (5, &["david"]),
    (6, &["eve"]),
    (7, &["claim-issuer"]),
];
