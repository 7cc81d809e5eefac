// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ctrex SDK - operator toolkit for confidential T-REX tokens
//!
//! Drives DVA (delegated verification agent) transfer managers: deploying
//! them, configuring approval criteria, and taking transfers through
//! initiation, approval, delegated approval and cancellation.
//!
//! ## Modules
//!
//! - `blockchain` - providers, contract bindings and the confidential gateway
//! - `chain_config` - per-network context (provider, wallets, history)
//! - `cli` - the `ctrex` command line
//! - `dva` - transfer manager orchestration and backends
//! - `storage` - deployment history on disk
//! - `wallet` - mnemonic wallets and alias resolution

pub mod blockchain;
pub mod chain_config;
pub mod cli;
pub mod config;
pub mod dva;
pub mod error;
pub mod logging;
pub mod storage;
pub mod wallet;

pub use chain_config::{ChainConfig, ChainParams, WalletParams};
pub use error::{SdkError, SdkResult};
