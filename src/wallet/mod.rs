// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet naming and resolution.

pub mod resolver;
pub mod spec;

pub use resolver::{Account, AliasTable, SigningWallet, Wallet, WalletResolver};
pub use spec::WalletSpec;
