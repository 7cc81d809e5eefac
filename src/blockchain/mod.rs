// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM integration: providers, contract bindings, key parsing, transaction
//! confirmation and the confidential gateway client.

pub mod bindings;
pub mod client;
pub mod gateway;
pub mod signing;
pub mod transactions;
pub mod types;

pub use client::{connect, connect_signing, ensure_chain_id};
pub use gateway::{ConfidentialGateway, EncryptedInput, GatewayError, HttpGateway};
pub use types::*;
