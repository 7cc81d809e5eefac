// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RPC provider construction.

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};

use crate::error::{SdkError, SdkResult};

/// Parse an RPC URL, reporting a malformed one as a network error.
pub fn parse_rpc_url(rpc_url: &str) -> SdkResult<url::Url> {
    rpc_url
        .parse()
        .map_err(|e: url::ParseError| SdkError::network(format!("invalid RPC URL `{rpc_url}`: {e}")))
}

/// Read-only HTTP provider. Does not touch the network.
pub fn connect(rpc_url: &str) -> SdkResult<DynProvider> {
    let url = parse_rpc_url(rpc_url)?;
    Ok(ProviderBuilder::new().connect_http(url).erased())
}

/// HTTP provider that signs and sends with `signer`.
pub fn connect_signing(rpc_url: &str, signer: PrivateKeySigner) -> SdkResult<DynProvider> {
    let url = parse_rpc_url(rpc_url)?;
    let wallet = EthereumWallet::from(signer);
    Ok(ProviderBuilder::new().wallet(wallet).connect_http(url).erased())
}

/// Fail with `NetworkError` unless the endpoint answers with `expected`.
pub async fn ensure_chain_id(provider: &DynProvider, expected: u64) -> SdkResult<()> {
    let actual = provider
        .get_chain_id()
        .await
        .map_err(|e| SdkError::network(format!("RPC unreachable: {e}")))?;

    if actual != expected {
        return Err(SdkError::network(format!(
            "wrong chain id: endpoint reports {actual}, expected {expected}"
        )));
    }
    Ok(())
}
