// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Waiting for transaction confirmation and extracting revert reasons.

use alloy::{
    network::Ethereum,
    primitives::{Bytes, TxHash},
    providers::PendingTransactionBuilder,
    rpc::types::TransactionReceipt,
};

use crate::config::TX_TIMEOUT;
use crate::error::{SdkError, SdkResult};

/// Transaction receipt summary after confirmation.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub receipt: TransactionReceipt,
}

/// Wait for `confirms` confirmations of a submitted transaction.
///
/// A mined-but-reverted transaction is reported as `ContractError`.
pub async fn confirm(
    pending: PendingTransactionBuilder<Ethereum>,
    confirms: u64,
    what: &str,
) -> SdkResult<TxReceipt> {
    let tx_hash = *pending.tx_hash();
    tracing::debug!(%tx_hash, confirms, what, "Waiting for confirmation");

    let receipt = pending
        .with_required_confirmations(confirms.max(1))
        .with_timeout(Some(TX_TIMEOUT))
        .get_receipt()
        .await
        .map_err(|e| SdkError::network(format!("{what}: waiting for {tx_hash} failed: {e}")))?;

    if !receipt.status() {
        return Err(SdkError::Contract(format!(
            "{what}: transaction {tx_hash} reverted"
        )));
    }

    let block_number = receipt.block_number.unwrap_or(0);
    let gas_used = receipt.gas_used as u64;
    tracing::info!(%tx_hash, block_number, gas_used, what, "Transaction confirmed");

    Ok(TxReceipt {
        tx_hash,
        receipt,
    })
}

/// Raw revert data carried by a contract error, if any.
pub fn revert_data(err: &alloy::contract::Error) -> Option<Bytes> {
    err.as_revert_data()
}

/// Best-effort human-readable revert reason (`Error(string)` / `Panic(uint)`).
pub fn revert_reason(err: &alloy::contract::Error) -> Option<String> {
    revert_data(err).and_then(|data| alloy::sol_types::decode_revert_reason(&data))
}

/// Whether an error came from the transport rather than from the contract.
pub fn is_transport_failure(err: &alloy::contract::Error) -> bool {
    matches!(err, alloy::contract::Error::TransportError(_)) && err.as_revert_data().is_none()
}
