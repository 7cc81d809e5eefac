// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer identifier derivation.

use alloy::primitives::{keccak256, Address, U256};

use super::types::{AmountHandle, TransferId};

/// `keccak256(manager ‖ nonce ‖ sender ‖ recipient ‖ handle)`, the packed
/// encoding the manager contract hashes. The nonce is 32 bytes big-endian.
pub fn calculate_transfer_id(
    manager: Address,
    nonce: U256,
    sender: Address,
    recipient: Address,
    handle: AmountHandle,
) -> TransferId {
    let mut packed = [0u8; 20 + 32 + 20 + 20 + 32];
    packed[..20].copy_from_slice(manager.as_slice());
    packed[20..52].copy_from_slice(&nonce.to_be_bytes::<32>());
    packed[52..72].copy_from_slice(sender.as_slice());
    packed[72..92].copy_from_slice(recipient.as_slice());
    packed[92..].copy_from_slice(handle.0.as_slice());
    TransferId(keccak256(packed))
}
