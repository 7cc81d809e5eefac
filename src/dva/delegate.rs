// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-191 signatures over transfer ids, for relayed approvals.

use alloy::{
    primitives::{Address, Signature},
    signers::{local::PrivateKeySigner, SignerSync},
};

use super::types::{DelegateSignature, TransferId};
use crate::error::{SdkError, SdkResult};

/// Sign `transfer_id` as `"\x19Ethereum Signed Message:\n32" ‖ id`.
pub fn sign_transfer_id(
    transfer_id: TransferId,
    signer: &PrivateKeySigner,
) -> SdkResult<DelegateSignature> {
    let signature = signer
        .sign_message_sync(transfer_id.0.as_slice())
        .map_err(|e| SdkError::InvalidSignature {
            transfer_id,
            reason: format!("signing failed: {e}"),
        })?;
    Ok(DelegateSignature {
        signer: signer.address(),
        signature: signature.as_bytes().to_vec().into(),
    })
}

/// Recover the address that signed `transfer_id`.
pub fn recover_signer(transfer_id: TransferId, signature: &[u8]) -> SdkResult<Address> {
    let signature = Signature::try_from(signature).map_err(|e| SdkError::InvalidSignature {
        transfer_id,
        reason: format!("malformed signature: {e}"),
    })?;
    signature
        .recover_address_from_msg(transfer_id.0.as_slice())
        .map_err(|e| SdkError::InvalidSignature {
            transfer_id,
            reason: format!("unrecoverable signature: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    fn signer() -> PrivateKeySigner {
        PrivateKeySigner::from_bytes(&B256::with_last_byte(7)).unwrap()
    }

    #[test]
    fn signature_recovers_to_signer() {
        let signer = signer();
        let id = TransferId(B256::repeat_byte(9));
        let signed = sign_transfer_id(id, &signer).unwrap();
        assert_eq!(signed.signer, signer.address());
        assert_eq!(signed.signature.len(), 65);
        assert_eq!(recover_signer(id, &signed.signature).unwrap(), signer.address());
    }

    #[test]
    fn signature_is_bound_to_the_transfer() {
        let signer = signer();
        let signed = sign_transfer_id(TransferId(B256::repeat_byte(9)), &signer).unwrap();
        let other = TransferId(B256::repeat_byte(8));
        assert_ne!(recover_signer(other, &signed.signature).unwrap(), signer.address());
    }

    #[test]
    fn truncated_signature_is_invalid() {
        let id = TransferId(B256::ZERO);
        assert!(matches!(
            recover_signer(id, &[0u8; 10]),
            Err(SdkError::InvalidSignature { .. })
        ));
    }
}
