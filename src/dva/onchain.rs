// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! [`DvaBackend`] over deployed contracts.
//!
//! Reads go through one shared read-only provider. Every mutating call
//! builds a provider bound to the signing wallet, sends one transaction and
//! waits for the configured number of confirmations. Custom errors of the
//! transfer manager are decoded into the matching [`SdkError`] variant;
//! any other revert is surfaced verbatim.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    providers::DynProvider,
    rpc::types::TransactionReceipt,
    sol_types::{SolEvent, SolInterface},
};

use super::backend::DvaBackend;
use super::types::{
    AmountHandle, Approval, ApproverSlot, Criteria, DelegateSignature, IdentityStatus,
    InitiatedTransfer, ManagerInfo, SlotState, Transfer, TransferId, TransferStatus,
};
use crate::blockchain::bindings::{
    IConfidentialToken, IDVAManagerFactory, IDVATransferManager, IIdentityRegistry,
};
use crate::blockchain::transactions::{
    confirm, is_transport_failure, revert_data, revert_reason, TxReceipt,
};
use crate::blockchain::{connect_signing, ConfidentialGateway, HttpGateway};
use crate::error::{SdkError, SdkResult};
use crate::wallet::SigningWallet;

use IDVATransferManager::IDVATransferManagerErrors as DvaErrors;

pub struct OnchainBackend<G = HttpGateway> {
    rpc_url: String,
    provider: DynProvider,
    gateway: G,
    confirms: u64,
    factory: Option<Address>,
}

impl<G: ConfidentialGateway> OnchainBackend<G> {
    /// # Arguments
    ///
    /// * `rpc_url` - endpoint signing providers are built against
    /// * `provider` - shared read-only provider for the same endpoint
    /// * `gateway` - encrypts amounts and decrypts balances
    /// * `confirms` - confirmations awaited per transaction
    /// * `factory` - DVA manager factory, needed only to deploy managers
    pub fn new(
        rpc_url: impl Into<String>,
        provider: DynProvider,
        gateway: G,
        confirms: u64,
        factory: Option<Address>,
    ) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            provider,
            gateway,
            confirms,
            factory,
        }
    }

    fn signing(&self, wallet: &SigningWallet) -> SdkResult<DynProvider> {
        connect_signing(&self.rpc_url, wallet.signer.clone())
    }

    async fn registry_of(&self, token: Address) -> SdkResult<Address> {
        IConfidentialToken::new(token, &self.provider)
            .identityRegistry()
            .call()
            .await
            .map_err(|e| decode_error(&e, "identityRegistry", ErrorContext::default()))
    }

    async fn read_transfer(
        &self,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Transfer> {
        self.transfer(manager, transfer_id)
            .await?
            .ok_or_else(|| SdkError::not_found(format!("transfer {transfer_id}")))
    }
}

impl<G: ConfidentialGateway> DvaBackend for OnchainBackend<G> {
    async fn is_token_agent(&self, token: Address, account: Address) -> SdkResult<bool> {
        IConfidentialToken::new(token, &self.provider)
            .isAgent(account)
            .call()
            .await
            .map_err(|e| decode_error(&e, "isAgent", ErrorContext::default()))
    }

    async fn identity_status(&self, token: Address, account: Address) -> SdkResult<IdentityStatus> {
        let registry = IIdentityRegistry::new(self.registry_of(token).await?, &self.provider);
        let registered = registry
            .contains(account)
            .call()
            .await
            .map_err(|e| decode_error(&e, "contains", ErrorContext::default()))?;
        let verified = registry
            .isVerified(account)
            .call()
            .await
            .map_err(|e| decode_error(&e, "isVerified", ErrorContext::default()))?;
        Ok(IdentityStatus {
            registered,
            verified,
        })
    }

    async fn deploy_manager(
        &self,
        caller: &SigningWallet,
        token: Address,
        agent: Address,
    ) -> SdkResult<Address> {
        let factory = self.factory.ok_or_else(|| {
            SdkError::validation("no DVA manager factory configured (use --factory)")
        })?;
        let provider = self.signing(caller)?;
        let pending = IDVAManagerFactory::new(factory, provider)
            .deployTransferManager(token, agent)
            .send()
            .await
            .map_err(|e| decode_error(&e, "deployTransferManager", ErrorContext::default()))?;
        let receipt = confirm(pending, self.confirms, "deployTransferManager").await?;

        find_event::<IDVAManagerFactory::TransferManagerDeployed>(&receipt.receipt)
            .map(|event| event.manager)
            .ok_or_else(|| {
                SdkError::Contract(format!(
                    "deployTransferManager {}: no TransferManagerDeployed event",
                    receipt.tx_hash
                ))
            })
    }

    async fn register_identity(
        &self,
        caller: &SigningWallet,
        token: Address,
        account: Address,
        identity: Address,
        country: u16,
    ) -> SdkResult<()> {
        let registry = self.registry_of(token).await?;
        let provider = self.signing(caller)?;
        let pending = IIdentityRegistry::new(registry, provider)
            .registerIdentity(account, identity, country)
            .send()
            .await
            .map_err(|e| decode_error(&e, "registerIdentity", ErrorContext::default()))?;
        confirm(pending, self.confirms, "registerIdentity").await?;
        Ok(())
    }

    async fn manager_info(&self, manager: Address) -> SdkResult<ManagerInfo> {
        let contract = IDVATransferManager::new(manager, &self.provider);
        let token = contract
            .token()
            .call()
            .await
            .map_err(|e| decode_error(&e, "token", ErrorContext::default()))?;
        let agent = contract
            .agent()
            .call()
            .await
            .map_err(|e| decode_error(&e, "agent", ErrorContext::default()))?;
        Ok(ManagerInfo { token, agent })
    }

    async fn set_approval_criteria(
        &self,
        caller: &SigningWallet,
        manager: Address,
        criteria: &Criteria,
    ) -> SdkResult<()> {
        let provider = self.signing(caller)?;
        let pending = IDVATransferManager::new(manager, provider)
            .setApprovalCriteria(
                criteria.include_recipient,
                criteria.include_agent,
                criteria.sequential,
                criteria.additional_approvers.clone(),
            )
            .send()
            .await
            .map_err(|e| decode_error(&e, "setApprovalCriteria", ErrorContext::default()))?;
        confirm(pending, self.confirms, "setApprovalCriteria").await?;
        Ok(())
    }

    async fn approval_criteria(&self, manager: Address) -> SdkResult<Criteria> {
        let raw = IDVATransferManager::new(manager, &self.provider)
            .getApprovalCriteria()
            .call()
            .await
            .map_err(|e| decode_error(&e, "getApprovalCriteria", ErrorContext::default()))?;
        Ok(Criteria {
            include_recipient: raw.includeRecipientApprover,
            include_agent: raw.includeAgentApprover,
            sequential: raw.sequentialApproval,
            additional_approvers: raw.additionalApprovers,
        })
    }

    async fn next_nonce(&self, manager: Address) -> SdkResult<U256> {
        IDVATransferManager::new(manager, &self.provider)
            .getNextTxNonce()
            .call()
            .await
            .map_err(|e| decode_error(&e, "getNextTxNonce", ErrorContext::default()))
    }

    async fn approve_allowance(
        &self,
        owner: &SigningWallet,
        token: Address,
        spender: Address,
        amount: u64,
    ) -> SdkResult<AmountHandle> {
        let input = self.gateway.encrypt_u64(token, owner.address, amount).await?;
        let provider = self.signing(owner)?;
        let pending = IConfidentialToken::new(token, provider)
            .approve(spender, input.handle, input.input_proof)
            .send()
            .await
            .map_err(|e| decode_error(&e, "approve", ErrorContext::default()))?;
        confirm(pending, self.confirms, "approve").await?;
        Ok(AmountHandle(input.handle))
    }

    async fn initiate_transfer(
        &self,
        sender: &SigningWallet,
        manager: Address,
        recipient: Address,
        amount: u64,
    ) -> SdkResult<InitiatedTransfer> {
        let input = self
            .gateway
            .encrypt_u64(manager, sender.address, amount)
            .await?;
        let provider = self.signing(sender)?;
        let context = ErrorContext {
            amount: Some(amount),
            ..ErrorContext::default()
        };
        let pending = IDVATransferManager::new(manager, provider)
            .initiateTransfer(recipient, input.handle, input.input_proof)
            .send()
            .await
            .map_err(|e| decode_error(&e, "initiateTransfer", context))?;
        let receipt: TxReceipt = confirm(pending, self.confirms, "initiateTransfer").await?;

        let event = find_event::<IDVATransferManager::TransferInitiated>(&receipt.receipt)
            .ok_or_else(|| {
                SdkError::Contract(format!(
                    "initiateTransfer {}: no TransferInitiated event",
                    receipt.tx_hash
                ))
            })?;
        Ok(InitiatedTransfer {
            transfer_id: TransferId(event.transferID),
            amount_handle: AmountHandle(event.amount),
            nonce: event.nonce,
        })
    }

    async fn transfer(
        &self,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Option<Transfer>> {
        let result = IDVATransferManager::new(manager, &self.provider)
            .getTransfer(transfer_id.0)
            .call()
            .await;
        let view = match result {
            Ok(view) => view,
            Err(e) => {
                return match decode_error(&e, "getTransfer", ErrorContext::transfer(transfer_id)) {
                    SdkError::NotFound(_) => Ok(None),
                    other => Err(other),
                }
            }
        };
        if view.transferID == B256::ZERO {
            return Ok(None);
        }
        transfer_from_view(manager, view).map(Some)
    }

    async fn approve_transfer(
        &self,
        approver: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Transfer> {
        let provider = self.signing(approver)?;
        let pending = IDVATransferManager::new(manager, provider)
            .approveTransfer(transfer_id.0)
            .send()
            .await
            .map_err(|e| decode_error(&e, "approveTransfer", ErrorContext::transfer(transfer_id)))?;
        confirm(pending, self.confirms, "approveTransfer").await?;
        self.read_transfer(manager, transfer_id).await
    }

    async fn delegate_approve_transfer(
        &self,
        caller: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
        signatures: &[DelegateSignature],
    ) -> SdkResult<Transfer> {
        let provider = self.signing(caller)?;
        let signatures: Vec<Bytes> = signatures.iter().map(|s| s.signature.clone()).collect();
        let pending = IDVATransferManager::new(manager, provider)
            .delegateApproveTransfer(transfer_id.0, signatures)
            .send()
            .await
            .map_err(|e| {
                decode_error(&e, "delegateApproveTransfer", ErrorContext::transfer(transfer_id))
            })?;
        confirm(pending, self.confirms, "delegateApproveTransfer").await?;
        self.read_transfer(manager, transfer_id).await
    }

    async fn cancel_transfer(
        &self,
        caller: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Transfer> {
        let provider = self.signing(caller)?;
        let pending = IDVATransferManager::new(manager, provider)
            .cancelTransfer(transfer_id.0)
            .send()
            .await
            .map_err(|e| decode_error(&e, "cancelTransfer", ErrorContext::transfer(transfer_id)))?;
        confirm(pending, self.confirms, "cancelTransfer").await?;
        self.read_transfer(manager, transfer_id).await
    }

    async fn balance_of(&self, holder: &SigningWallet, token: Address) -> SdkResult<u64> {
        let handle = IConfidentialToken::new(token, &self.provider)
            .confidentialBalanceOf(holder.address)
            .call()
            .await
            .map_err(|e| decode_error(&e, "confidentialBalanceOf", ErrorContext::default()))?;
        // A never-touched balance has no ciphertext yet.
        if handle == B256::ZERO {
            return Ok(0);
        }
        Ok(self.gateway.decrypt_u64(token, handle, &holder.signer).await?)
    }
}

// =============================================================================
// Decoding
// =============================================================================

fn find_event<E: SolEvent>(receipt: &TransactionReceipt) -> Option<E> {
    receipt
        .inner
        .logs()
        .iter()
        .find_map(|log| log.log_decode::<E>().ok())
        .map(|decoded| decoded.inner.data)
}

fn transfer_from_view(
    manager: Address,
    view: IDVATransferManager::TransferView,
) -> SdkResult<Transfer> {
    let status = TransferStatus::from_u8(view.status)?;
    let mut slots = Vec::with_capacity(view.approvers.len());
    let mut approvals = Vec::new();
    for (index, approver) in view.approvers.into_iter().enumerate() {
        let slot = if approver.anyTokenAgent {
            ApproverSlot::AnyAgent
        } else {
            ApproverSlot::Wallet(approver.wallet)
        };
        // One approver may fill several slots; list it once.
        if approver.approved && !approvals.iter().any(|a: &Approval| a.approver == approver.wallet) {
            approvals.push(Approval {
                approver: approver.wallet,
                slot: index,
                signature: None,
            });
        }
        slots.push(SlotState {
            slot,
            approved: approver.approved,
        });
    }
    Ok(Transfer {
        id: TransferId(view.transferID),
        manager,
        token: view.tokenAddress,
        sender: view.sender,
        recipient: view.recipient,
        amount_handle: AmountHandle(view.amount),
        nonce: view.nonce,
        slots,
        approvals,
        sequential: view.sequentialApproval,
        status,
        version: 0,
    })
}

/// Identifiers a revert does not carry but the error variant needs.
#[derive(Debug, Clone, Copy, Default)]
struct ErrorContext {
    transfer_id: Option<TransferId>,
    amount: Option<u64>,
}

impl ErrorContext {
    fn transfer(transfer_id: TransferId) -> Self {
        Self {
            transfer_id: Some(transfer_id),
            ..Self::default()
        }
    }
}

fn decode_error(err: &alloy::contract::Error, what: &str, context: ErrorContext) -> SdkError {
    if let Some(decoded) = revert_data(err).and_then(|data| DvaErrors::abi_decode(&data).ok()) {
        return map_dva_error(decoded, context);
    }
    if let Some(reason) = revert_reason(err) {
        return SdkError::Contract(format!("{what}: {reason}"));
    }
    if is_transport_failure(err) {
        return SdkError::network(format!("{what}: {err}"));
    }
    SdkError::Contract(format!("{what}: {err}"))
}

fn map_dva_error(decoded: DvaErrors, context: ErrorContext) -> SdkError {
    match decoded {
        DvaErrors::TransferNotFound(e) => {
            SdkError::not_found(format!("transfer {}", TransferId(e.transferID)))
        }
        DvaErrors::TransferNotPending(e) => SdkError::AlreadyResolved {
            transfer_id: TransferId(e.transferID),
            status: TransferStatus::from_u8(e.status)
                .map(|s| s.to_string())
                .unwrap_or_else(|_| format!("status {}", e.status)),
        },
        DvaErrors::NotAnApprover(e) => SdkError::NotAnApprover {
            transfer_id: TransferId(e.transferID),
            approver: e.approver,
        },
        DvaErrors::AlreadyApproved(e) => SdkError::DuplicateApproval {
            transfer_id: TransferId(e.transferID),
            approver: e.approver,
        },
        DvaErrors::OutOfOrderApproval(e) => SdkError::OutOfOrderApproval {
            transfer_id: TransferId(e.transferID),
            approver: e.approver,
            expected: if e.expected == Address::ZERO {
                ApproverSlot::AnyAgent.to_string()
            } else {
                e.expected.to_string()
            },
        },
        DvaErrors::InvalidSignature(e) => SdkError::InvalidSignature {
            transfer_id: TransferId(e.transferID),
            reason: format!("signature #{} does not verify", e.signatureIndex),
        },
        DvaErrors::OnlyManagerAgent(e) => {
            SdkError::permission(e.caller, "is not the agent of the transfer manager")
        }
        DvaErrors::OnlySenderOrAgent(e) => {
            SdkError::permission(e.caller, "is neither the sender nor a token agent")
        }
        DvaErrors::NotVerified(e) => SdkError::not_verified(e.account, "has no verified identity"),
        DvaErrors::InsufficientAllowance(e) => SdkError::InsufficientAllowance {
            owner: e.owner,
            spender: e.spender,
            amount: context.amount.unwrap_or_default(),
        },
        DvaErrors::ExecutionFailed(e) => SdkError::ExecutionFailed {
            transfer_id: context.transfer_id.unwrap_or(TransferId(e.transferID)),
            reason: e.reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use alloy::sol_types::SolError;

    const ALICE: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

    fn decode(data: Vec<u8>) -> SdkError {
        let context = ErrorContext {
            transfer_id: None,
            amount: Some(100),
        };
        map_dva_error(DvaErrors::abi_decode(&data).unwrap(), context)
    }

    #[test]
    fn custom_errors_map_to_sdk_errors() {
        let id = B256::repeat_byte(3);
        let err = decode(
            IDVATransferManager::OutOfOrderApproval {
                transferID: id,
                approver: ALICE,
                expected: Address::ZERO,
            }
            .abi_encode(),
        );
        assert!(matches!(
            err,
            SdkError::OutOfOrderApproval { ref expected, .. } if expected == "any token agent"
        ));

        let err = decode(
            IDVATransferManager::InsufficientAllowance {
                owner: ALICE,
                spender: Address::ZERO,
            }
            .abi_encode(),
        );
        assert!(matches!(err, SdkError::InsufficientAllowance { amount: 100, .. }));

        let err = decode(
            IDVATransferManager::TransferNotPending {
                transferID: id,
                status: 2,
            }
            .abi_encode(),
        );
        assert!(matches!(err, SdkError::AlreadyResolved { ref status, .. } if status == "cancelled"));

        let err = decode(
            IDVATransferManager::ExecutionFailed {
                transferID: id,
                reason: "compliance".into(),
            }
            .abi_encode(),
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn view_conversion_keeps_slot_order() {
        let view = IDVATransferManager::TransferView {
            transferID: B256::repeat_byte(1),
            tokenAddress: Address::ZERO,
            sender: ALICE,
            recipient: ALICE,
            amount: B256::repeat_byte(2),
            nonce: U256::from(4u64),
            status: 0,
            sequentialApproval: true,
            approvers: vec![
                IDVATransferManager::Approver {
                    wallet: ALICE,
                    anyTokenAgent: false,
                    approved: true,
                },
                IDVATransferManager::Approver {
                    wallet: Address::ZERO,
                    anyTokenAgent: true,
                    approved: false,
                },
            ],
        };
        let transfer = transfer_from_view(Address::ZERO, view).unwrap();
        assert_eq!(
            transfer.slots.iter().map(|s| s.slot).collect::<Vec<_>>(),
            vec![ApproverSlot::Wallet(ALICE), ApproverSlot::AnyAgent]
        );
        assert_eq!(transfer.approvals.len(), 1);
        assert!(transfer.sequential);
        assert_eq!(transfer.status, TransferStatus::Pending);
    }

    #[test]
    fn unknown_status_is_contract_error() {
        let view = IDVATransferManager::TransferView {
            transferID: B256::repeat_byte(1),
            tokenAddress: Address::ZERO,
            sender: ALICE,
            recipient: ALICE,
            amount: B256::ZERO,
            nonce: U256::ZERO,
            status: 7,
            sequentialApproval: false,
            approvers: vec![],
        };
        assert!(matches!(
            transfer_from_view(Address::ZERO, view),
            Err(SdkError::Contract(_))
        ));
    }
}
