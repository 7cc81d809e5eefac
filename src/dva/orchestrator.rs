// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-side DVA orchestration.
//!
//! Each operation validates what it can before sending anything, always
//! against freshly fetched state, then hands the mutation to the backend.
//! The backend stays authoritative: a pre-check that passes can still be
//! rejected on-chain, and that rejection is surfaced as is.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use alloy::primitives::{Address, U256};

use super::backend::DvaBackend;
use super::delegate::{recover_signer, sign_transfer_id};
use super::policy::ApprovalPolicy;
use super::transfer_id::calculate_transfer_id;
use super::types::{
    AmountHandle, Approval, CreateManager, Criteria, DelegateApproval, DelegateSignature,
    InitiatedTransfer, ManagerHandle, Transfer, TransferDetails, TransferId,
};
use crate::error::{SdkError, SdkResult};
use crate::storage::{DeploymentKind, HistoryStore};
use crate::wallet::SigningWallet;

/// Advisory step counter for multi-step operations.
#[derive(Debug)]
pub struct Progress {
    operation: &'static str,
    step: AtomicU32,
}

impl Progress {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            step: AtomicU32::new(0),
        }
    }

    /// Log the next step and return its number.
    pub fn step(&self, message: &str) -> u32 {
        let step = self.step.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(operation = self.operation, step, "{message}");
        step
    }

    pub fn current(&self) -> u32 {
        self.step.load(Ordering::Relaxed)
    }
}

/// History key of the manager bound to `identity` on `token`.
pub fn manager_key(token: Address, identity: Address) -> String {
    format!("{token}:{identity}")
}

pub struct DvaOrchestrator<B> {
    backend: B,
}

impl<B: DvaBackend> DvaOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ===== Managers =====

    /// Deploy (or reuse) the transfer manager of `request.token` and
    /// register it in the token's identity registry.
    pub async fn create(
        &self,
        caller: &SigningWallet,
        request: CreateManager,
        history: &mut HistoryStore,
    ) -> SdkResult<ManagerHandle> {
        let progress = Progress::new("create");
        let CreateManager {
            token,
            identity,
            agent,
            country,
        } = request;

        progress.step("Checking agent role");
        if !self.backend.is_token_agent(token, caller.address).await? {
            return Err(SdkError::permission(
                caller.address,
                format!("is not an agent of token {token}"),
            ));
        }

        let key = manager_key(token, identity);
        let (manager, deployed) = match history.lookup(DeploymentKind::TransferManager, &key) {
            Some(manager) => {
                progress.step("Reusing recorded transfer manager");
                (manager, false)
            }
            None => {
                progress.step("Deploying transfer manager");
                let manager = self.backend.deploy_manager(caller, token, agent).await?;
                history.record(DeploymentKind::TransferManager, &key, manager)?;
                (manager, true)
            }
        };

        let status = self.backend.identity_status(token, manager).await?;
        if status.registered {
            progress.step("Manager identity already registered");
        } else {
            progress.step("Registering manager identity");
            self.backend
                .register_identity(caller, token, manager, identity, country)
                .await?;
        }

        if !self.backend.identity_status(token, manager).await?.verified {
            return Err(SdkError::not_verified(
                manager,
                format!("identity {identity} does not satisfy the token's claim requirements"),
            ));
        }

        tracing::info!(%manager, %token, %identity, deployed, "Transfer manager ready");
        Ok(ManagerHandle {
            manager,
            token,
            identity,
            country,
            agent,
            deployed,
        })
    }

    /// Replace the criteria of `manager` and return them as re-read from it.
    pub async fn set_approval_criteria(
        &self,
        caller: &SigningWallet,
        manager: Address,
        criteria: Criteria,
    ) -> SdkResult<Criteria> {
        if !criteria.include_recipient
            && !criteria.include_agent
            && criteria.additional_approvers.is_empty()
        {
            return Err(SdkError::validation(
                "criteria name no approvers; transfers could never be approved",
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = criteria
            .additional_approvers
            .iter()
            .find(|a| !seen.insert(**a))
        {
            return Err(SdkError::validation(format!("approver {dup} is listed twice")));
        }

        let info = self.backend.manager_info(manager).await?;
        if caller.address != info.agent {
            return Err(SdkError::permission(
                caller.address,
                format!("is not the agent of manager {manager} (agent is {})", info.agent),
            ));
        }

        self.backend
            .set_approval_criteria(caller, manager, &criteria)
            .await?;
        let stored = self.backend.approval_criteria(manager).await?;
        tracing::info!(
            %manager,
            include_recipient = stored.include_recipient,
            include_agent = stored.include_agent,
            sequential = stored.sequential,
            additional = stored.additional_approvers.len(),
            "Approval criteria set"
        );
        Ok(stored)
    }

    // ===== Transfers =====

    pub fn calculate_transfer_id(
        &self,
        manager: Address,
        nonce: U256,
        sender: Address,
        recipient: Address,
        handle: AmountHandle,
    ) -> TransferId {
        calculate_transfer_id(manager, nonce, sender, recipient, handle)
    }

    /// Allow `manager` to escrow up to `amount` of the owner's tokens.
    pub async fn approve_allowance(
        &self,
        owner: &SigningWallet,
        manager: Address,
        amount: u64,
    ) -> SdkResult<AmountHandle> {
        let info = self.backend.manager_info(manager).await?;
        let handle = self
            .backend
            .approve_allowance(owner, info.token, manager, amount)
            .await?;
        tracing::info!(owner = %owner.address, %manager, %handle, "Allowance approved");
        Ok(handle)
    }

    pub async fn initiate(
        &self,
        sender: &SigningWallet,
        manager: Address,
        recipient: Address,
        amount: u64,
    ) -> SdkResult<InitiatedTransfer> {
        if amount == 0 {
            return Err(SdkError::validation("transfer amount must be positive"));
        }
        if sender.address == recipient {
            return Err(SdkError::validation("sender and recipient are the same account"));
        }

        let expected_nonce = self.backend.next_nonce(manager).await?;
        let initiated = self
            .backend
            .initiate_transfer(sender, manager, recipient, amount)
            .await?;
        if initiated.nonce != expected_nonce {
            tracing::warn!(
                %manager,
                expected = %expected_nonce,
                actual = %initiated.nonce,
                "Another transfer was initiated concurrently"
            );
        }

        let computed = calculate_transfer_id(
            manager,
            initiated.nonce,
            sender.address,
            recipient,
            initiated.amount_handle,
        );
        if computed != initiated.transfer_id {
            return Err(SdkError::Contract(format!(
                "manager reported transfer id {}, expected {computed}",
                initiated.transfer_id
            )));
        }

        tracing::info!(
            transfer_id = %initiated.transfer_id,
            sender = %sender.address,
            %recipient,
            nonce = %initiated.nonce,
            "Transfer initiated"
        );
        Ok(initiated)
    }

    async fn fetch(&self, manager: Address, transfer_id: TransferId) -> SdkResult<Transfer> {
        self.backend
            .transfer(manager, transfer_id)
            .await?
            .ok_or_else(|| SdkError::not_found(format!("transfer {transfer_id} on {manager}")))
    }

    pub async fn get_transfer(
        &self,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<TransferDetails> {
        Ok(TransferDetails::from(&self.fetch(manager, transfer_id).await?))
    }

    /// Approve as `approver`. When this is the last missing approval the
    /// transfer executes; if execution fails the transfer stays pending and
    /// the same call can be replayed.
    pub async fn approve(
        &self,
        manager: Address,
        transfer_id: TransferId,
        approver: &SigningWallet,
    ) -> SdkResult<TransferDetails> {
        let transfer = self.fetch(manager, transfer_id).await?;
        let is_agent = self
            .backend
            .is_token_agent(transfer.token, approver.address)
            .await?;
        let slot = ApprovalPolicy::check(&transfer, approver.address, is_agent)?;
        tracing::debug!(%transfer_id, approver = %approver.address, slot, "Approval accepted locally");

        let updated = self
            .backend
            .approve_transfer(approver, manager, transfer_id)
            .await?;
        tracing::info!(%transfer_id, approver = %approver.address, status = %updated.status, "Transfer approved");
        Ok(TransferDetails::from(&updated))
    }

    /// Sign `transfer_id` with every signer, without sending anything.
    pub fn sign_delegate_approvals(
        &self,
        transfer_id: TransferId,
        signers: &[SigningWallet],
    ) -> SdkResult<Vec<DelegateSignature>> {
        signers
            .iter()
            .map(|s| sign_transfer_id(transfer_id, &s.signer))
            .collect()
    }

    /// Have `signers` sign and `caller` relay all approvals in one request.
    pub async fn delegate_approve(
        &self,
        manager: Address,
        transfer_id: TransferId,
        signers: &[SigningWallet],
        caller: &SigningWallet,
    ) -> SdkResult<DelegateApproval> {
        let signatures = self.sign_delegate_approvals(transfer_id, signers)?;
        self.relay_approvals(manager, transfer_id, signatures, caller)
            .await
    }

    /// Relay signatures collected elsewhere. The batch is validated as a
    /// whole before sending; nothing is sent if any entry is rejected.
    pub async fn relay_approvals(
        &self,
        manager: Address,
        transfer_id: TransferId,
        signatures: Vec<DelegateSignature>,
        caller: &SigningWallet,
    ) -> SdkResult<DelegateApproval> {
        if signatures.is_empty() {
            return Err(SdkError::validation("no signatures to relay"));
        }
        let mut scratch = self.fetch(manager, transfer_id).await?;

        let mut approvers = Vec::with_capacity(signatures.len());
        for signed in &signatures {
            let approver = recover_signer(transfer_id, &signed.signature)?;
            if approver != signed.signer {
                return Err(SdkError::InvalidSignature {
                    transfer_id,
                    reason: format!("signature recovers to {approver}, not {}", signed.signer),
                });
            }
            let is_agent = self.backend.is_token_agent(scratch.token, approver).await?;
            let slot = ApprovalPolicy::check(&scratch, approver, is_agent)?;
            ApprovalPolicy::apply(
                &mut scratch,
                slot,
                Approval {
                    approver,
                    slot,
                    signature: Some(signed.signature.clone()),
                },
                is_agent,
            );
            approvers.push(approver);
        }

        let updated = self
            .backend
            .delegate_approve_transfer(caller, manager, transfer_id, &signatures)
            .await?;
        tracing::info!(
            %transfer_id,
            relayer = %caller.address,
            approvals = approvers.len(),
            status = %updated.status,
            "Delegated approvals relayed"
        );
        Ok(DelegateApproval {
            approvals: approvers,
            signatures,
            transfer: TransferDetails::from(&updated),
        })
    }

    /// Cancel a pending transfer and refund the escrow. Sender or agent only.
    pub async fn cancel(
        &self,
        caller: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<TransferDetails> {
        let transfer = self.fetch(manager, transfer_id).await?;
        if transfer.status.is_terminal() {
            return Err(SdkError::AlreadyResolved {
                transfer_id,
                status: transfer.status.to_string(),
            });
        }
        if caller.address != transfer.sender
            && !self
                .backend
                .is_token_agent(transfer.token, caller.address)
                .await?
        {
            return Err(SdkError::permission(
                caller.address,
                "is neither the sender nor a token agent",
            ));
        }
        let updated = self
            .backend
            .cancel_transfer(caller, manager, transfer_id)
            .await?;
        tracing::info!(%transfer_id, by = %caller.address, "Transfer cancelled");
        Ok(TransferDetails::from(&updated))
    }

    pub async fn balance_of(&self, holder: &SigningWallet, token: Address) -> SdkResult<u64> {
        self.backend.balance_of(holder, token).await
    }
}
