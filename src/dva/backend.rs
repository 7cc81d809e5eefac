// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The seam between orchestration and whatever holds transfer state.
//!
//! [`super::OnchainBackend`] talks to deployed contracts;
//! [`super::MemoryLedger`] keeps everything in process.

use alloy::primitives::{Address, U256};

use super::types::{
    AmountHandle, Criteria, DelegateSignature, IdentityStatus, InitiatedTransfer, ManagerInfo,
    Transfer, TransferId,
};
use crate::error::SdkResult;
use crate::wallet::SigningWallet;

#[allow(async_fn_in_trait)]
pub trait DvaBackend {
    /// Whether `account` holds the agent role on `token`.
    async fn is_token_agent(&self, token: Address, account: Address) -> SdkResult<bool>;

    /// Registration state of `account` in the identity registry of `token`.
    async fn identity_status(&self, token: Address, account: Address) -> SdkResult<IdentityStatus>;

    /// Deploy a transfer manager for `token` bound to `agent`.
    async fn deploy_manager(
        &self,
        caller: &SigningWallet,
        token: Address,
        agent: Address,
    ) -> SdkResult<Address>;

    async fn register_identity(
        &self,
        caller: &SigningWallet,
        token: Address,
        account: Address,
        identity: Address,
        country: u16,
    ) -> SdkResult<()>;

    async fn manager_info(&self, manager: Address) -> SdkResult<ManagerInfo>;

    /// Replace the criteria of `manager`.
    async fn set_approval_criteria(
        &self,
        caller: &SigningWallet,
        manager: Address,
        criteria: &Criteria,
    ) -> SdkResult<()>;

    async fn approval_criteria(&self, manager: Address) -> SdkResult<Criteria>;

    /// Nonce the next initiated transfer of `manager` will use.
    async fn next_nonce(&self, manager: Address) -> SdkResult<U256>;

    /// Confidential `approve(spender, amount)` on `token`.
    async fn approve_allowance(
        &self,
        owner: &SigningWallet,
        token: Address,
        spender: Address,
        amount: u64,
    ) -> SdkResult<AmountHandle>;

    async fn initiate_transfer(
        &self,
        sender: &SigningWallet,
        manager: Address,
        recipient: Address,
        amount: u64,
    ) -> SdkResult<InitiatedTransfer>;

    /// Current state of a transfer, `None` if the manager does not know it.
    async fn transfer(&self, manager: Address, transfer_id: TransferId)
        -> SdkResult<Option<Transfer>>;

    /// Approve as `approver`. The completing approval executes the transfer.
    async fn approve_transfer(
        &self,
        approver: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Transfer>;

    /// Relay a batch of signed approvals in one request. All or nothing.
    async fn delegate_approve_transfer(
        &self,
        caller: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
        signatures: &[DelegateSignature],
    ) -> SdkResult<Transfer>;

    async fn cancel_transfer(
        &self,
        caller: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Transfer>;

    /// Decrypted confidential balance of `holder` on `token`.
    async fn balance_of(&self, holder: &SigningWallet, token: Address) -> SdkResult<u64>;
}
