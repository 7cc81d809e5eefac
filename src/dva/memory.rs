// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process DVA ledger.
//!
//! Implements [`DvaBackend`] without a chain. Tokens have agents, an
//! identity registry, clear balances and allowances; confidential values are
//! entries in a handle table. Each transfer manager sits behind its own
//! mutex, and every transfer mutation goes through a version check so a
//! transfer completes at most once.
//!
//! Compliance is modelled as a per-token set of blocked accounts: a transfer
//! to or from a blocked account fails at execution time.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, B256, U256};
use tokio::sync::{Mutex, RwLock};

use super::backend::DvaBackend;
use super::delegate::recover_signer;
use super::policy::ApprovalPolicy;
use super::transfer_id::calculate_transfer_id;
use super::types::{
    AmountHandle, Approval, Criteria, DelegateSignature, IdentityStatus, InitiatedTransfer,
    ManagerInfo, SlotState, Transfer, TransferId, TransferStatus,
};
use crate::error::{SdkError, SdkResult};
use crate::wallet::SigningWallet;

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct IdentityRecord {
    identity: Address,
    country: u16,
}

#[derive(Debug, Default)]
struct TokenState {
    agents: HashSet<Address>,
    registry: HashMap<Address, IdentityRecord>,
    blocked: HashSet<Address>,
    balances: HashMap<Address, u64>,
    /// (owner, spender) → amount
    allowances: HashMap<(Address, Address), u64>,
}

impl TokenState {
    fn balance(&self, account: Address) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Move `amount` between accounts, or fail without changing anything.
    fn move_balance(&mut self, from: Address, to: Address, amount: u64) -> Result<(), String> {
        let available = self.balance(from);
        if available < amount {
            return Err(format!("{from} holds {available}, needs {amount}"));
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| format!("balance of {to} would overflow"))?;
        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        Ok(())
    }
}

#[derive(Debug)]
struct ManagerState {
    token: Address,
    agent: Address,
    criteria: Option<Criteria>,
    nonce: U256,
    transfers: HashMap<TransferId, Transfer>,
}

impl ManagerState {
    fn find(&self, transfer_id: TransferId) -> SdkResult<&Transfer> {
        self.transfers
            .get(&transfer_id)
            .ok_or_else(|| SdkError::not_found(format!("transfer {transfer_id}")))
    }

    /// Store `updated` if nobody changed the transfer since `base_version`.
    fn commit(&mut self, updated: Transfer, base_version: u64) -> SdkResult<Transfer> {
        let current = self
            .transfers
            .get(&updated.id)
            .map(|t| t.version)
            .unwrap_or_default();
        if current != base_version {
            return Err(SdkError::Contract(format!(
                "transfer {} changed concurrently (version {current}, expected {base_version})",
                updated.id
            )));
        }
        self.transfers.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryLedger {
    tokens: RwLock<HashMap<Address, TokenState>>,
    managers: RwLock<HashMap<Address, Arc<Mutex<ManagerState>>>>,
    /// Identity contracts whose claims check out.
    verified_identities: RwLock<HashSet<Address>>,
    handles: RwLock<HashMap<B256, u64>>,
    counter: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_word(&self, tag: &[u8]) -> B256 {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut seed = tag.to_vec();
        seed.extend_from_slice(&n.to_be_bytes());
        keccak256(seed)
    }

    async fn new_handle(&self, value: u64) -> AmountHandle {
        let handle = self.next_word(b"handle");
        self.handles.write().await.insert(handle, value);
        AmountHandle(handle)
    }

    /// Clear value behind a handle.
    pub async fn decrypt(&self, handle: AmountHandle) -> Option<u64> {
        self.handles.read().await.get(&handle.0).copied()
    }

    async fn manager(&self, manager: Address) -> SdkResult<Arc<Mutex<ManagerState>>> {
        self.managers
            .read()
            .await
            .get(&manager)
            .cloned()
            .ok_or_else(|| SdkError::not_found(format!("transfer manager {manager}")))
    }

    async fn is_verified(&self, token: Address, account: Address) -> bool {
        let identity = self
            .tokens
            .read()
            .await
            .get(&token)
            .and_then(|t| t.registry.get(&account))
            .map(|r| r.identity);
        match identity {
            Some(identity) => self.verified_identities.read().await.contains(&identity),
            None => false,
        }
    }

    // ===== Fixture setup =====

    /// Create a token with `agent` as its first agent.
    pub async fn add_token(&self, token: Address, agent: Address) {
        let mut tokens = self.tokens.write().await;
        tokens.entry(token).or_default().agents.insert(agent);
    }

    pub async fn add_agent(&self, token: Address, agent: Address) -> SdkResult<()> {
        self.with_token(token, |t| {
            t.agents.insert(agent);
        })
        .await
    }

    /// Mark the claims of an identity contract as valid.
    pub async fn issue_claims(&self, identity: Address) {
        self.verified_identities.write().await.insert(identity);
    }

    pub async fn revoke_claims(&self, identity: Address) {
        self.verified_identities.write().await.remove(&identity);
    }

    /// Register `account` with a fresh identity that has valid claims.
    pub async fn onboard(&self, token: Address, account: Address, country: u16) -> SdkResult<()> {
        let identity = Address::from_word(self.next_word(b"identity"));
        self.issue_claims(identity).await;
        self.with_token(token, |t| {
            t.registry.insert(account, IdentityRecord { identity, country });
        })
        .await
    }

    pub async fn mint(&self, token: Address, account: Address, amount: u64) -> SdkResult<()> {
        self.with_token(token, |t| {
            let balance = t.balance(account).saturating_add(amount);
            t.balances.insert(account, balance);
        })
        .await
    }

    /// Make compliance reject transfers involving `account`.
    pub async fn block(&self, token: Address, account: Address) -> SdkResult<()> {
        self.with_token(token, |t| {
            t.blocked.insert(account);
        })
        .await
    }

    pub async fn unblock(&self, token: Address, account: Address) -> SdkResult<()> {
        self.with_token(token, |t| {
            t.blocked.remove(&account);
        })
        .await
    }

    pub async fn balance(&self, token: Address, account: Address) -> u64 {
        self.tokens
            .read()
            .await
            .get(&token)
            .map(|t| t.balance(account))
            .unwrap_or(0)
    }

    /// Investor country `account` was registered with.
    pub async fn country(&self, token: Address, account: Address) -> Option<u16> {
        self.tokens
            .read()
            .await
            .get(&token)
            .and_then(|t| t.registry.get(&account))
            .map(|r| r.country)
    }

    pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> u64 {
        self.tokens
            .read()
            .await
            .get(&token)
            .and_then(|t| t.allowances.get(&(owner, spender)).copied())
            .unwrap_or(0)
    }

    async fn with_token<R>(
        &self,
        token: Address,
        f: impl FnOnce(&mut TokenState) -> R,
    ) -> SdkResult<R> {
        let mut tokens = self.tokens.write().await;
        let state = tokens
            .get_mut(&token)
            .ok_or_else(|| SdkError::not_found(format!("token {token}")))?;
        Ok(f(state))
    }

    // ===== Execution =====

    /// Move the escrowed amount to the recipient. Leaves everything
    /// untouched on failure.
    async fn execute(&self, manager: Address, transfer: &Transfer) -> SdkResult<()> {
        let amount = self.decrypt(transfer.amount_handle).await.ok_or_else(|| {
            SdkError::ExecutionFailed {
                transfer_id: transfer.id,
                reason: format!("unknown amount handle {}", transfer.amount_handle),
            }
        })?;

        let recipient_verified = self.is_verified(transfer.token, transfer.recipient).await;

        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(&transfer.token)
            .ok_or_else(|| SdkError::not_found(format!("token {}", transfer.token)))?;

        let failure = |reason: String| SdkError::ExecutionFailed {
            transfer_id: transfer.id,
            reason,
        };
        if let Some(blocked) = [transfer.sender, transfer.recipient]
            .into_iter()
            .find(|a| token.blocked.contains(a))
        {
            return Err(failure(format!("compliance rejected transfer involving {blocked}")));
        }
        if !recipient_verified {
            return Err(failure(format!(
                "recipient {} is no longer verified",
                transfer.recipient
            )));
        }
        token
            .move_balance(manager, transfer.recipient, amount)
            .map_err(failure)
    }

    /// Finish an approval round on a scratch copy: execute if complete, then
    /// commit.
    async fn settle(
        &self,
        state: &mut ManagerState,
        manager: Address,
        mut scratch: Transfer,
        base_version: u64,
        complete: bool,
    ) -> SdkResult<Transfer> {
        if complete {
            self.execute(manager, &scratch).await?;
            scratch.status = TransferStatus::Completed;
            scratch.version += 1;
            tracing::info!(transfer_id = %scratch.id, %manager, "Transfer completed");
        }
        state.commit(scratch, base_version)
    }
}

impl DvaBackend for MemoryLedger {
    async fn is_token_agent(&self, token: Address, account: Address) -> SdkResult<bool> {
        Ok(self
            .tokens
            .read()
            .await
            .get(&token)
            .ok_or_else(|| SdkError::not_found(format!("token {token}")))?
            .agents
            .contains(&account))
    }

    async fn identity_status(&self, token: Address, account: Address) -> SdkResult<IdentityStatus> {
        let registered = self
            .tokens
            .read()
            .await
            .get(&token)
            .ok_or_else(|| SdkError::not_found(format!("token {token}")))?
            .registry
            .contains_key(&account);
        Ok(IdentityStatus {
            registered,
            verified: self.is_verified(token, account).await,
        })
    }

    async fn deploy_manager(
        &self,
        caller: &SigningWallet,
        token: Address,
        agent: Address,
    ) -> SdkResult<Address> {
        if !self.is_token_agent(token, caller.address).await? {
            return Err(SdkError::permission(caller.address, "is not an agent of the token"));
        }
        let manager = Address::from_word(self.next_word(b"manager"));
        let state = ManagerState {
            token,
            agent,
            criteria: None,
            nonce: U256::ZERO,
            transfers: HashMap::new(),
        };
        self.managers
            .write()
            .await
            .insert(manager, Arc::new(Mutex::new(state)));
        tracing::debug!(%manager, %token, %agent, "Deployed in-memory transfer manager");
        Ok(manager)
    }

    async fn register_identity(
        &self,
        caller: &SigningWallet,
        token: Address,
        account: Address,
        identity: Address,
        country: u16,
    ) -> SdkResult<()> {
        if !self.is_token_agent(token, caller.address).await? {
            return Err(SdkError::permission(
                caller.address,
                "is not an agent of the identity registry",
            ));
        }
        self.with_token(token, |t| {
            t.registry.insert(account, IdentityRecord { identity, country });
        })
        .await
    }

    async fn manager_info(&self, manager: Address) -> SdkResult<ManagerInfo> {
        let state = self.manager(manager).await?;
        let state = state.lock().await;
        Ok(ManagerInfo {
            token: state.token,
            agent: state.agent,
        })
    }

    async fn set_approval_criteria(
        &self,
        caller: &SigningWallet,
        manager: Address,
        criteria: &Criteria,
    ) -> SdkResult<()> {
        let state = self.manager(manager).await?;
        let mut state = state.lock().await;
        if caller.address != state.agent {
            return Err(SdkError::permission(
                caller.address,
                format!("is not the agent of manager {manager}"),
            ));
        }
        state.criteria = Some(criteria.clone());
        Ok(())
    }

    async fn approval_criteria(&self, manager: Address) -> SdkResult<Criteria> {
        let state = self.manager(manager).await?;
        let state = state.lock().await;
        Ok(state.criteria.clone().unwrap_or_default())
    }

    async fn next_nonce(&self, manager: Address) -> SdkResult<U256> {
        let state = self.manager(manager).await?;
        let nonce = state.lock().await.nonce;
        Ok(nonce)
    }

    async fn approve_allowance(
        &self,
        owner: &SigningWallet,
        token: Address,
        spender: Address,
        amount: u64,
    ) -> SdkResult<AmountHandle> {
        let handle = self.new_handle(amount).await;
        self.with_token(token, |t| {
            t.allowances.insert((owner.address, spender), amount);
        })
        .await?;
        Ok(handle)
    }

    async fn initiate_transfer(
        &self,
        sender: &SigningWallet,
        manager: Address,
        recipient: Address,
        amount: u64,
    ) -> SdkResult<InitiatedTransfer> {
        if amount == 0 {
            return Err(SdkError::validation("transfer amount must be positive"));
        }
        let state = self.manager(manager).await?;
        let mut state = state.lock().await;
        let token = state.token;

        let criteria = state.criteria.clone().ok_or_else(|| {
            SdkError::validation(format!("manager {manager} has no approval criteria"))
        })?;

        for account in [sender.address, recipient] {
            if !self.is_verified(token, account).await {
                return Err(SdkError::not_verified(account, "has no verified identity"));
            }
        }

        self.with_token(token, |t| {
            let allowed = t.allowances.get(&(sender.address, manager)).copied().unwrap_or(0);
            if allowed < amount {
                return Err(SdkError::InsufficientAllowance {
                    owner: sender.address,
                    spender: manager,
                    amount,
                });
            }
            t.move_balance(sender.address, manager, amount)
                .map_err(|reason| SdkError::Contract(format!("escrow failed: {reason}")))?;
            t.allowances.insert((sender.address, manager), allowed - amount);
            Ok(())
        })
        .await??;

        let amount_handle = self.new_handle(amount).await;
        let nonce = state.nonce;
        state.nonce += U256::from(1u64);

        let id = calculate_transfer_id(manager, nonce, sender.address, recipient, amount_handle);
        let transfer = Transfer {
            id,
            manager,
            token,
            sender: sender.address,
            recipient,
            amount_handle,
            nonce,
            slots: criteria
                .approvers_for(recipient)
                .into_iter()
                .map(|slot| SlotState {
                    slot,
                    approved: false,
                })
                .collect(),
            approvals: Vec::new(),
            sequential: criteria.sequential,
            status: TransferStatus::Pending,
            version: 1,
        };
        state.transfers.insert(id, transfer);

        Ok(InitiatedTransfer {
            transfer_id: id,
            amount_handle,
            nonce,
        })
    }

    async fn transfer(
        &self,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Option<Transfer>> {
        let state = self.manager(manager).await?;
        let state = state.lock().await;
        Ok(state.transfers.get(&transfer_id).cloned())
    }

    async fn approve_transfer(
        &self,
        approver: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Transfer> {
        let state = self.manager(manager).await?;
        let mut state = state.lock().await;
        let mut scratch = state.find(transfer_id)?.clone();
        let base_version = scratch.version;

        let is_agent = self.is_token_agent(scratch.token, approver.address).await?;
        let slot = ApprovalPolicy::check(&scratch, approver.address, is_agent)?;
        let complete = ApprovalPolicy::apply(
            &mut scratch,
            slot,
            Approval {
                approver: approver.address,
                slot,
                signature: None,
            },
            is_agent,
        );
        self.settle(&mut state, manager, scratch, base_version, complete)
            .await
    }

    async fn delegate_approve_transfer(
        &self,
        caller: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
        signatures: &[DelegateSignature],
    ) -> SdkResult<Transfer> {
        if signatures.is_empty() {
            return Err(SdkError::validation("no signatures to relay"));
        }
        let state = self.manager(manager).await?;
        let mut state = state.lock().await;
        let mut scratch = state.find(transfer_id)?.clone();
        let base_version = scratch.version;

        let mut complete = false;
        for signed in signatures {
            let approver = recover_signer(transfer_id, &signed.signature)?;
            if approver != signed.signer {
                return Err(SdkError::InvalidSignature {
                    transfer_id,
                    reason: format!("signature recovers to {approver}, not {}", signed.signer),
                });
            }
            let is_agent = self.is_token_agent(scratch.token, approver).await?;
            let slot = ApprovalPolicy::check(&scratch, approver, is_agent)?;
            complete = ApprovalPolicy::apply(
                &mut scratch,
                slot,
                Approval {
                    approver,
                    slot,
                    signature: Some(signed.signature.clone()),
                },
                is_agent,
            );
        }
        tracing::debug!(%transfer_id, relayer = %caller.address, count = signatures.len(), "Relayed approvals");
        self.settle(&mut state, manager, scratch, base_version, complete)
            .await
    }

    async fn cancel_transfer(
        &self,
        caller: &SigningWallet,
        manager: Address,
        transfer_id: TransferId,
    ) -> SdkResult<Transfer> {
        let state = self.manager(manager).await?;
        let mut state = state.lock().await;
        let mut scratch = state.find(transfer_id)?.clone();
        let base_version = scratch.version;

        if scratch.status.is_terminal() {
            return Err(SdkError::AlreadyResolved {
                transfer_id,
                status: scratch.status.to_string(),
            });
        }
        if caller.address != scratch.sender
            && !self.is_token_agent(scratch.token, caller.address).await?
        {
            return Err(SdkError::permission(
                caller.address,
                "is neither the sender nor a token agent",
            ));
        }

        let amount = self
            .decrypt(scratch.amount_handle)
            .await
            .ok_or_else(|| SdkError::Contract(format!("unknown handle {}", scratch.amount_handle)))?;
        self.with_token(scratch.token, |t| t.move_balance(manager, scratch.sender, amount))
            .await?
            .map_err(|reason| SdkError::Contract(format!("refund failed: {reason}")))?;

        scratch.status = TransferStatus::Cancelled;
        scratch.version += 1;
        state.commit(scratch, base_version)
    }

    async fn balance_of(&self, holder: &SigningWallet, token: Address) -> SdkResult<u64> {
        if !self.tokens.read().await.contains_key(&token) {
            return Err(SdkError::not_found(format!("token {token}")));
        }
        Ok(self.balance(token, holder.address).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dva::delegate::sign_transfer_id;
    use alloy::primitives::address;
    use alloy::signers::local::PrivateKeySigner;

    const TOKEN: Address = address!("00000000000000000000000000000000000000f0");

    struct Fixture {
        ledger: MemoryLedger,
        agent: SigningWallet,
        alice: SigningWallet,
        bob: SigningWallet,
        manager: Address,
    }

    fn wallet(n: u8) -> SigningWallet {
        SigningWallet::from(PrivateKeySigner::from_bytes(&B256::with_last_byte(n)).unwrap())
    }

    async fn fixture(criteria: Criteria) -> Fixture {
        let ledger = MemoryLedger::new();
        let agent = wallet(1);
        let alice = wallet(2);
        let bob = wallet(3);
        ledger.add_token(TOKEN, agent.address).await;
        ledger.onboard(TOKEN, alice.address, 1).await.unwrap();
        ledger.onboard(TOKEN, bob.address, 1).await.unwrap();
        ledger.mint(TOKEN, alice.address, 1_000).await.unwrap();
        let manager = ledger.deploy_manager(&agent, TOKEN, agent.address).await.unwrap();
        ledger
            .set_approval_criteria(&agent, manager, &criteria)
            .await
            .unwrap();
        ledger
            .approve_allowance(&alice, TOKEN, manager, 500)
            .await
            .unwrap();
        Fixture {
            ledger,
            agent,
            alice,
            bob,
            manager,
        }
    }

    fn recipient_and_agent() -> Criteria {
        Criteria {
            include_recipient: true,
            include_agent: true,
            sequential: false,
            additional_approvers: vec![],
        }
    }

    #[tokio::test]
    async fn initiate_escrows_and_consumes_allowance() {
        let f = fixture(recipient_and_agent()).await;
        let initiated = f
            .ledger
            .initiate_transfer(&f.alice, f.manager, f.bob.address, 100)
            .await
            .unwrap();
        assert_eq!(initiated.nonce, U256::ZERO);
        assert_eq!(f.ledger.balance(TOKEN, f.alice.address).await, 900);
        assert_eq!(f.ledger.balance(TOKEN, f.manager).await, 100);
        assert_eq!(f.ledger.allowance(TOKEN, f.alice.address, f.manager).await, 400);
        assert_eq!(f.ledger.decrypt(initiated.amount_handle).await, Some(100));
        assert_eq!(f.ledger.next_nonce(f.manager).await.unwrap(), U256::from(1u64));
    }

    #[tokio::test]
    async fn initiate_checks_allowance_and_identity() {
        let f = fixture(recipient_and_agent()).await;
        assert!(matches!(
            f.ledger
                .initiate_transfer(&f.alice, f.manager, f.bob.address, 501)
                .await,
            Err(SdkError::InsufficientAllowance { amount: 501, .. })
        ));
        let stranger = wallet(9);
        assert!(matches!(
            f.ledger
                .initiate_transfer(&f.alice, f.manager, stranger.address, 1)
                .await,
            Err(SdkError::NotVerifiedIdentity { account, .. }) if account == stranger.address
        ));
        assert_eq!(f.ledger.balance(TOKEN, f.alice.address).await, 1_000);
    }

    #[tokio::test]
    async fn completion_happens_once() {
        let f = fixture(recipient_and_agent()).await;
        let id = f
            .ledger
            .initiate_transfer(&f.alice, f.manager, f.bob.address, 100)
            .await
            .unwrap()
            .transfer_id;

        let t = f.ledger.approve_transfer(&f.bob, f.manager, id).await.unwrap();
        assert_eq!(t.status, TransferStatus::Pending);
        let t = f.ledger.approve_transfer(&f.agent, f.manager, id).await.unwrap();
        assert_eq!(t.status, TransferStatus::Completed);
        assert_eq!(f.ledger.balance(TOKEN, f.bob.address).await, 100);
        assert_eq!(f.ledger.balance(TOKEN, f.manager).await, 0);

        assert!(matches!(
            f.ledger.approve_transfer(&f.agent, f.manager, id).await,
            Err(SdkError::AlreadyResolved { .. })
        ));
        assert_eq!(f.ledger.balance(TOKEN, f.bob.address).await, 100);
    }

    #[tokio::test]
    async fn failed_execution_keeps_final_approval_unrecorded() {
        let f = fixture(recipient_and_agent()).await;
        let id = f
            .ledger
            .initiate_transfer(&f.alice, f.manager, f.bob.address, 100)
            .await
            .unwrap()
            .transfer_id;
        f.ledger.approve_transfer(&f.bob, f.manager, id).await.unwrap();
        f.ledger.block(TOKEN, f.bob.address).await.unwrap();

        assert!(matches!(
            f.ledger.approve_transfer(&f.agent, f.manager, id).await,
            Err(SdkError::ExecutionFailed { .. })
        ));
        let t = f.ledger.transfer(f.manager, id).await.unwrap().unwrap();
        assert_eq!(t.status, TransferStatus::Pending);
        assert_eq!(t.approvals.len(), 1);

        f.ledger.unblock(TOKEN, f.bob.address).await.unwrap();
        let t = f.ledger.approve_transfer(&f.agent, f.manager, id).await.unwrap();
        assert_eq!(t.status, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn delegate_batch_is_atomic() {
        let f = fixture(recipient_and_agent()).await;
        let id = f
            .ledger
            .initiate_transfer(&f.alice, f.manager, f.bob.address, 100)
            .await
            .unwrap()
            .transfer_id;

        let good = sign_transfer_id(id, &f.bob.signer).unwrap();
        let mut forged = sign_transfer_id(id, &f.agent.signer).unwrap();
        forged.signer = f.alice.address;
        assert!(matches!(
            f.ledger
                .delegate_approve_transfer(&f.alice, f.manager, id, &[good.clone(), forged])
                .await,
            Err(SdkError::InvalidSignature { .. })
        ));
        let t = f.ledger.transfer(f.manager, id).await.unwrap().unwrap();
        assert!(t.approvals.is_empty());

        let agent_sig = sign_transfer_id(id, &f.agent.signer).unwrap();
        let t = f
            .ledger
            .delegate_approve_transfer(&f.alice, f.manager, id, &[good, agent_sig])
            .await
            .unwrap();
        assert_eq!(t.status, TransferStatus::Completed);
        assert!(t.approvals.iter().all(|a| a.signature.is_some()));
    }

    #[tokio::test]
    async fn cancel_refunds_sender() {
        let f = fixture(recipient_and_agent()).await;
        let id = f
            .ledger
            .initiate_transfer(&f.alice, f.manager, f.bob.address, 100)
            .await
            .unwrap()
            .transfer_id;
        assert!(matches!(
            f.ledger.cancel_transfer(&f.bob, f.manager, id).await,
            Err(SdkError::Permission { .. })
        ));
        let t = f.ledger.cancel_transfer(&f.alice, f.manager, id).await.unwrap();
        assert_eq!(t.status, TransferStatus::Cancelled);
        assert_eq!(f.ledger.balance(TOKEN, f.alice.address).await, 1_000);
        assert!(matches!(
            f.ledger.cancel_transfer(&f.agent, f.manager, id).await,
            Err(SdkError::AlreadyResolved { .. })
        ));
    }

    #[tokio::test]
    async fn only_the_bound_agent_sets_criteria() {
        let f = fixture(recipient_and_agent()).await;
        assert!(matches!(
            f.ledger
                .set_approval_criteria(&f.alice, f.manager, &Criteria::default())
                .await,
            Err(SdkError::Permission { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_manager_and_transfer() {
        let f = fixture(recipient_and_agent()).await;
        assert!(matches!(
            f.ledger.next_nonce(Address::ZERO).await,
            Err(SdkError::NotFound(_))
        ));
        assert!(f
            .ledger
            .transfer(f.manager, TransferId(B256::ZERO))
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            f.ledger
                .approve_transfer(&f.bob, f.manager, TransferId(B256::ZERO))
                .await,
            Err(SdkError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn any_agent_fills_the_agent_slot() {
        let f = fixture(recipient_and_agent()).await;
        let second_agent = wallet(4);
        f.ledger.add_agent(TOKEN, second_agent.address).await.unwrap();
        assert!(matches!(
            f.ledger.add_agent(Address::ZERO, second_agent.address).await,
            Err(SdkError::NotFound(_))
        ));

        let id = f
            .ledger
            .initiate_transfer(&f.alice, f.manager, f.bob.address, 100)
            .await
            .unwrap()
            .transfer_id;
        f.ledger
            .approve_transfer(&second_agent, f.manager, id)
            .await
            .unwrap();
        assert!(matches!(
            f.ledger.approve_transfer(&f.agent, f.manager, id).await,
            Err(SdkError::DuplicateApproval { .. })
        ));
        let t = f.ledger.approve_transfer(&f.bob, f.manager, id).await.unwrap();
        assert_eq!(t.status, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn revoked_claims_block_new_transfers() {
        let f = fixture(recipient_and_agent()).await;
        let carol = wallet(5);
        let identity = address!("00000000000000000000000000000000000000e5");
        f.ledger.issue_claims(identity).await;
        f.ledger
            .register_identity(&f.agent, TOKEN, carol.address, identity, 2)
            .await
            .unwrap();
        assert!(f.ledger.identity_status(TOKEN, carol.address).await.unwrap().verified);

        f.ledger.revoke_claims(identity).await;
        let status = f.ledger.identity_status(TOKEN, carol.address).await.unwrap();
        assert!(status.registered && !status.verified);
        assert!(matches!(
            f.ledger
                .initiate_transfer(&f.alice, f.manager, carol.address, 1)
                .await,
            Err(SdkError::NotVerifiedIdentity { account, .. }) if account == carol.address
        ));
    }
}
