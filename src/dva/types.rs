// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DVA data model.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

// =============================================================================
// Identifiers
// =============================================================================

/// Deterministic identifier of a transfer within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(pub B256);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s.trim())
            .map(TransferId)
            .map_err(|e| SdkError::validation(format!("invalid transfer id `{s}`: {e}")))
    }
}

impl From<B256> for TransferId {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

/// Opaque reference to a confidential amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmountHandle(pub B256);

impl fmt::Display for AmountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AmountHandle {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s.trim())
            .map(AmountHandle)
            .map_err(|e| SdkError::validation(format!("invalid amount handle `{s}`: {e}")))
    }
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransferStatus {
    /// On-chain encoding: 0 pending, 1 completed, 2 cancelled.
    pub fn from_u8(code: u8) -> SdkResult<Self> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Completed),
            2 => Ok(Self::Cancelled),
            other => Err(SdkError::Contract(format!("unknown transfer status code {other}"))),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Completed => 1,
            Self::Cancelled => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        })
    }
}

// =============================================================================
// Criteria and approvers
// =============================================================================

/// Who must approve, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "camelCase")]
pub enum ApproverSlot {
    Wallet(Address),
    /// Filled by any holder of the token agent role.
    AnyAgent,
}

impl ApproverSlot {
    pub fn matches(&self, approver: Address, is_agent: bool) -> bool {
        match self {
            Self::Wallet(address) => *address == approver,
            Self::AnyAgent => is_agent,
        }
    }
}

impl fmt::Display for ApproverSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet(address) => write!(f, "{address}"),
            Self::AnyAgent => f.write_str("any token agent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    pub include_recipient: bool,
    pub include_agent: bool,
    pub sequential: bool,
    pub additional_approvers: Vec<Address>,
}

impl Criteria {
    /// Effective approver slots for a transfer to `recipient`:
    /// additional approvers, then the recipient, then the agent slot.
    ///
    /// A recipient already listed as an additional approver keeps only its
    /// listed slot.
    pub fn approvers_for(&self, recipient: Address) -> Vec<ApproverSlot> {
        let mut slots: Vec<_> = self
            .additional_approvers
            .iter()
            .copied()
            .map(ApproverSlot::Wallet)
            .collect();
        if self.include_recipient && !self.additional_approvers.contains(&recipient) {
            slots.push(ApproverSlot::Wallet(recipient));
        }
        if self.include_agent {
            slots.push(ApproverSlot::AnyAgent);
        }
        slots
    }
}

/// A required approver inside a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    pub slot: ApproverSlot,
    pub approved: bool,
}

/// A recorded approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub approver: Address,
    pub slot: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Bytes>,
}

// =============================================================================
// Transfers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    pub manager: Address,
    pub token: Address,
    pub sender: Address,
    pub recipient: Address,
    pub amount_handle: AmountHandle,
    pub nonce: U256,
    pub slots: Vec<SlotState>,
    pub approvals: Vec<Approval>,
    pub sequential: bool,
    pub status: TransferStatus,
    /// Bumped on every mutation.
    pub version: u64,
}

impl Transfer {
    pub fn has_approved(&self, approver: Address) -> bool {
        self.approvals.iter().any(|a| a.approver == approver)
    }

    pub fn fully_approved(&self) -> bool {
        self.slots.iter().all(|s| s.approved)
    }

    pub fn next_unapproved(&self) -> Option<(usize, &SlotState)> {
        self.slots.iter().enumerate().find(|(_, s)| !s.approved)
    }
}

/// What commands print for a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetails {
    pub transfer_id: TransferId,
    pub manager: Address,
    pub token: Address,
    pub sender: Address,
    pub recipient: Address,
    pub amount_handle: AmountHandle,
    pub nonce: U256,
    pub status: TransferStatus,
    pub approvers: Vec<SlotState>,
    pub approvals: Vec<Address>,
}

impl From<&Transfer> for TransferDetails {
    fn from(t: &Transfer) -> Self {
        Self {
            transfer_id: t.id,
            manager: t.manager,
            token: t.token,
            sender: t.sender,
            recipient: t.recipient,
            amount_handle: t.amount_handle,
            nonce: t.nonce,
            status: t.status,
            approvers: t.slots.clone(),
            approvals: t.approvals.iter().map(|a| a.approver).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedTransfer {
    pub transfer_id: TransferId,
    pub amount_handle: AmountHandle,
    pub nonce: U256,
}

// =============================================================================
// Managers
// =============================================================================

/// Input of `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateManager {
    pub token: Address,
    pub identity: Address,
    pub agent: Address,
    pub country: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerHandle {
    pub manager: Address,
    pub token: Address,
    pub identity: Address,
    pub country: u16,
    pub agent: Address,
    /// False when an existing deployment was reused.
    pub deployed: bool,
}

/// What a manager reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerInfo {
    pub token: Address,
    pub agent: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentityStatus {
    pub registered: bool,
    pub verified: bool,
}

// =============================================================================
// Delegated approvals
// =============================================================================

/// An EIP-191 signature over a transfer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateSignature {
    pub signer: Address,
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateApproval {
    pub approvals: Vec<Address>,
    pub signatures: Vec<DelegateSignature>,
    pub transfer: TransferDetails,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const A: Address = address!("00000000000000000000000000000000000000aa");
    const B: Address = address!("00000000000000000000000000000000000000bb");
    const R: Address = address!("00000000000000000000000000000000000000cc");

    #[test]
    fn approver_order_is_additional_recipient_agent() {
        let criteria = Criteria {
            include_recipient: true,
            include_agent: true,
            sequential: false,
            additional_approvers: vec![A, B],
        };
        assert_eq!(
            criteria.approvers_for(R),
            vec![
                ApproverSlot::Wallet(A),
                ApproverSlot::Wallet(B),
                ApproverSlot::Wallet(R),
                ApproverSlot::AnyAgent,
            ]
        );
        assert!(Criteria::default().approvers_for(R).is_empty());
    }

    #[test]
    fn listed_recipient_is_not_doubled() {
        let criteria = Criteria {
            include_recipient: true,
            include_agent: false,
            sequential: false,
            additional_approvers: vec![R, A],
        };
        assert_eq!(
            criteria.approvers_for(R),
            vec![ApproverSlot::Wallet(R), ApproverSlot::Wallet(A)]
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(TransferStatus::from_u8(1).unwrap(), TransferStatus::Completed);
        assert_eq!(TransferStatus::Cancelled.as_u8(), 2);
        assert!(matches!(TransferStatus::from_u8(9), Err(SdkError::Contract(_))));
        assert!(!TransferStatus::Pending.is_terminal());
    }

    #[test]
    fn transfer_id_parses_and_prints() {
        let id = TransferId(B256::repeat_byte(0x11));
        assert_eq!(id.to_string().parse::<TransferId>().unwrap(), id);
        assert!("0x12".parse::<TransferId>().is_err());
    }

    #[test]
    fn agent_slot_matches_by_role() {
        assert!(ApproverSlot::AnyAgent.matches(A, true));
        assert!(!ApproverSlot::AnyAgent.matches(A, false));
        assert!(ApproverSlot::Wallet(A).matches(A, false));
        assert!(!ApproverSlot::Wallet(A).matches(B, true));
    }
}
