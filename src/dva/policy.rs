// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Approval rules.
//!
//! Shared by the orchestrator, which pre-validates against a freshly fetched
//! transfer before sending anything, and by [`super::MemoryLedger`], which
//! enforces the same rules authoritatively.
//!
//! Rules are checked in a fixed order so that the reported error is stable:
//!
//! 1. the transfer is pending,
//! 2. the approver fills some slot,
//! 3. the approver has not approved already,
//! 4. under sequential criteria, the approver fills the first open slot.

use alloy::primitives::Address;

use super::types::{Approval, Transfer, TransferStatus};
use crate::error::{SdkError, SdkResult};

pub struct ApprovalPolicy;

impl ApprovalPolicy {
    /// Slot index `approver` would fill, or the rule it breaks.
    ///
    /// `is_agent` says whether `approver` holds the token agent role, which
    /// is what the agent slot matches on.
    pub fn check(transfer: &Transfer, approver: Address, is_agent: bool) -> SdkResult<usize> {
        if transfer.status != TransferStatus::Pending {
            return Err(SdkError::AlreadyResolved {
                transfer_id: transfer.id,
                status: transfer.status.to_string(),
            });
        }

        if !transfer
            .slots
            .iter()
            .any(|s| s.slot.matches(approver, is_agent))
        {
            return Err(SdkError::NotAnApprover {
                transfer_id: transfer.id,
                approver,
            });
        }

        if transfer.has_approved(approver) {
            return Err(SdkError::DuplicateApproval {
                transfer_id: transfer.id,
                approver,
            });
        }

        if transfer.sequential {
            return match transfer.next_unapproved() {
                Some((index, next)) if next.slot.matches(approver, is_agent) => Ok(index),
                Some((_, next)) => Err(SdkError::OutOfOrderApproval {
                    transfer_id: transfer.id,
                    approver,
                    expected: next.slot.to_string(),
                }),
                None => Err(SdkError::DuplicateApproval {
                    transfer_id: transfer.id,
                    approver,
                }),
            };
        }

        // Every slot this approver matches is already taken (an agent slot
        // filled by another agent).
        transfer
            .slots
            .iter()
            .position(|s| !s.approved && s.slot.matches(approver, is_agent))
            .ok_or(SdkError::DuplicateApproval {
                transfer_id: transfer.id,
                approver,
            })
    }

    /// Record `approval` in `slot`. Returns whether every slot is now approved.
    ///
    /// The approval also fills every other open slot the approver matches,
    /// so a listed agent covers the agent slot as well.
    pub fn apply(transfer: &mut Transfer, slot: usize, approval: Approval, is_agent: bool) -> bool {
        let approver = approval.approver;
        for (index, state) in transfer.slots.iter_mut().enumerate() {
            if index == slot || (!state.approved && state.slot.matches(approver, is_agent)) {
                state.approved = true;
            }
        }
        transfer.approvals.push(Approval { slot, ..approval });
        transfer.version += 1;
        transfer.fully_approved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dva::types::{AmountHandle, ApproverSlot, Criteria, SlotState, TransferId};
    use alloy::primitives::{address, B256, U256};

    const A: Address = address!("00000000000000000000000000000000000000aa");
    const B: Address = address!("00000000000000000000000000000000000000bb");
    const C: Address = address!("00000000000000000000000000000000000000cc");
    const SENDER: Address = address!("0000000000000000000000000000000000000001");
    const AGENT: Address = address!("0000000000000000000000000000000000000a01");
    const OTHER_AGENT: Address = address!("0000000000000000000000000000000000000a02");

    fn transfer(criteria: &Criteria, recipient: Address) -> Transfer {
        Transfer {
            id: TransferId(B256::repeat_byte(1)),
            manager: Address::ZERO,
            token: Address::ZERO,
            sender: SENDER,
            recipient,
            amount_handle: AmountHandle(B256::repeat_byte(2)),
            nonce: U256::ZERO,
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
            version: 0,
        }
    }

    fn approve(t: &mut Transfer, approver: Address, is_agent: bool) -> SdkResult<bool> {
        let slot = ApprovalPolicy::check(t, approver, is_agent)?;
        Ok(ApprovalPolicy::apply(
            t,
            slot,
            Approval {
                approver,
                slot,
                signature: None,
            },
            is_agent,
        ))
    }

    fn sequential_abc() -> Transfer {
        let criteria = Criteria {
            include_recipient: false,
            include_agent: false,
            sequential: true,
            additional_approvers: vec![A, B, C],
        };
        transfer(&criteria, C)
    }

    #[test]
    fn sequential_rejects_skipping_ahead() {
        let mut t = sequential_abc();
        let err = ApprovalPolicy::check(&t, B, false).unwrap_err();
        assert!(matches!(err, SdkError::OutOfOrderApproval { approver, .. } if approver == B));

        assert!(!approve(&mut t, A, false).unwrap());
        assert!(matches!(
            ApprovalPolicy::check(&t, C, false),
            Err(SdkError::OutOfOrderApproval { .. })
        ));
        assert!(!approve(&mut t, B, false).unwrap());
        assert!(approve(&mut t, C, false).unwrap());
        assert_eq!(t.version, 3);
        assert_eq!(
            t.approvals.iter().map(|a| a.approver).collect::<Vec<_>>(),
            vec![A, B, C]
        );
    }

    #[test]
    fn unordered_accepts_any_order() {
        let criteria = Criteria {
            include_recipient: true,
            include_agent: true,
            sequential: false,
            additional_approvers: vec![],
        };
        let mut t = transfer(&criteria, B);
        assert!(!approve(&mut t, AGENT, true).unwrap());
        assert!(approve(&mut t, B, false).unwrap());
    }

    #[test]
    fn non_approver_is_rejected() {
        let t = sequential_abc();
        assert!(matches!(
            ApprovalPolicy::check(&t, SENDER, false),
            Err(SdkError::NotAnApprover { .. })
        ));
    }

    #[test]
    fn duplicate_is_rejected_before_ordering() {
        let mut t = sequential_abc();
        approve(&mut t, A, false).unwrap();
        assert!(matches!(
            ApprovalPolicy::check(&t, A, false),
            Err(SdkError::DuplicateApproval { .. })
        ));
    }

    #[test]
    fn agent_slot_is_filled_once() {
        let criteria = Criteria {
            include_recipient: true,
            include_agent: true,
            sequential: false,
            additional_approvers: vec![],
        };
        let mut t = transfer(&criteria, B);
        approve(&mut t, AGENT, true).unwrap();
        assert!(matches!(
            ApprovalPolicy::check(&t, OTHER_AGENT, true),
            Err(SdkError::DuplicateApproval { .. })
        ));
    }

    #[test]
    fn resolved_transfer_rejects_everything() {
        let mut t = sequential_abc();
        t.status = TransferStatus::Cancelled;
        assert!(matches!(
            ApprovalPolicy::check(&t, A, false),
            Err(SdkError::AlreadyResolved { status, .. }) if status == "cancelled"
        ));
    }

    #[test]
    fn listed_agent_fills_its_slot_and_the_agent_slot() {
        let criteria = Criteria {
            include_recipient: true,
            include_agent: true,
            sequential: false,
            additional_approvers: vec![AGENT],
        };
        let mut t = transfer(&criteria, B);
        assert_eq!(
            t.slots.iter().map(|s| s.slot).collect::<Vec<_>>(),
            vec![
                ApproverSlot::Wallet(AGENT),
                ApproverSlot::Wallet(B),
                ApproverSlot::AnyAgent
            ]
        );
        assert!(!approve(&mut t, AGENT, true).unwrap());
        assert!(t.slots[0].approved && t.slots[2].approved);
        assert_eq!(t.approvals.len(), 1);
        assert!(matches!(
            ApprovalPolicy::check(&t, OTHER_AGENT, true),
            Err(SdkError::DuplicateApproval { .. })
        ));
        assert!(approve(&mut t, B, false).unwrap());
    }

    #[test]
    fn sequential_listed_agent_completes_in_one_step() {
        let criteria = Criteria {
            include_recipient: false,
            include_agent: true,
            sequential: true,
            additional_approvers: vec![AGENT],
        };
        let mut t = transfer(&criteria, B);
        assert!(approve(&mut t, AGENT, true).unwrap());
        assert_eq!(t.version, 1);
    }

    #[test]
    fn listed_recipient_has_a_single_slot() {
        let criteria = Criteria {
            include_recipient: true,
            include_agent: false,
            sequential: true,
            additional_approvers: vec![A, B],
        };
        let mut t = transfer(&criteria, B);
        assert_eq!(t.slots.len(), 2);
        assert!(!approve(&mut t, A, false).unwrap());
        assert!(approve(&mut t, B, false).unwrap());
    }
}
