// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy surfaced by every SDK operation.
//!
//! Each variant carries the offending identifiers so the CLI can print a
//! message an operator can act on. Nothing here is retried automatically.

use std::path::PathBuf;

use alloy::primitives::Address;

use crate::dva::types::TransferId;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Bad CLI/API input (not an address, not a number, ...).
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Wallet index {index} is out of range (derived wallets: {count})")]
    OutOfRange { index: i64, count: u32 },

    #[error("Unknown wallet alias: {0}")]
    UnknownAlias(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Wallet {address} cannot sign: {reason}")]
    NotOwner { address: Address, reason: String },

    #[error("Owner {owner} of contract {contract} matches no known wallet")]
    UnresolvableOwner { contract: Address, owner: Address },

    #[error("Permission denied: {account} {reason}")]
    Permission { account: Address, reason: String },

    #[error("Identity not verified: {account} {reason}")]
    NotVerifiedIdentity { account: Address, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transfer {transfer_id} is already {status}")]
    AlreadyResolved { transfer_id: TransferId, status: String },

    #[error("{approver} is not an approver of transfer {transfer_id}")]
    NotAnApprover { transfer_id: TransferId, approver: Address },

    #[error("{approver} has already approved transfer {transfer_id}")]
    DuplicateApproval { transfer_id: TransferId, approver: Address },

    #[error("{approver} cannot approve transfer {transfer_id} yet: {expected} must approve first")]
    OutOfOrderApproval {
        transfer_id: TransferId,
        approver: Address,
        expected: String,
    },

    #[error("Insufficient allowance: {owner} has not approved {spender} for {amount}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        amount: u64,
    },

    #[error("Invalid signature for transfer {transfer_id}: {reason}")]
    InvalidSignature { transfer_id: TransferId, reason: String },

    /// The approval criteria were met but the confidential transfer failed.
    /// The transfer stays pending; replaying the approval retries it.
    #[error("Execution of transfer {transfer_id} failed (transfer still pending, retry by re-approving): {reason}")]
    ExecutionFailed { transfer_id: TransferId, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Corrupt deployment history at {path}: {reason}")]
    CorruptHistory { path: PathBuf, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    /// Contract revert surfaced verbatim.
    #[error("Contract call reverted: {0}")]
    Contract(String),
}

pub type SdkResult<T> = Result<T, SdkError>;

impl From<StorageError> for SdkError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Corrupt { path, reason } => SdkError::CorruptHistory { path, reason },
            other => SdkError::Storage(other),
        }
    }
}

impl SdkError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn network(message: impl std::fmt::Display) -> Self {
        Self::Network(message.to_string())
    }

    pub fn permission(account: Address, reason: impl Into<String>) -> Self {
        Self::Permission {
            account,
            reason: reason.into(),
        }
    }

    pub fn not_verified(account: Address, reason: impl Into<String>) -> Self {
        Self::NotVerifiedIdentity {
            account,
            reason: reason.into(),
        }
    }

    /// Whether re-invoking the same command can succeed without other changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExecutionFailed { .. } | Self::Network(_))
    }

    /// Short machine-readable kind, used by the JSON output format.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::OutOfRange { .. } => "out_of_range",
            Self::UnknownAlias(_) => "unknown_alias",
            Self::InvalidKey(_) => "invalid_key",
            Self::NotOwner { .. } => "not_owner",
            Self::UnresolvableOwner { .. } => "unresolvable_owner",
            Self::Permission { .. } => "permission",
            Self::NotVerifiedIdentity { .. } => "not_verified_identity",
            Self::NotFound(_) => "not_found",
            Self::AlreadyResolved { .. } => "already_resolved",
            Self::NotAnApprover { .. } => "not_an_approver",
            Self::DuplicateApproval { .. } => "duplicate_approval",
            Self::OutOfOrderApproval { .. } => "out_of_order_approval",
            Self::InsufficientAllowance { .. } => "insufficient_allowance",
            Self::InvalidSignature { .. } => "invalid_signature",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Network(_) => "network",
            Self::CorruptHistory { .. } => "corrupt_history",
            Self::Storage(_) => "storage",
            Self::Contract(_) => "contract",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, B256};

    #[test]
    fn constructors_set_message() {
        let err = SdkError::validation("not an address");
        assert_eq!(err.to_string(), "Invalid input: not an address");
        assert_eq!(err.kind(), "validation");

        let err = SdkError::not_found("transfer 0x01");
        assert_eq!(err.to_string(), "Not found: transfer 0x01");
    }

    #[test]
    fn messages_carry_identifiers() {
        let approver = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let transfer_id = TransferId(B256::repeat_byte(0xab));
        let err = SdkError::DuplicateApproval {
            transfer_id,
            approver,
        };
        let message = err.to_string();
        assert!(message.contains(&transfer_id.to_string()));
        assert!(message.contains(&approver.to_string()));
    }

    #[test]
    fn only_execution_and_network_failures_are_retryable() {
        let transfer_id = TransferId(B256::ZERO);
        assert!(SdkError::ExecutionFailed {
            transfer_id,
            reason: "compliance".into()
        }
        .is_retryable());
        assert!(SdkError::network("connection refused").is_retryable());
        assert!(!SdkError::UnknownAlias("zed".into()).is_retryable());
        assert!(!SdkError::AlreadyResolved {
            transfer_id,
            status: "completed".into()
        }
        .is_retryable());
    }
}
