// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed contract bindings, one interface per contract role.
//!
//! Only the functions the SDK calls are declared. Amount parameters of the
//! confidential token and the DVA manager are 32-byte ciphertext handles.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IOwnable {
        function owner() external view returns (address);
    }

    #[sol(rpc)]
    interface IIdentityRegistry {
        function isVerified(address userAddress) external view returns (bool);
        function contains(address userAddress) external view returns (bool);
        function identity(address userAddress) external view returns (address);
        function investorCountry(address userAddress) external view returns (uint16);
        function isAgent(address account) external view returns (bool);
        function registerIdentity(address userAddress, address identity, uint16 country) external;
    }

    #[sol(rpc)]
    interface IConfidentialToken {
        function identityRegistry() external view returns (address);
        function isAgent(address account) external view returns (bool);
        function confidentialBalanceOf(address account) external view returns (bytes32);
        function approve(address spender, bytes32 encryptedAmount, bytes inputProof) external returns (bool);
    }

    #[sol(rpc)]
    interface IDVAManagerFactory {
        event TransferManagerDeployed(address indexed manager, address indexed token, address agent);

        function deployTransferManager(address token, address agent) external returns (address manager);
    }

    #[sol(rpc)]
    interface IDVATransferManager {
        // For an agent slot `wallet` is zero until an agent approves it.
        struct Approver {
            address wallet;
            bool anyTokenAgent;
            bool approved;
        }

        struct ApprovalCriteria {
            bool includeRecipientApprover;
            bool includeAgentApprover;
            bool sequentialApproval;
            address[] additionalApprovers;
        }

        struct TransferView {
            bytes32 transferID;
            address tokenAddress;
            address sender;
            address recipient;
            bytes32 amount;
            uint256 nonce;
            uint8 status;
            bool sequentialApproval;
            Approver[] approvers;
        }

        event TransferInitiated(bytes32 indexed transferID, address indexed sender, address indexed recipient, bytes32 amount, uint256 nonce);
        event TransferApproved(bytes32 indexed transferID, address indexed approver);
        event TransferCompleted(bytes32 indexed transferID);
        event TransferCancelled(bytes32 indexed transferID);

        error TransferNotFound(bytes32 transferID);
        error TransferNotPending(bytes32 transferID, uint8 status);
        error NotAnApprover(bytes32 transferID, address approver);
        error AlreadyApproved(bytes32 transferID, address approver);
        error OutOfOrderApproval(bytes32 transferID, address approver, address expected);
        error InvalidSignature(bytes32 transferID, uint256 signatureIndex);
        error OnlyManagerAgent(address caller);
        error OnlySenderOrAgent(address caller);
        error NotVerified(address account);
        error InsufficientAllowance(address owner, address spender);
        error ExecutionFailed(bytes32 transferID, string reason);

        function token() external view returns (address);
        function agent() external view returns (address);
        function getApprovalCriteria() external view returns (ApprovalCriteria memory);
        function setApprovalCriteria(bool includeRecipientApprover, bool includeAgentApprover, bool sequentialApproval, address[] calldata additionalApprovers) external;
        function getNextTxNonce() external view returns (uint256);
        function calculateTransferID(uint256 nonce, address sender, address recipient, bytes32 amount) external view returns (bytes32);
        function initiateTransfer(address recipient, bytes32 encryptedAmount, bytes calldata inputProof) external returns (bytes32 transferID);
        function approveTransfer(bytes32 transferID) external;
        function delegateApproveTransfer(bytes32 transferID, bytes[] calldata signatures) external;
        function cancelTransfer(bytes32 transferID) external;
        function getTransfer(bytes32 transferID) external view returns (TransferView memory);
    }
}
