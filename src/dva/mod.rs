// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Delegated Validated Approval (DVA) transfers.
//!
//! A transfer is initiated against a transfer manager, which escrows the
//! confidential amount and snapshots the approvers required by its
//! criteria. Once every approver has signed off the manager executes the
//! transfer; until then the sender or a token agent may cancel it.

pub mod backend;
pub mod delegate;
pub mod memory;
pub mod onchain;
pub mod orchestrator;
pub mod policy;
pub mod transfer_id;
pub mod types;

pub use backend::DvaBackend;
pub use memory::MemoryLedger;
pub use onchain::OnchainBackend;
pub use orchestrator::{manager_key, DvaOrchestrator, Progress};
pub use policy::ApprovalPolicy;
pub use transfer_id::calculate_transfer_id;
pub use types::*;
