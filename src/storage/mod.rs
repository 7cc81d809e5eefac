// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage Module
//!
//! The SDK keeps one piece of local state: the deployment history of each
//! network, a JSON document rewritten atomically on every change.
//!
//! ## Storage Layout
//!
//! ```text
//! .ctrex/
//!   localhost/
//!     history.json
//!   sepolia/
//!     history.json
//! ```

pub mod history;
pub mod json_store;
pub mod paths;

pub use history::{DeploymentHistory, DeploymentKind, HistoryStore};
pub use json_store::{JsonFile, StorageError, StorageResult};
pub use paths::StoragePaths;
