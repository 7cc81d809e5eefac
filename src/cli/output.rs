// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rendering of command results.
//!
//! Results go to stdout, errors to stderr. `--format json` prints a single
//! JSON document either way.

use std::fmt::Write as _;

use alloy::primitives::{Address, U256};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};

use crate::dva::{
    AmountHandle, Criteria, DelegateApproval, DelegateSignature, InitiatedTransfer,
    ManagerHandle, TransferDetails, TransferId,
};
use crate::error::SdkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// A row of `ctrex wallets`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRow {
    pub index: u32,
    pub address: Address,
    pub aliases: Vec<String>,
}

/// What a command produced.
#[derive(Debug, Clone)]
pub enum Report {
    Manager(ManagerHandle),
    Criteria { manager: Address, criteria: Criteria },
    TransferId {
        transfer_id: TransferId,
        nonce: U256,
    },
    Allowance {
        owner: Address,
        manager: Address,
        amount: u64,
        handle: AmountHandle,
    },
    Initiated(InitiatedTransfer),
    Signatures {
        transfer_id: TransferId,
        signatures: Vec<DelegateSignature>,
    },
    Delegated(DelegateApproval),
    Transfer(TransferDetails),
    Balance {
        token: Address,
        holder: Address,
        balance: u64,
    },
    Wallets(Vec<WalletRow>),
    History(Value),
}

impl Report {
    pub fn to_json(&self) -> Value {
        match self {
            Report::Manager(handle) => to_value(handle),
            Report::Criteria { manager, criteria } => {
                json!({ "manager": manager, "criteria": criteria })
            }
            Report::TransferId { transfer_id, nonce } => {
                json!({ "transferId": transfer_id, "nonce": nonce.to_string() })
            }
            Report::Allowance {
                owner,
                manager,
                amount,
                handle,
            } => json!({
                "owner": owner,
                "spender": manager,
                "amount": amount,
                "handle": handle,
            }),
            Report::Initiated(initiated) => to_value(initiated),
            Report::Signatures {
                transfer_id,
                signatures,
            } => json!({ "transferId": transfer_id, "signatures": signatures }),
            Report::Delegated(result) => to_value(result),
            Report::Transfer(details) => to_value(details),
            Report::Balance {
                token,
                holder,
                balance,
            } => json!({ "token": token, "holder": holder, "balance": balance }),
            Report::Wallets(rows) => to_value(rows),
            Report::History(value) => value.clone(),
        }
    }

    pub fn to_human(&self) -> String {
        let mut out = String::new();
        match self {
            Report::Manager(handle) => {
                let verb = if handle.deployed { "Deployed" } else { "Reusing" };
                let _ = writeln!(out, "{verb} transfer manager {}", handle.manager);
                let _ = writeln!(out, "  token:    {}", handle.token);
                let _ = writeln!(out, "  identity: {} (country {})", handle.identity, handle.country);
                let _ = writeln!(out, "  agent:    {}", handle.agent);
            }
            Report::Criteria { manager, criteria } => {
                let _ = writeln!(out, "Approval criteria of {manager}");
                let _ = writeln!(out, "  include recipient: {}", criteria.include_recipient);
                let _ = writeln!(out, "  include agent:     {}", criteria.include_agent);
                let _ = writeln!(out, "  sequential:        {}", criteria.sequential);
                for (i, approver) in criteria.additional_approvers.iter().enumerate() {
                    let _ = writeln!(out, "  approver #{i}:       {approver}");
                }
            }
            Report::TransferId { transfer_id, .. } => {
                let _ = writeln!(out, "{transfer_id}");
            }
            Report::Allowance {
                owner,
                manager,
                amount,
                handle,
            } => {
                let _ = writeln!(out, "{owner} allowed {manager} to escrow {amount}");
                let _ = writeln!(out, "  handle: {handle}");
            }
            Report::Initiated(initiated) => {
                let _ = writeln!(out, "Initiated transfer {}", initiated.transfer_id);
                let _ = writeln!(out, "  nonce:  {}", initiated.nonce);
                let _ = writeln!(out, "  amount: {}", initiated.amount_handle);
            }
            Report::Signatures {
                transfer_id,
                signatures,
            } => {
                let _ = writeln!(out, "Signatures for {transfer_id}");
                for s in signatures {
                    let _ = writeln!(out, "  {} {}", s.signer, s.signature);
                }
            }
            Report::Delegated(result) => {
                let _ = writeln!(out, "Relayed {} approval(s)", result.approvals.len());
                write_transfer(&mut out, &result.transfer);
            }
            Report::Transfer(details) => write_transfer(&mut out, details),
            Report::Balance {
                token,
                holder,
                balance,
            } => {
                let _ = writeln!(out, "{holder} holds {balance} of {token}");
            }
            Report::Wallets(rows) => {
                for row in rows {
                    let _ = writeln!(out, "{:>3}  {}  {}", row.index, row.address, row.aliases.join(", "));
                }
            }
            Report::History(value) => {
                let _ = writeln!(out, "{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
        out
    }
}

fn write_transfer(out: &mut String, t: &TransferDetails) {
    let _ = writeln!(out, "Transfer {} ({})", t.transfer_id, t.status);
    let _ = writeln!(out, "  manager:   {}", t.manager);
    let _ = writeln!(out, "  sender:    {}", t.sender);
    let _ = writeln!(out, "  recipient: {}", t.recipient);
    let _ = writeln!(out, "  nonce:     {}", t.nonce);
    let _ = writeln!(out, "  amount:    {}", t.amount_handle);
    for (i, slot) in t.approvers.iter().enumerate() {
        let mark = if slot.approved { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] #{i} {}", slot.slot);
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "serializationError": e.to_string() }))
}

pub fn print(report: &Report, format: OutputFormat) {
    match format {
        OutputFormat::Human => print!("{}", report.to_human()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report.to_json()).unwrap_or_default()
        ),
    }
}

pub fn error_json(err: &SdkError) -> Value {
    json!({
        "error": err.kind(),
        "message": err.to_string(),
        "retryable": err.is_retryable(),
    })
}

pub fn print_error(err: &SdkError, format: OutputFormat) {
    match format {
        OutputFormat::Human => {
            eprintln!("error: {err}");
            if err.is_retryable() {
                eprintln!("(retrying the same command may succeed)");
            }
        }
        OutputFormat::Json => eprintln!("{}", error_json(err)),
    }
}
