// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `ctrex` command line.
//!
//! Wallet arguments accept anything [`crate::wallet::WalletSpec`] parses: an
//! index, an alias, an address, a private key, `keyfile:<path>`, or `auto`
//! for the owner of the contract the command targets.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use alloy::primitives::{Address, B256, U256};
use clap::{Args, Parser, Subcommand};

use crate::config::{
    CHAIN_ID_ENV, CONFIRMS_ENV, DATA_DIR_ENV, DEFAULT_CONFIRMS, DEFAULT_DATA_DIR,
    DEFAULT_GATEWAY_URL, DEFAULT_MNEMONIC, DEFAULT_NETWORK, DEFAULT_WALLET_COUNT,
    DVA_FACTORY_ENV, GATEWAY_URL_ENV, HISTORY_ENV, MNEMONIC_ENV, NETWORK_ENV, RPC_URL_ENV,
    WALLET_ALIASES_ENV, WALLET_COUNT_ENV,
};
use crate::dva::TransferId;
pub use output::{OutputFormat, Report};

#[derive(Debug, Parser)]
#[command(
    name = "ctrex",
    version,
    about = "Operate confidential T-REX tokens and DVA transfer managers"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Network name (`localhost`, `sepolia`, or a custom name with --rpc-url and --chain-id)
    #[arg(long, global = true, env = NETWORK_ENV, default_value = DEFAULT_NETWORK)]
    pub network: String,

    #[arg(long, global = true, env = RPC_URL_ENV)]
    pub rpc_url: Option<String>,

    #[arg(long, global = true, env = CHAIN_ID_ENV)]
    pub chain_id: Option<u64>,

    /// History file, overrides `{data-dir}/{network}/history.json`
    #[arg(long, global = true, env = HISTORY_ENV)]
    pub history: Option<PathBuf>,

    #[arg(long, global = true, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    #[arg(
        long,
        global = true,
        env = MNEMONIC_ENV,
        default_value = DEFAULT_MNEMONIC,
        hide_default_value = true,
        hide_env_values = true
    )]
    pub mnemonic: String,

    #[arg(long, global = true, env = WALLET_COUNT_ENV, default_value_t = DEFAULT_WALLET_COUNT)]
    pub wallet_count: u32,

    /// Alias table, e.g. `0=admin,deployer;3=bob`
    #[arg(long, global = true, env = WALLET_ALIASES_ENV)]
    pub wallet_aliases: Option<String>,

    #[arg(long, global = true, env = CONFIRMS_ENV, default_value_t = DEFAULT_CONFIRMS)]
    pub confirms: u64,

    #[arg(long, global = true, env = GATEWAY_URL_ENV, default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// DVA manager factory, defaults to the one recorded in history
    #[arg(long, global = true, env = DVA_FACTORY_ENV)]
    pub factory: Option<Address>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Deploy (or reuse) the DVA transfer manager of a token
    Create {
        #[arg(long)]
        token: Address,
        /// Identity contract the manager is registered with
        #[arg(long)]
        identity: Address,
        #[arg(long, default_value_t = 0)]
        country: u16,
        /// Agent bound to the manager
        #[arg(long, default_value = "token-agent")]
        agent: String,
        /// Wallet sending the transactions; must be a token agent
        #[arg(long, default_value = "token-agent")]
        caller: String,
    },

    /// Replace the approval criteria of a transfer manager
    SetApprovalCriteria {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        include_recipient: bool,
        #[arg(long)]
        include_agent: bool,
        #[arg(long)]
        sequential: bool,
        /// Additional approvers, in order (repeatable)
        #[arg(long = "approver")]
        approvers: Vec<String>,
        #[arg(long, default_value = "token-agent")]
        caller: String,
    },

    /// Compute a transfer id locally
    CalculateTransferId {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        nonce: U256,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        recipient: String,
        /// Encrypted amount handle
        #[arg(long)]
        handle: B256,
    },

    /// Allow a transfer manager to escrow tokens
    ApproveAllowance {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        amount: u64,
    },

    /// Initiate a transfer through a manager
    Initiate {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        amount: u64,
    },

    /// Sign a transfer id for each signer and relay the approvals in one request
    SignDelegateApprove {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        transfer_id: TransferId,
        /// Approving wallets (repeatable)
        #[arg(long = "signer", required = true)]
        signers: Vec<String>,
        /// Wallet relaying the signatures
        #[arg(long, default_value = "admin")]
        caller: String,
        /// Print the signatures without sending anything
        #[arg(long)]
        sign_only: bool,
    },

    /// Approve a pending transfer
    Approve {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        transfer_id: TransferId,
        #[arg(long)]
        approver: String,
    },

    /// Show a transfer
    GetTransfer {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        transfer_id: TransferId,
    },

    /// Cancel a pending transfer (sender or token agent)
    Cancel {
        #[arg(long)]
        manager: Address,
        #[arg(long)]
        transfer_id: TransferId,
        #[arg(long)]
        caller: String,
    },

    /// Decrypt a confidential balance
    Balance {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        holder: String,
    },

    /// List derived wallets and their aliases
    Wallets,

    /// Show the deployment history of the network
    History,
}

impl Command {
    /// Commands that work without an RPC endpoint.
    pub fn is_offline(&self) -> bool {
        matches!(
            self,
            Command::CalculateTransferId { .. } | Command::Wallets | Command::History
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sign_delegate_approve() {
        let id = TransferId(B256::repeat_byte(1));
        let cli = Cli::try_parse_from([
            "ctrex",
            "--format",
            "json",
            "sign-delegate-approve",
            "--manager",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "--transfer-id",
            &id.to_string(),
            "--signer",
            "bob",
            "--signer",
            "2",
            "--sign-only",
        ])
        .unwrap();
        assert_eq!(cli.global.format, OutputFormat::Json);
        match cli.command {
            Command::SignDelegateApprove {
                transfer_id,
                signers,
                sign_only,
                caller,
                ..
            } => {
                assert_eq!(transfer_id, id);
                assert_eq!(signers, vec!["bob", "2"]);
                assert!(sign_only);
                assert_eq!(caller, "admin");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ctrex", "wallets", "--wallet-count", "3"]).unwrap();
        assert_eq!(cli.global.wallet_count, 3);
        assert!(cli.command.is_offline());
    }

    #[test]
    fn signers_are_required() {
        assert!(Cli::try_parse_from([
            "ctrex",
            "sign-delegate-approve",
            "--manager",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "--transfer-id",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        ])
        .is_err());
    }
}
