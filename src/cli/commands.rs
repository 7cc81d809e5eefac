// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command execution.

use alloy::primitives::Address;

use super::output::{Report, WalletRow};
use super::{Cli, Command, GlobalArgs};
use crate::blockchain::{HttpGateway, NetworkConfig};
use crate::chain_config::{ChainConfig, ChainParams, WalletParams};
use crate::config::DVA_FACTORY_PURPOSE;
use crate::dva::{CreateManager, Criteria, DvaOrchestrator, OnchainBackend};
use crate::error::SdkResult;
use crate::storage::{DeploymentKind, StoragePaths};
use crate::wallet::{AliasTable, SigningWallet, WalletSpec};

/// Build the chain context described by the global flags.
pub fn load_config(global: &GlobalArgs) -> SdkResult<ChainConfig> {
    let network = NetworkConfig::resolve(
        &global.network,
        global.rpc_url.as_deref(),
        global.chain_id,
    )?;
    let aliases = match global.wallet_aliases.as_deref() {
        Some(raw) => AliasTable::parse(raw)?,
        None => AliasTable::builtin(),
    };
    let history_path = global
        .history
        .clone()
        .unwrap_or_else(|| StoragePaths::new(&global.data_dir).history_file(&network.name));

    let params = ChainParams {
        network,
        confirms: global.confirms,
        wallets: WalletParams {
            mnemonic: global.mnemonic.clone(),
            count: global.wallet_count,
            aliases,
        },
    };
    ChainConfig::load(params, &history_path)
}

fn orchestrator(
    config: &ChainConfig,
    global: &GlobalArgs,
) -> SdkResult<DvaOrchestrator<OnchainBackend>> {
    let factory = global
        .factory
        .or_else(|| config.lookup_deployment(DeploymentKind::Factory, DVA_FACTORY_PURPOSE));
    let backend = OnchainBackend::new(
        config.network().rpc_url.clone(),
        config.provider().clone(),
        HttpGateway::new(&global.gateway_url)?,
        config.confirms(),
        factory,
    );
    Ok(DvaOrchestrator::new(backend))
}

async fn signer(config: &ChainConfig, raw: &str, auto_target: Address) -> SdkResult<SigningWallet> {
    let spec = WalletSpec::parse_with_auto(raw, Some(auto_target))?;
    config.signing_wallet(&spec).await
}

fn address_of(config: &ChainConfig, raw: &str) -> SdkResult<Address> {
    let spec: WalletSpec = raw.parse()?;
    Ok(config.resolver().resolve(&spec)?.address)
}

pub async fn run(cli: Cli) -> SdkResult<Report> {
    let Cli { global, command } = cli;
    let mut config = load_config(&global)?;

    if command.is_offline() {
        return run_offline(&config, command);
    }

    config.ensure_chain_id().await?;
    let dva = orchestrator(&config, &global)?;
    tracing::debug!(network = %config.network().name, "Connected");

    match command {
        Command::Create {
            token,
            identity,
            country,
            agent,
            caller,
        } => {
            let caller = signer(&config, &caller, token).await?;
            let agent = address_of(&config, &agent)?;
            let handle = dva
                .create(
                    &caller,
                    CreateManager {
                        token,
                        identity,
                        agent,
                        country,
                    },
                    config.history_mut(),
                )
                .await?;
            Ok(Report::Manager(handle))
        }

        Command::SetApprovalCriteria {
            manager,
            include_recipient,
            include_agent,
            sequential,
            approvers,
            caller,
        } => {
            let caller = signer(&config, &caller, manager).await?;
            let additional_approvers = approvers
                .iter()
                .map(|raw| address_of(&config, raw))
                .collect::<SdkResult<Vec<_>>>()?;
            let criteria = dva
                .set_approval_criteria(
                    &caller,
                    manager,
                    Criteria {
                        include_recipient,
                        include_agent,
                        sequential,
                        additional_approvers,
                    },
                )
                .await?;
            Ok(Report::Criteria { manager, criteria })
        }

        Command::ApproveAllowance {
            manager,
            owner,
            amount,
        } => {
            let owner = signer(&config, &owner, manager).await?;
            let handle = dva.approve_allowance(&owner, manager, amount).await?;
            Ok(Report::Allowance {
                owner: owner.address,
                manager,
                amount,
                handle,
            })
        }

        Command::Initiate {
            manager,
            sender,
            recipient,
            amount,
        } => {
            let sender = signer(&config, &sender, manager).await?;
            let recipient = address_of(&config, &recipient)?;
            let initiated = dva.initiate(&sender, manager, recipient, amount).await?;
            Ok(Report::Initiated(initiated))
        }

        Command::SignDelegateApprove {
            manager,
            transfer_id,
            signers,
            caller,
            sign_only,
        } => {
            let mut wallets = Vec::with_capacity(signers.len());
            for raw in &signers {
                wallets.push(signer(&config, raw, manager).await?);
            }
            if sign_only {
                let signatures = dva.sign_delegate_approvals(transfer_id, &wallets)?;
                return Ok(Report::Signatures {
                    transfer_id,
                    signatures,
                });
            }
            let caller = signer(&config, &caller, manager).await?;
            let result = dva
                .delegate_approve(manager, transfer_id, &wallets, &caller)
                .await?;
            Ok(Report::Delegated(result))
        }

        Command::Approve {
            manager,
            transfer_id,
            approver,
        } => {
            let approver = signer(&config, &approver, manager).await?;
            let details = dva.approve(manager, transfer_id, &approver).await?;
            Ok(Report::Transfer(details))
        }

        Command::GetTransfer {
            manager,
            transfer_id,
        } => Ok(Report::Transfer(
            dva.get_transfer(manager, transfer_id).await?,
        )),

        Command::Cancel {
            manager,
            transfer_id,
            caller,
        } => {
            let caller = signer(&config, &caller, manager).await?;
            let details = dva.cancel(&caller, manager, transfer_id).await?;
            Ok(Report::Transfer(details))
        }

        Command::Balance { token, holder } => {
            let holder = signer(&config, &holder, token).await?;
            let balance = dva.balance_of(&holder, token).await?;
            Ok(Report::Balance {
                token,
                holder: holder.address,
                balance,
            })
        }

        offline => run_offline(&config, offline),
    }
}

fn run_offline(config: &ChainConfig, command: Command) -> SdkResult<Report> {
    match command {
        Command::CalculateTransferId {
            manager,
            nonce,
            sender,
            recipient,
            handle,
        } => {
            let transfer_id = crate::dva::calculate_transfer_id(
                manager,
                nonce,
                address_of(config, &sender)?,
                address_of(config, &recipient)?,
                crate::dva::AmountHandle(handle),
            );
            Ok(Report::TransferId { transfer_id, nonce })
        }
        Command::Wallets => Ok(Report::Wallets(
            config
                .resolver()
                .wallets()
                .map(|w| WalletRow {
                    index: w.index,
                    address: w.address,
                    aliases: w.aliases.clone(),
                })
                .collect(),
        )),
        Command::History => Ok(Report::History(config.to_json())),
        other => Err(crate::error::SdkError::validation(format!(
            "{other:?} needs a network connection"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(dir: &std::path::Path, args: &[&str]) -> Cli {
        let data_dir = dir.display().to_string();
        let mut argv = vec!["ctrex", "--data-dir", data_dir.as_str(), "--network", "localhost"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn wallets_lists_derived_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(cli(dir.path(), &["--wallet-count", "3", "wallets"]))
            .await
            .unwrap();
        let Report::Wallets(rows) = report else {
            panic!("expected wallet listing");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].aliases, vec!["token-agent", "agent"]);
    }

    #[tokio::test]
    async fn history_is_created_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(cli(dir.path(), &["history"])).await.unwrap();
        assert!(dir.path().join("localhost").join("history.json").exists());
        let Report::History(value) = report else {
            panic!("expected history");
        };
        assert_eq!(value["network"], "localhost");
    }

    #[tokio::test]
    async fn calculate_transfer_id_resolves_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let handle = format!("{}", alloy::primitives::B256::repeat_byte(5));
        let args = [
            "calculate-transfer-id",
            "--manager",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "--nonce",
            "0",
            "--sender",
            "alice",
            "--recipient",
            "bob",
            "--handle",
            handle.as_str(),
        ];
        let Report::TransferId { transfer_id, .. } = run(cli(dir.path(), &args)).await.unwrap()
        else {
            panic!("expected transfer id");
        };
        let expected = crate::dva::calculate_transfer_id(
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap(),
            alloy::primitives::U256::ZERO,
            "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC".parse().unwrap(),
            "0x90F79bf6EB2c4f870365E785982E1f101E93b906".parse().unwrap(),
            crate::dva::AmountHandle(alloy::primitives::B256::repeat_byte(5)),
        );
        assert_eq!(transfer_id, expected);
    }

    #[tokio::test]
    async fn unknown_alias_fails_offline() {
        let dir = tempfile::tempdir().unwrap();
        let args = [
            "calculate-transfer-id",
            "--manager",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "--nonce",
            "0",
            "--sender",
            "mallory",
            "--recipient",
            "bob",
            "--handle",
            "0x0000000000000000000000000000000000000000000000000000000000000000",
        ];
        assert!(matches!(
            run(cli(dir.path(), &args)).await,
            Err(crate::error::SdkError::UnknownAlias(_))
        ));
    }
}
