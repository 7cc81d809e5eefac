// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use clap::Parser;
use ctrex_sdk::cli::{commands, output, Cli};
use ctrex_sdk::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cli = Cli::parse();
    let format = cli.global.format;

    match commands::run(cli).await {
        Ok(report) => {
            output::print(&report, format);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(kind = err.kind(), "Command failed");
            output::print_error(&err, format);
            ExitCode::FAILURE
        }
    }
}
