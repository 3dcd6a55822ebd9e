// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Asset registration commands
//!
//! Commands: add

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::daemon::{check_daemon_running, DaemonClient, DaemonStatus};

#[derive(Subcommand)]
pub enum AssetCommand {
    /// Register an asset with the running daemon's policy engine
    Add {
        /// Human-readable name for the asset
        #[arg(value_name = "NAME")]
        name: String,

        /// Asset kind: host, domain, or vm
        #[arg(long, default_value = "host")]
        kind: String,

        /// IP address, domain name, or VM identifier
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

pub async fn handle_command(command: AssetCommand, host: &str, port: u16) -> Result<()> {
    match check_daemon_running(host, port).await {
        Ok(DaemonStatus::Running { .. }) => {}
        _ => {
            println!("{}", "Asset registration requires the daemon to be running.".red());
            println!("Run 'aegis daemon start' first.");
            return Ok(());
        }
    }

    let client = DaemonClient::new(host, port);

    match command {
        AssetCommand::Add { name, kind, value } => {
            client.add_asset(&name, &kind, &value).await?;
            println!("{}", format!("\u{2713} Asset added: {name} ({kind}: {value})").green());
            Ok(())
        }
    }
}
