// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Passive reconnaissance commands
//!
//! Commands: run

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::daemon::{check_daemon_running, DaemonClient, DaemonStatus};

#[derive(Subcommand)]
pub enum ReconCommand {
    /// Run passive recon over every asset currently registered with the daemon
    Run,
}

pub async fn handle_command(command: ReconCommand, host: &str, port: u16) -> Result<()> {
    match check_daemon_running(host, port).await {
        Ok(DaemonStatus::Running { .. }) => {}
        _ => {
            println!("{}", "Passive recon requires the daemon to be running.".red());
            println!("Run 'aegis daemon start' first, then 'aegis asset add' to register targets.");
            return Ok(());
        }
    }

    let ReconCommand::Run = command;

    let client = DaemonClient::new(host, port);
    let results = client.run_passive_recon().await?;

    if results.is_empty() {
        println!("{}", "No assets registered; nothing to recon.".yellow());
        return Ok(());
    }

    println!("{}", format!("Passive recon complete: {} step(s)", results.len()).bold());
    for result in &results {
        println!("  {} [{}] {} finding(s)", result.step_name.bold(), result.status, result.findings.len());
    }

    Ok(())
}
