// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Active scan planning and execution commands
//!
//! Commands: plan, exec, watch

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use aegis_orchestrator_core::domain::workflow::WorkflowStep;

use crate::daemon::{check_daemon_running, DaemonClient, DaemonStatus};

#[derive(Subcommand)]
pub enum ScanCommand {
    /// Ask the daemon to plan a scan against a target
    Plan {
        /// Target host or domain
        target: String,

        /// Scan mode: passive, active, or lab
        #[arg(long, default_value = "active")]
        mode: String,
    },

    /// Execute a single scan step against a target
    Exec {
        /// Tool to invoke (nmap, sqlmap, gobuster, ...)
        tool: String,

        /// Target host or domain
        target: String,

        /// Scan mode: passive, active, or lab
        #[arg(long, default_value = "active")]
        mode: String,

        /// Confirm execution of a step that requires approval
        #[arg(long)]
        approve: bool,

        /// Skip the approval gate (lab mode only)
        #[arg(long)]
        no_approval: bool,
    },

    /// Stream live executor/policy activity from the daemon
    Watch,
}

pub async fn handle_command(command: ScanCommand, host: &str, port: u16) -> Result<()> {
    match check_daemon_running(host, port).await {
        Ok(DaemonStatus::Running { .. }) => {}
        _ => {
            println!("{}", "Scanning requires the daemon to be running.".red());
            println!("Run 'aegis daemon start' first.");
            return Ok(());
        }
    }

    let client = DaemonClient::new(host, port);

    match command {
        ScanCommand::Plan { target, mode } => {
            let steps = client.plan_active_scans(&mode, &target).await?;
            print_plan(&steps);
            Ok(())
        }
        ScanCommand::Exec { tool, target, mode, mut approve, no_approval } => {
            let approval_required = !no_approval;
            if approval_required && mode != "lab" && !approve {
                approve = Confirm::new()
                    .with_prompt(format!("Run {tool} against {target}? This may be an active/exploit step"))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !approve {
                    println!("{}", "Aborted.".yellow());
                    return Ok(());
                }
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
            spinner.set_message(format!("running {tool} against {target}..."));
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));

            let step = WorkflowStep::new(tool, target);
            let result = client.execute_scan_step(step, &mode, approval_required, approve).await;
            spinner.finish_and_clear();

            match result? {
                Some(result) => print_result(&result),
                None => println!("{}", "Step rejected by policy engine; target not authorized.".red()),
            }
            Ok(())
        }
        ScanCommand::Watch => client.watch_events().await,
    }
}

fn print_plan(steps: &[WorkflowStep]) {
    if steps.is_empty() {
        println!("{}", "No steps planned.".yellow());
        return;
    }
    println!("{}", format!("Planned {} step(s):", steps.len()).bold());
    for step in steps {
        println!("  {} {} -> {}", step.name.bold(), step.tool, step.target);
        if let Some(rationale) = &step.rationale {
            println!("    {}", rationale.dimmed());
        }
    }
}

fn print_result(result: &aegis_orchestrator_core::application::orchestrator::ScanResult) {
    let status_colored = match result.status.as_str() {
        "completed" => result.status.green(),
        "failed" => result.status.red(),
        _ => result.status.normal(),
    };
    println!("{} [{}]", result.step_name.bold(), status_colored);
    if let Some(error) = &result.error_message {
        println!("  error: {}", error.red());
    }
    println!("  findings: {}", result.findings.len());
    if let Some(path) = &result.evidence_path {
        println!("  evidence: {path}");
    }
    if result.findings.is_empty() {
        if let Value::Null = result.raw_output {
        } else {
            println!("  raw: {}", result.raw_output);
        }
    }
}
