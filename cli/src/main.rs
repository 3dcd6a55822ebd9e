// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Agent Host CLI
//!
//! The `aegis` binary drives the Policy Engine / Plugin Manager / Agent
//! Executor / Orchestrator stack, either by talking to a running daemon or
//! by embedding the orchestrator in-process for one-shot invocations.
//!
//! ## Architecture
//!
//! This CLI follows a **CLI-first** design with daemon capabilities:
//!
//! - **Default mode**: CLI commands delegate to the daemon if running
//! - **Daemon mode**: `aegis --daemon` runs the orchestrator as a background
//!   HTTP service
//! - **Detection**: PID file plus an HTTP health check
//!
//! ## Commands
//!
//! - `aegis daemon start|stop|status|install|uninstall` - daemon lifecycle
//! - `aegis asset add` - register scan targets with the running daemon
//! - `aegis recon run` - passive recon over registered assets
//! - `aegis scan plan|exec|watch` - plan and execute active scan steps
//! - `aegis report generate` - assemble the findings/violations report
//! - `aegis config show|validate|generate` - configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

mod commands;
mod config;
mod daemon;
mod embedded;

use commands::{AssetCommand, ConfigCommand, DaemonCommand, ReconCommand, ReportCommand, ScanCommand};

/// AEGIS Agent Host - drives agent-assisted penetration test assessments
#[derive(Parser)]
#[command(name = "aegis")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Run as background daemon service
    #[arg(long, global = true)]
    daemon: bool,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "AEGIS_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP API port (default: 8000)
    #[arg(long, global = true, env = "AEGIS_PORT", default_value = "8000")]
    port: u16,

    /// HTTP API host (default: 127.0.0.1)
    #[arg(long, global = true, env = "AEGIS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AEGIS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage daemon lifecycle
    #[command(name = "daemon")]
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },

    /// Register assets to scan
    #[command(name = "asset")]
    Asset {
        #[command(subcommand)]
        command: AssetCommand,
    },

    /// Run passive reconnaissance
    #[command(name = "recon")]
    Recon {
        #[command(subcommand)]
        command: ReconCommand,
    },

    /// Plan and execute active scan steps
    #[command(name = "scan")]
    Scan {
        #[command(subcommand)]
        command: ScanCommand,
    },

    /// Generate the assessment report
    #[command(name = "report")]
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    if cli.daemon {
        info!("Starting AEGIS daemon");
        return daemon::start_daemon(cli.config, cli.host, cli.port).await;
    }

    match cli.command {
        Some(Commands::Daemon { command }) => commands::daemon::handle_command(command, cli.config, &cli.host, cli.port).await,
        Some(Commands::Asset { command }) => commands::asset::handle_command(command, &cli.host, cli.port).await,
        Some(Commands::Recon { command }) => commands::recon::handle_command(command, &cli.host, cli.port).await,
        Some(Commands::Scan { command }) => commands::scan::handle_command(command, &cli.host, cli.port).await,
        Some(Commands::Report { command }) => commands::report::handle_command(command, &cli.host, cli.port).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
