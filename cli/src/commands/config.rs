// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::AegisConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file discovery paths
        #[arg(long)]
        paths: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a sample configuration
    Generate {
        /// Output path (default: ./aegis-config.yaml)
        #[arg(short, long, default_value = "./aegis-config.yaml")]
        output: PathBuf,

        /// Include commented examples
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = AegisConfig::load_or_default(config_override.clone()).context("failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. AEGIS_CONFIG_PATH: {}",
            std::env::var("AEGIS_CONFIG_PATH").unwrap_or_else(|_| "(not set)".to_string()).dimmed()
        );
        println!("  3. ./aegis-config.yaml");
        println!("  4. ~/.aegis/config.yaml");
        println!("  5. /etc/aegis/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Mode:".bold());
    println!("  Lab mode: {}", config.lab_mode);
    println!("  Evidence dir: {}", config.evidence_dir);
    println!();

    println!("{}", "Policy:".bold());
    println!(
        "  Rate limit: {}/adapter, {}/global per {}s",
        config.policy.rate_limiting.max_requests,
        config.policy.rate_limiting.global_max_requests,
        config.policy.rate_limiting.window_size_secs
    );
    println!("  Authorized networks: {}", config.policy.target_validation.authorized_networks.len());
    println!("  Authorized domains: {}", config.policy.target_validation.authorized_domains.len());
    println!("  Allowed exploits: {}", config.policy.allowed_exploits.len());
    println!();

    println!("{}", "LLM providers:".bold());
    for provider in &config.llm.providers {
        println!("  {} ({})", provider.name.bold(), provider.provider_type);
        for model in &provider.models {
            println!("    {} -> {}", model.alias, model.model);
        }
    }
    if config.llm.providers.is_empty() {
        println!("  {}", "(none configured)".dimmed());
    }
    println!();

    println!("{}", "Adapters:".bold());
    for adapter in &config.adapters {
        println!("  {} -> {}", adapter.name.bold(), adapter.command);
    }
    if config.adapters.is_empty() {
        println!("  {}", "(none configured beyond the built-in defaults)".dimmed());
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    AegisConfig::load_or_default(config_path).context("configuration validation failed")?;

    println!("{}", "\u{2713} Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample).with_context(|| format!("failed to write config to {:?}", output))?;

    println!("{}", format!("\u{2713} Configuration generated: {}", output.display()).green());

    Ok(())
}
