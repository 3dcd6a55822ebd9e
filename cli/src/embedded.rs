// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process execution mode: builds the Policy Engine, Plugin Manager and
//! Orchestrator directly in the CLI process instead of talking to a daemon
//! over HTTP. Used whenever `check_daemon_running` reports the daemon is
//! not reachable.

use std::sync::Arc;

use anyhow::{Context, Result};

use aegis_orchestrator_core::application::llm_client::LLMClient;
use aegis_orchestrator_core::application::orchestrator::Orchestrator;
use aegis_orchestrator_core::application::plugin_manager::PluginManager;
use aegis_orchestrator_core::domain::llm::LLMProvider;
use aegis_orchestrator_core::domain::policy::PolicyEngine;
use aegis_orchestrator_core::infrastructure::command_adapter::CommandAdapter;
use aegis_orchestrator_core::infrastructure::llm::registry::ProviderRegistry;
use aegis_orchestrator_core::infrastructure::process_runner::ProcessRunner;

use crate::config::AegisConfig;

/// Adapts [`ProviderRegistry`] to the single-provider [`LLMClient`]
/// contract by resolving through the `"default"` model alias.
struct RegistryProvider {
    registry: Arc<ProviderRegistry>,
}

#[async_trait::async_trait]
impl LLMProvider for RegistryProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &aegis_orchestrator_core::domain::llm::GenerationOptions,
    ) -> Result<aegis_orchestrator_core::domain::llm::GenerationResponse, aegis_orchestrator_core::domain::llm::LLMError>
    {
        self.registry.generate("default", prompt, options).await
    }

    async fn health_check(&self) -> Result<(), aegis_orchestrator_core::domain::llm::LLMError> {
        let results = self.registry.health_check_all().await;
        results.into_values().next().unwrap_or(Ok(()))
    }
}

/// Builds one [`Orchestrator`] ready to run passive recon / active scans
/// against the assets it's given, wired from [`AegisConfig`].
pub fn build_orchestrator(config: &AegisConfig) -> Result<Orchestrator> {
    let policy = Arc::new(PolicyEngine::new(config.policy.clone(), config.lab_mode));

    let plugins = Arc::new(PluginManager::new(Some(policy.clone())));
    let runner = Arc::new(ProcessRunner::new());
    for spec in &config.adapters {
        let mut spec = spec.clone();
        if spec.evidence_dir.is_empty() || spec.evidence_dir == "evidence" {
            spec.evidence_dir = config.evidence_dir.clone();
        }
        let runner = runner.clone();
        plugins.register_factory(spec.name.clone(), move || {
            Ok(Arc::new(CommandAdapter::new(spec.clone(), runner.clone()))
                as Arc<dyn aegis_orchestrator_core::domain::adapter::Adapter>)
        });
    }
    for tool in DEFAULT_TOOL_NAMES {
        if config.adapters.iter().any(|a| a.name == *tool) {
            continue;
        }
        register_default_tool(&plugins, tool, runner.clone(), config.evidence_dir.clone());
    }

    let llm = if config.llm.providers.is_empty() {
        None
    } else {
        let registry = Arc::new(
            ProviderRegistry::from_config(&config.llm).context("failed to initialize LLM provider registry")?,
        );
        Some(Arc::new(LLMClient::new(Arc::new(RegistryProvider { registry }))))
    };

    Ok(Orchestrator::new(plugins, policy, llm))
}

/// Default passive/active tool names (spec §2 supplement) are given a
/// best-effort `CommandAdapter` binding to the like-named host binary when
/// the config doesn't declare its own. Missing binaries surface as a
/// `RunnerError::NotFound` at execution time, not at startup.
const DEFAULT_TOOL_NAMES: &[&str] = &["whois", "dns_lookup", "ssl_check", "nmap", "sqlmap", "gobuster"];

fn register_default_tool(
    plugins: &Arc<PluginManager>,
    name: &'static str,
    runner: Arc<ProcessRunner>,
    evidence_dir: String,
) {
    let (command, args): (&'static str, Vec<&'static str>) = match name {
        "whois" => ("whois", vec!["{target}"]),
        "dns_lookup" => ("dig", vec!["+short", "{target}"]),
        "ssl_check" => ("openssl", vec!["s_client", "-connect", "{target}:443"]),
        "nmap" => ("nmap", vec!["-sV", "{target}"]),
        "sqlmap" => ("sqlmap", vec!["-u", "{target}", "--batch"]),
        "gobuster" => ("gobuster", vec!["dir", "-u", "{target}", "-w", "/usr/share/wordlists/common.txt"]),
        _ => return,
    };

    plugins.register_factory(name, move || {
        let spec = aegis_orchestrator_core::infrastructure::command_adapter::CommandAdapterSpec {
            name: name.to_string(),
            version: String::new(),
            description: format!("default {name} binding"),
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_secs: 60,
            writes_evidence: true,
            evidence_dir: evidence_dir.clone(),
        };
        Ok(Arc::new(CommandAdapter::new(spec, runner.clone()))
            as Arc<dyn aegis_orchestrator_core::domain::adapter::Adapter>)
    });
}
