// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Thin wrapper around [`aegis_orchestrator_sdk::client::AegisClient`] for
//! the CLI's daemon-mode command handlers, plus SSE event pretty-printing
//! for `aegis scan watch`.

use anyhow::{Context, Result};
use colored::Colorize;
use tokio_stream::StreamExt;

use aegis_orchestrator_core::application::orchestrator::{Report, ScanResult};
use aegis_orchestrator_core::domain::events::{ExecutorActivityEvent, PolicyEvent};
use aegis_orchestrator_core::domain::workflow::WorkflowStep;
use aegis_orchestrator_sdk::client::AegisClient;

#[derive(Debug, Clone)]
pub struct DaemonClient {
    inner: AegisClient,
    base_url: String,
}

impl DaemonClient {
    pub fn new(host: &str, port: u16) -> Self {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}:{port}")
        } else {
            format!("http://{host}:{port}")
        };
        Self { inner: AegisClient::new(base_url.clone()), base_url }
    }

    pub async fn add_asset(&self, name: &str, kind: &str, value: &str) -> Result<()> {
        self.inner.add_asset(name, kind, value).await
    }

    pub async fn run_passive_recon(&self) -> Result<Vec<ScanResult>> {
        self.inner.run_passive_recon().await
    }

    pub async fn plan_active_scans(&self, mode: &str, target: &str) -> Result<Vec<WorkflowStep>> {
        self.inner.plan_active_scans(mode, target).await
    }

    pub async fn execute_scan_step(
        &self,
        step: WorkflowStep,
        mode: &str,
        approval_required: bool,
        approved: bool,
    ) -> Result<Option<ScanResult>> {
        self.inner.execute_scan_step(step, mode, approval_required, approved).await
    }

    pub async fn generate_report(&self, format: &str) -> Result<Report> {
        self.inner.generate_report(format).await
    }

    /// Streams `/events` and pretty-prints each one until the connection
    /// closes or the caller's process is interrupted.
    pub async fn watch_events(&self) -> Result<()> {
        let url = format!("{}/events", self.base_url);
        let response = reqwest::get(&url).await.context("failed to connect to event stream")?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("event stream read failed")?;
            for line in String::from_utf8_lossy(&chunk).lines() {
                if let Some(data) = line.strip_prefix("data:") {
                    print_event(data.trim());
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DomainEvent {
    Executor(ExecutorActivityEvent),
    Policy(PolicyEvent),
}

fn print_event(data: &str) {
    let Ok(event) = serde_json::from_str::<DomainEvent>(data) else {
        println!("{}", data.dimmed());
        return;
    };

    match event {
        DomainEvent::Executor(ExecutorActivityEvent::Thinking { turn, content }) => {
            println!("{} {}", format!("[turn {turn}] thinking:").blue(), content);
        }
        DomainEvent::Executor(ExecutorActivityEvent::ToolCall { turn, tool, parameters }) => {
            println!("{} {} {}", format!("[turn {turn}] call:").cyan(), tool.bold(), parameters);
        }
        DomainEvent::Executor(ExecutorActivityEvent::ToolResult { turn, tool, output }) => {
            println!("{} {} -> {}", format!("[turn {turn}] result:").green(), tool.bold(), output);
        }
        DomainEvent::Executor(ExecutorActivityEvent::Warning { turn, message }) => {
            println!("{}", format!("[turn {turn}] warning: {message}").yellow());
        }
        DomainEvent::Executor(ExecutorActivityEvent::Answer { turn, output }) => {
            println!("{} {}", format!("[turn {turn}] answer:").bold().green(), output);
        }
        DomainEvent::Policy(PolicyEvent::PolicyViolationAttempted { violation_type, details, .. }) => {
            println!("{}", format!("policy: attempted {violation_type}: {details}").yellow());
        }
        DomainEvent::Policy(PolicyEvent::PolicyViolationBlocked { violation_type, details, .. }) => {
            println!("{}", format!("policy: blocked {violation_type}: {details}").red().bold());
        }
    }
}
