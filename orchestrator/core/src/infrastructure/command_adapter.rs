// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! A declarative [`Adapter`] backed by a [`Runner`] (spec §4.1, §4.2): the
//! binding between a named host tool (`whois`, `nmap`, ...) and the command
//! line that actually invokes it. Most adapters in this system are this
//! shape — a fixed binary plus a `target` substitution — so rather than
//! hand-write one struct per tool, the CLI/daemon registers one
//! `CommandAdapter` per entry in its adapter configuration file.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::adapter::{evidence_path_under, Adapter, AdapterError, AdapterInfo, AdapterResult, AdapterStatus, sanitize_args};
use crate::domain::runner::{RunSpec, RunStatus, Runner};

/// Declarative shape of one `CommandAdapter`, loaded from the adapter
/// manifest YAML (spec §6 adapter configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAdapterSpec {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
    /// Argument template. The literal token `{target}` is substituted with
    /// `params.target` at invocation time; every other argument is passed
    /// through unchanged.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether a successful run's stdout is persisted under
    /// `evidence/<name>/` and `evidence_path` set on the result (spec
    /// §4.1). Defaults to true — most process adapters produce
    /// inspectable output worth keeping.
    #[serde(default = "default_writes_evidence")]
    pub writes_evidence: bool,
    /// Root directory evidence files are written under. Defaults to
    /// `evidence` (spec §6's `evidence/<adapter>/...` layout); overridable
    /// so the CLI/daemon can point every adapter at one configured
    /// evidence root.
    #[serde(default = "default_evidence_dir")]
    pub evidence_dir: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_writes_evidence() -> bool {
    true
}

fn default_evidence_dir() -> String {
    "evidence".to_string()
}

/// Runs `spec.command` through a [`Runner`], substituting `{target}` into
/// the argument template from the invocation's `target` parameter.
pub struct CommandAdapter {
    spec: CommandAdapterSpec,
    runner: Arc<dyn Runner>,
}

impl CommandAdapter {
    pub fn new(spec: CommandAdapterSpec, runner: Arc<dyn Runner>) -> Self {
        Self { spec, runner }
    }

    fn render_args(&self, target: &str) -> Vec<String> {
        self.spec.args.iter().map(|a| a.replace("{target}", target)).collect()
    }

    /// Persists raw stdout under `evidence/<adapter_name>/` (spec §4.1,
    /// §6). Best-effort: a write failure is logged and swallowed rather
    /// than turning an otherwise-successful run into a failure — the
    /// in-memory stdout is still returned on the `AdapterResult` either
    /// way.
    async fn write_evidence(&self, target: &str, stdout: &str) -> Option<String> {
        let path = evidence_path_under(&self.spec.evidence_dir, &self.spec.name, target, "txt");
        let dir = std::path::Path::new(&path).parent()?;
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::warn!(adapter = %self.spec.name, error = %e, "failed to create evidence directory");
            return None;
        }
        match tokio::fs::write(&path, stdout).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(adapter = %self.spec.name, error = %e, "failed to write evidence file");
                None
            }
        }
    }
}

#[async_trait]
impl Adapter for CommandAdapter {
    fn validate_config(&self) -> Result<(), AdapterError> {
        if self.spec.command.trim().is_empty() {
            return Err(AdapterError::Configuration(format!("{}: empty command", self.spec.name)));
        }
        Ok(())
    }

    fn validate_params(&self, params: &Value) -> Result<(), AdapterError> {
        match params.get("target").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => Ok(()),
            _ => Err(AdapterError::Validation("missing or empty \"target\" parameter".to_string())),
        }
    }

    async fn execute(&self, params: Value) -> AdapterResult {
        let target = match params.get("target").and_then(Value::as_str) {
            Some(t) => t.to_string(),
            None => return AdapterResult::error("missing \"target\" parameter"),
        };

        let args = self.render_args(&target);
        if let Err(e) = sanitize_args(&args) {
            return AdapterResult::error(e.to_string());
        }

        let run_spec = RunSpec::process(self.spec.command.clone(), args, Duration::from_secs(self.spec.timeout_secs));

        match self.runner.run(run_spec).await {
            Ok(result) => match result.status {
                RunStatus::Success => {
                    let mut outcome = AdapterResult::success(serde_json::json!({
                        "stdout": result.stdout,
                        "stderr": result.stderr,
                    }));
                    outcome.execution_time = Some(result.duration.as_secs_f64());
                    if self.spec.writes_evidence {
                        outcome.evidence_path = self.write_evidence(&target, &result.stdout).await;
                    }
                    outcome
                }
                RunStatus::Timeout => AdapterResult::timeout(),
                RunStatus::Error => {
                    let mut outcome = AdapterResult::error(format!(
                        "{} exited with code {:?}: {}",
                        self.spec.command, result.exit_code, result.stderr
                    ));
                    outcome.status = AdapterStatus::Failure;
                    outcome.execution_time = Some(result.duration.as_secs_f64());
                    outcome
                }
            },
            Err(e) => AdapterResult::error(e.to_string()),
        }
    }

    fn get_info(&self) -> AdapterInfo {
        AdapterInfo {
            name: self.spec.name.clone(),
            version: if self.spec.version.is_empty() { "0.1.0".to_string() } else { self.spec.version.clone() },
            description: self.spec.description.clone(),
            capabilities: vec![self.spec.command.clone()],
            requirements: vec![self.spec.command.clone()],
            example_usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process_runner::ProcessRunner;

    fn echo_spec() -> CommandAdapterSpec {
        CommandAdapterSpec {
            name: "echo_tool".to_string(),
            version: String::new(),
            description: "echoes the target".to_string(),
            command: "echo".to_string(),
            args: vec!["{target}".to_string()],
            timeout_secs: 5,
            writes_evidence: false,
            evidence_dir: default_evidence_dir(),
        }
    }

    #[tokio::test]
    async fn executes_and_substitutes_target() {
        let adapter = CommandAdapter::new(echo_spec(), Arc::new(ProcessRunner::new()));
        let result = adapter.execute(serde_json::json!({"target": "example.com"})).await;
        assert_eq!(result.status, AdapterStatus::Success);
        assert!(result.data["stdout"].as_str().unwrap().contains("example.com"));
        assert!(result.evidence_path.is_none());
    }

    #[tokio::test]
    async fn writes_evidence_file_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = echo_spec();
        spec.writes_evidence = true;
        spec.evidence_dir = dir.path().to_string_lossy().to_string();

        let adapter = CommandAdapter::new(spec, Arc::new(ProcessRunner::new()));
        let result = adapter.execute(serde_json::json!({"target": "example.com"})).await;

        assert_eq!(result.status, AdapterStatus::Success);
        let evidence_path = result.evidence_path.expect("evidence_path should be set");
        assert!(evidence_path.starts_with(dir.path().to_string_lossy().as_ref()));
        let contents = tokio::fs::read_to_string(&evidence_path).await.unwrap();
        assert!(contents.contains("example.com"));
    }

    #[test]
    fn validate_params_rejects_missing_target() {
        let adapter = CommandAdapter::new(echo_spec(), Arc::new(ProcessRunner::new()));
        assert!(adapter.validate_params(&serde_json::json!({})).is_err());
    }

    #[tokio::test]
    async fn rejects_unsafe_target_before_spawning() {
        let adapter = CommandAdapter::new(echo_spec(), Arc::new(ProcessRunner::new()));
        let result = adapter.execute(serde_json::json!({"target": "x; rm -rf /"})).await;
        assert_eq!(result.status, AdapterStatus::Error);
    }
}
