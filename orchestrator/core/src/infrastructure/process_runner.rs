// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Process backend for the [`Runner`] contract (spec §4.2): runs a plain
//! host command through `tokio::process::Command`, never through a shell,
//! with a hard wall-clock timeout and argument sanitization on top of
//! whatever the caller already validated.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::domain::adapter::sanitize_args;
use crate::domain::runner::{RunResult, RunSpec, RunStatus, Runner, RunnerError};

/// Executes commands directly on the host. No isolation beyond the
/// argument-sanitization and timeout guarantees every `Runner` makes —
/// callers needing filesystem/network isolation should prefer
/// [`super::container_runner::ContainerRunner`].
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, spec: RunSpec) -> Result<RunResult, RunnerError> {
        let command = spec.command.clone().ok_or(RunnerError::MissingTarget)?;
        sanitize_args(&spec.args).map_err(|e| RunnerError::UnsafeArgument(e.to_string()))?;

        let mut cmd = Command::new(&command);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RunnerError::NotFound(command.clone()),
            _ => RunnerError::SpawnFailed(e.to_string()),
        })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let collect = async {
            let mut stdout = String::new();
            let mut stderr = String::new();
            if let Some(mut pipe) = stdout_pipe.take() {
                let _ = pipe.read_to_string(&mut stdout).await;
            }
            if let Some(mut pipe) = stderr_pipe.take() {
                let _ = pipe.read_to_string(&mut stderr).await;
            }
            let status = child.wait().await;
            (status, stdout, stderr)
        };

        match tokio::time::timeout(spec.timeout, collect).await {
            Ok((status, stdout, stderr)) => {
                let duration = started.elapsed();
                let exit_code = status.ok().and_then(|s| s.code());
                Ok(RunResult {
                    status: if exit_code == Some(0) { RunStatus::Success } else { RunStatus::Error },
                    exit_code,
                    stdout,
                    stderr,
                    duration,
                })
            }
            Err(_) => Ok(RunResult::timeout(started.elapsed())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_plain_command_and_captures_stdout() {
        let runner = ProcessRunner::new();
        let spec = RunSpec::process("echo", vec!["hello".to_string()], Duration::from_secs(5));
        let result = runner.run(spec).await.unwrap();
        assert_eq!(result.status, RunStatus::Success);
        assert!(result.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn rejects_unsafe_argument_before_spawning() {
        let runner = ProcessRunner::new();
        let spec = RunSpec::process("echo", vec!["a; rm -rf /".to_string()], Duration::from_secs(5));
        let result = runner.run(spec).await;
        assert!(matches!(result, Err(RunnerError::UnsafeArgument(_))));
    }

    #[tokio::test]
    async fn missing_command_errors_before_running() {
        let runner = ProcessRunner::new();
        let mut spec = RunSpec::process("echo", vec![], Duration::from_secs(5));
        spec.command = None;
        let result = runner.run(spec).await;
        assert!(matches!(result, Err(RunnerError::MissingTarget)));
    }

    #[tokio::test]
    async fn unknown_command_returns_not_found() {
        let runner = ProcessRunner::new();
        let spec = RunSpec::process("definitely-not-a-real-binary-xyz", vec![], Duration::from_secs(5));
        let result = runner.run(spec).await;
        assert!(matches!(result, Err(RunnerError::NotFound(_))));
    }

    #[tokio::test]
    async fn exceeding_timeout_yields_timeout_status() {
        let runner = ProcessRunner::new();
        let spec = RunSpec::process("sleep", vec!["5".to_string()], Duration::from_millis(50));
        let result = runner.run(spec).await.unwrap();
        assert_eq!(result.status, RunStatus::Timeout);
    }
}
