// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Process & Container Runner contract (spec §4.2): sanitized,
//! timeout-bounded external execution shared by both backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub host_path: String,
    pub container_path: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Either a process command or a container image invocation. The two
/// backends share every other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    pub command: Option<String>,
    pub image: Option<String>,
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub workdir: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    pub timeout: Duration,
}

impl RunSpec {
    pub fn process(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: Some(command.into()),
            image: None,
            args,
            env: HashMap::new(),
            volumes: Vec::new(),
            network: None,
            workdir: None,
            cwd: None,
            timeout,
        }
    }

    pub fn container(image: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: None,
            image: Some(image.into()),
            args,
            env: HashMap::new(),
            volumes: Vec::new(),
            network: None,
            workdir: None,
            cwd: None,
            timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Timeout,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl RunResult {
    pub fn timeout(duration: Duration) -> Self {
        Self { status: RunStatus::Timeout, exit_code: None, stdout: String::new(), stderr: String::new(), duration }
    }

    pub fn error(message: impl Into<String>, duration: Duration) -> Self {
        Self { status: RunStatus::Error, exit_code: None, stdout: String::new(), stderr: message.into(), duration }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("no command or image specified")]
    MissingTarget,
    #[error("argument sanitization failed: {0}")]
    UnsafeArgument(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command not found: {0}")]
    NotFound(String),
}

/// Executes a [`RunSpec`] and returns its [`RunResult`]. Never interprets
/// stdout/stderr; never raises for ordinary execution failures (those
/// surface as `RunStatus::Error`) — only for contract violations
/// (`RunnerError`).
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, spec: RunSpec) -> Result<RunResult, RunnerError>;
}

/// Resolves a host path for a volume mount to an absolute, forward-slash
/// normalized form (spec §4.2).
pub fn normalize_host_path(path: &str) -> String {
    let p = std::path::Path::new(path);
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(p)
    };
    abs.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_host_path_uses_forward_slashes() {
        let p = normalize_host_path("./evidence");
        assert!(!p.contains('\\'));
    }
}
