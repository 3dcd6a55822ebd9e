// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The adapter contract (spec §4.1): the uniform interface every tool
//! wrapper — process-based, container-based, or pure network — implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    Success,
    Partial,
    Failure,
    Timeout,
    Error,
}

/// The result of exactly one adapter invocation. Total: adapters must
/// return one of these rather than raise, except for programming errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterResult {
    pub status: AdapterStatus,
    pub data: Value,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub evidence_path: Option<String>,
    #[serde(default)]
    pub execution_time: Option<f64>,
}

impl AdapterResult {
    pub fn success(data: Value) -> Self {
        Self {
            status: AdapterStatus::Success,
            data,
            metadata: HashMap::new(),
            error_message: None,
            evidence_path: None,
            execution_time: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            status: AdapterStatus::Error,
            data: Value::Null,
            metadata: HashMap::new(),
            error_message: Some(format!("BLOCKED: {}", reason.into())),
            evidence_path: None,
            execution_time: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AdapterStatus::Error,
            data: Value::Null,
            metadata: HashMap::new(),
            error_message: Some(message.into()),
            evidence_path: None,
            execution_time: None,
        }
    }

    pub fn timeout() -> Self {
        Self {
            status: AdapterStatus::Timeout,
            data: Value::Null,
            metadata: HashMap::new(),
            error_message: Some("execution timed out".to_string()),
            evidence_path: None,
            execution_time: None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == AdapterStatus::Error
            && self
                .error_message
                .as_deref()
                .is_some_and(|m| m.starts_with("BLOCKED:"))
    }
}

/// Introspection payload returned by [`Adapter::get_info`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub example_usage: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("execution error: {0}")]
    Execution(String),
}

/// The shell metacharacters that must never appear unescaped in an adapter
/// argument (spec §4.1).
const UNSAFE_CHARS: &[char] = &[';', '&', '|', '`', '$', '(', ')', '>', '<', '\n', '\r'];

/// Rejects any argument containing a shell metacharacter, independent of
/// whether the runner underneath uses a shell.
pub fn sanitize_args(args: &[String]) -> Result<(), AdapterError> {
    for arg in args {
        if arg.chars().any(|c| UNSAFE_CHARS.contains(&c)) {
            return Err(AdapterError::Validation(format!(
                "argument contains disallowed shell metacharacters: {arg:?}"
            )));
        }
    }
    Ok(())
}

/// Builds a sanitized, timestamp-unique evidence path under
/// `<base>/<adapter_name>/<safe-target>_<unix-ts>.<ext>` (spec §6). Uses
/// nanosecond resolution rather than whole seconds so two invocations
/// against the same target inside the same second still get distinct
/// paths (spec §8 evidence-uniqueness invariant).
pub fn evidence_path_under(base: &str, adapter_name: &str, target: &str, ext: &str) -> String {
    let safe_target: String = target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    let ts = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_else(|| chrono::Utc::now().timestamp());
    format!("{base}/{adapter_name}/{safe_target}_{ts}.{ext}")
}

/// [`evidence_path_under`] rooted at the conventional `evidence/` directory
/// (spec §6).
pub fn evidence_path(adapter_name: &str, target: &str, ext: &str) -> String {
    evidence_path_under("evidence", adapter_name, target, ext)
}

/// Every adapter — process-based, container-based, or pure network —
/// implements this contract.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Verifies static configuration. Fails fast at load time; a failure
    /// excludes the adapter from the registry (spec §7).
    fn validate_config(&self) -> Result<(), AdapterError>;

    /// Verifies per-invocation inputs against adapter-specific constraints.
    fn validate_params(&self, params: &Value) -> Result<(), AdapterError>;

    /// Performs the work. Must be total for expected failure modes.
    async fn execute(&self, params: Value) -> AdapterResult;

    /// Introspection.
    fn get_info(&self) -> AdapterInfo;

    /// Optional post-processing hook turning a successful result into a
    /// human-readable interpretation string (supplemented from
    /// `adapter_wrapper.py`'s `interpret_result`). No side effects beyond
    /// producing the string.
    fn interpret_result(&self, _result: &AdapterResult) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_semicolon() {
        let args = vec!["host.com; rm -rf /".to_string()];
        assert!(sanitize_args(&args).is_err());
    }

    #[test]
    fn sanitize_accepts_plain_args() {
        let args = vec!["-p".to_string(), "80,443".to_string()];
        assert!(sanitize_args(&args).is_ok());
    }

    #[test]
    fn evidence_paths_for_distinct_targets_differ() {
        let a = evidence_path("whois", "example.com", "txt");
        let b = evidence_path("whois", "example.org", "txt");
        assert_ne!(a, b);
    }

    #[test]
    fn evidence_paths_for_same_target_twice_still_differ() {
        let a = evidence_path("whois", "example.com", "txt");
        let b = evidence_path("whois", "example.com", "txt");
        assert_ne!(a, b);
    }

    #[test]
    fn evidence_path_under_uses_given_root() {
        let p = evidence_path_under("/tmp/aegis-evidence", "nmap", "example.com", "xml");
        assert!(p.starts_with("/tmp/aegis-evidence/nmap/"));
    }

    #[test]
    fn blocked_result_carries_prefix() {
        let r = AdapterResult::blocked("unauthorized target");
        assert!(r.is_blocked());
    }
}
