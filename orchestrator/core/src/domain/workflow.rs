// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow steps and the orchestration context the Orchestrator tracks for
//! a single run (spec §3, §4.11).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::adapter::AdapterResult;
use crate::domain::asset::Asset;
use crate::domain::finding::Finding;

/// A single planned unit of work, produced either by the LLM planner or a
/// deterministic default plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    pub description: String,
    pub tool: String,
    pub target: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl WorkflowStep {
    pub fn new(tool: impl Into<String>, target: impl Into<String>) -> Self {
        let tool = tool.into();
        let target = target.into();
        Self {
            name: format!("{tool}:{target}"),
            description: String::new(),
            tool,
            target,
            parameters: Value::Object(Default::default()),
            priority: 0,
            rationale: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

/// The normalized outcome of a single adapter invocation once
/// `process_tool_output` has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub step_name: String,
    pub status: String,
    pub raw_output: Value,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub evidence_path: Option<String>,
}

/// Per-run state the Orchestrator owns: assets, results, completed steps,
/// and the workflow's state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationContext {
    pub assets: HashMap<String, Asset>,
    pub scan_results: Vec<ScanResult>,
    pub completed_steps: Vec<String>,
    pub workflow_state: WorkflowState,
    pub start_time: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for OrchestrationContext {
    fn default() -> Self {
        Self {
            assets: HashMap::new(),
            scan_results: Vec::new(),
            completed_steps: Vec::new(),
            workflow_state: WorkflowState::Pending,
            start_time: chrono::Utc::now(),
            end_time: None,
        }
    }
}

impl OrchestrationContext {
    pub fn transition(&mut self, state: WorkflowState) {
        self.workflow_state = state;
        if matches!(state, WorkflowState::Completed | WorkflowState::Failed | WorkflowState::Cancelled) {
            self.end_time = Some(chrono::Utc::now());
        }
    }
}

/// Normalizes a raw [`AdapterResult`] into an (optional) [`ScanResult`]
/// (spec §4.11 `process_tool_output`). Success still produces a result even
/// with zero findings; failure produces a zero-finding result carrying the
/// error; timeout/error are logged and dropped.
pub fn normalize_adapter_result(
    step_name: &str,
    asset_ref: &str,
    result: &AdapterResult,
    findings: Vec<Finding>,
) -> Option<ScanResult> {
    use crate::domain::adapter::AdapterStatus::*;
    match result.status {
        Success | Partial => Some(ScanResult {
            step_name: step_name.to_string(),
            status: "completed".to_string(),
            raw_output: result.data.clone(),
            findings,
            error_message: None,
            evidence_path: result.evidence_path.clone(),
        }),
        Failure => Some(ScanResult {
            step_name: step_name.to_string(),
            status: "failed".to_string(),
            raw_output: result.data.clone(),
            findings: Vec::new(),
            error_message: result.error_message.clone().or_else(|| Some(format!("{asset_ref}: adapter reported failure"))),
            evidence_path: None,
        }),
        Timeout | Error => {
            tracing::warn!(step = %step_name, asset = %asset_ref, "adapter result not materialized into a scan result: {:?}", result.error_message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adapter::AdapterResult;

    #[test]
    fn success_with_no_findings_still_materializes() {
        let r = AdapterResult::success(Value::Null);
        let scan = normalize_adapter_result("whois:example.com", "example.com", &r, vec![]);
        assert!(scan.is_some());
        assert_eq!(scan.unwrap().findings.len(), 0);
    }

    #[test]
    fn failure_materializes_with_error_message() {
        let mut r = AdapterResult::error("boom");
        r.status = crate::domain::adapter::AdapterStatus::Failure;
        let scan = normalize_adapter_result("nmap:10.0.0.1", "10.0.0.1", &r, vec![]).unwrap();
        assert_eq!(scan.status, "failed");
        assert_eq!(scan.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn timeout_is_dropped() {
        let r = AdapterResult::timeout();
        assert!(normalize_adapter_result("nmap:10.0.0.1", "10.0.0.1", &r, vec![]).is_none());
    }
}
